/// Credential Store
///
/// The auth service only needs two operations from persistence. Anything that
/// can create a user and look one up by username can back it.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StorageError;

/// A registered account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What callers of `register` get back: no digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

pub trait CredentialStore: Send + Sync {
    /// Persist a new user. Must return `StorageError::Conflict` when the
    /// username is taken if the store enforces uniqueness.
    fn create_user(&self, user: &User) -> Result<(), StorageError>;

    /// Look a user up by exact (case-sensitive) username.
    /// Returns `StorageError::NotFound` when there is no such user.
    fn find_by_username(&self, username: &str) -> Result<User, StorageError>;
}

/// Process-local store keyed by username
///
/// Enforces username uniqueness under a write lock, so two concurrent
/// registrations of the same name cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StorageError::Unavailable("user table lock poisoned".to_string()))?;

        if users.contains_key(&user.username) {
            return Err(StorageError::Conflict(user.username.clone()));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<User, StorageError> {
        let users = self
            .users
            .read()
            .map_err(|_| StorageError::Unavailable("user table lock poisoned".to_string()))?;

        users.get(username).cloned().ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: "$2b$04$notarealhash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let alice = user("alice");
        store.create_user(&alice).expect("Failed to create user");

        let found = store.find_by_username("alice").expect("User should exist");
        assert_eq!(found.id, alice.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&user("alice")).unwrap();

        let result = store.create_user(&user("alice"));
        assert_eq!(result, Err(StorageError::Conflict("alice".to_string())));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let store = InMemoryCredentialStore::new();
        store.create_user(&user("alice")).unwrap();

        assert_eq!(store.find_by_username("Alice").unwrap_err(), StorageError::NotFound);
        assert!(store.create_user(&user("Alice")).is_ok());
    }

    #[test]
    fn test_digest_never_serialized() {
        let json = serde_json::to_string(&user("alice")).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("notarealhash"));
    }
}
