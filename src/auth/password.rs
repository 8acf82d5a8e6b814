/// Password Hashing and Verification
///
/// bcrypt with a per-call random salt embedded in the digest. Verification
/// recomputes with that salt and compares in constant time.

use std::sync::OnceLock;

use bcrypt::{hash, verify};

use crate::error::PasswordError;

// Only ever hashed to burn time when the username does not exist.
const DUMMY_PASSWORD: &str = "timing-equalizer";

#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: OnceLock<Option<String>>,
}

impl PasswordHasher {
    /// `cost` is the bcrypt work factor (4..=31)
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Hash a password with a fresh salt
    ///
    /// # Errors
    /// Returns error if bcrypt cannot produce a digest (bad cost, no entropy)
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        hash(password, self.cost).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Check a password against a stored digest
    ///
    /// A digest that cannot be parsed never matches.
    pub fn verify_password(&self, hash: &str, password: &str) -> bool {
        match verify(password, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "Stored password digest is unreadable");
                false
            }
        }
    }

    /// Spend the same effort as a real verification and always fail
    ///
    /// Used when the username is unknown so that path is not measurably faster.
    pub fn verify_against_dummy(&self, password: &str) -> bool {
        let dummy = self
            .dummy_hash
            .get_or_init(|| hash(DUMMY_PASSWORD, self.cost).ok());
        if let Some(dummy) = dummy {
            let _ = verify(password, dummy);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(TEST_COST)
    }

    #[test]
    fn test_hash_password() {
        let password = "s3cret";
        let hash = hasher().hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
        assert!(!hash.contains(password));
    }

    #[test]
    fn test_same_password_different_digests() {
        let hasher = hasher();
        let first = hasher.hash_password("s3cret").unwrap();
        let second = hasher.hash_password("s3cret").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify_password(&first, "s3cret"));
        assert!(hasher.verify_password(&second, "s3cret"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hasher = hasher();
        let hash = hasher.hash_password("correct").unwrap();

        assert!(!hasher.verify_password(&hash, "wrong"));
    }

    #[test]
    fn test_malformed_digest_never_matches() {
        assert!(!hasher().verify_password("not-a-bcrypt-digest", "anything"));
    }

    #[test]
    fn test_dummy_verification_always_fails() {
        let hasher = hasher();
        assert!(!hasher.verify_against_dummy("timing-equalizer"));
        assert!(!hasher.verify_against_dummy("x"));
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        let result = PasswordHasher::new(99).hash_password("s3cret");
        assert!(matches!(result, Err(PasswordError::Hashing(_))));
    }
}
