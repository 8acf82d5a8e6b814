/// Authentication Service
///
/// Public entry point: register, login, refresh, and access-token checks.
/// This is the only layer that throws away failure detail. Everything a
/// caller could use to tell "no such user" from "wrong password", or "forged"
/// from "expired", becomes `AppError::Credential`. The detail is still logged.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::issuer::{TokenIssuer, TokenPair};
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::TokenValidator;
use crate::configuration::Settings;
use crate::error::{AppError, ConfigError, ErrorContext, RotationError, StorageError};
use crate::store::{CredentialStore, User, UserResponse};
use crate::validators::{validate_password, validate_username};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    validator: TokenValidator,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher: Arc::new(hasher),
            validator: TokenValidator::new(issuer),
            clock,
        }
    }

    /// Wire a service from loaded settings, using the system clock
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if a TTL cannot be represented
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let issuer = TokenIssuer::from_settings(&settings.jwt)?;
        tracing::info!(
            key_id = %issuer.codec().key_id(),
            access_ttl_secs = settings.jwt.access_token_expiry,
            refresh_ttl_secs = settings.jwt.refresh_token_expiry,
            hash_cost = settings.password.hash_cost,
            "Auth service configured"
        );

        Ok(Self::new(
            store,
            PasswordHasher::new(settings.password.hash_cost),
            issuer,
            Arc::new(SystemClock),
        ))
    }

    /// Register a new user
    ///
    /// # Errors
    /// - `Validation` for an empty or oversized username/password
    /// - `Conflict` if the store reports the username as taken
    /// - `Internal` if hashing fails
    /// - `Storage` for any other store failure
    pub fn register(&self, username: &str, password: &str) -> Result<UserResponse, AppError> {
        let context = ErrorContext::new("user_registration");

        let result = self.try_register(username, password);
        match &result {
            Ok(user) => tracing::info!(
                request_id = %context.request_id,
                user_id = %user.id,
                "User registered successfully"
            ),
            Err(e) => context.log_error(e),
        }
        result
    }

    fn try_register(&self, username: &str, password: &str) -> Result<UserResponse, AppError> {
        validate_username(username)?;
        validate_password(password)?;

        let password_hash = self.hasher.hash_password(password)?;
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: self.clock.now(),
        };

        self.store.create_user(&user)?;
        Ok(user.public())
    }

    /// Authenticate with username and password
    ///
    /// # Security Notes
    /// - Unknown username, wrong password and store failure all return the
    ///   same `Credential` error; the cause is only logged
    /// - Unknown usernames still pay for a bcrypt verification
    ///
    /// # Errors
    /// - `Credential` on any authentication failure
    /// - `Internal` if token signing fails
    pub fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let context = ErrorContext::new("user_login");

        let user = match self.store.find_by_username(username) {
            Ok(user) => user,
            Err(StorageError::NotFound) => {
                self.hasher.verify_against_dummy(password);
                context.log_auth_failure("unknown username");
                return Err(AppError::Credential);
            }
            Err(e) => {
                tracing::error!(
                    request_id = %context.request_id,
                    operation = %context.operation,
                    error = %e,
                    "Credential store lookup failed"
                );
                context.log_auth_failure("credential store failure");
                return Err(AppError::Credential);
            }
        };
        let context = context.with_user_id(user.id.to_string());

        if !self.hasher.verify_password(&user.password_hash, password) {
            context.log_auth_failure("wrong password");
            return Err(AppError::Credential);
        }

        let pair = self
            .validator
            .issuer()
            .issue_pair(user.id, self.clock.now())
            .map_err(AppError::from)
            .inspect_err(|e| context.log_error(e))?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %user.id,
            "User logged in successfully"
        );
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The presented token is not revoked; see `TokenValidator`.
    ///
    /// # Errors
    /// - `Credential` for a forged, malformed or expired token
    /// - `Internal` if token signing fails
    pub fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let context = ErrorContext::new("token_refresh");

        match self.validator.rotate(refresh_token, self.clock.now()) {
            Ok(pair) => {
                tracing::info!(request_id = %context.request_id, "Token refreshed successfully");
                Ok(pair)
            }
            Err(e @ (RotationError::InvalidToken | RotationError::TokenExpired)) => {
                context.log_auth_failure(&e.to_string());
                Err(AppError::from(e))
            }
            Err(e) => {
                let err = AppError::from(e);
                context.log_error(&err);
                Err(err)
            }
        }
    }

    /// Check an access token and return the user id it was issued for
    ///
    /// # Errors
    /// - `Credential` for a forged, malformed or expired token
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AppError> {
        self.validator
            .subject(access_token, self.clock.now())
            .map_err(|e| {
                ErrorContext::new("access_token_check").log_auth_failure(&e.to_string());
                AppError::from(e)
            })
    }
}
