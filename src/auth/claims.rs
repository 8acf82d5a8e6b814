/// JWT Claims structure
///
/// The payload signed into every token. Access and refresh tokens share this
/// shape; only the TTL used at issue time differs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token id, unique per issued token
    pub jti: String,
}

impl Claims {
    /// Build claims expiring exactly `ttl` after `issued_at`
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the expiry is not a representable instant
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// A token is live only while `exp` is strictly in the future
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}
