/// Token Pair Issuing
///
/// Produces an access/refresh pair for a user. Pure apart from the random
/// `jti`: the caller supplies the clock reading.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::jwt::TokenCodec;
use crate::configuration::JwtSettings;
use crate::error::{ConfigError, TokenError};

/// Access and refresh token handed back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(codec: TokenCodec, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            codec,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(
            TokenCodec::new(settings.secret.as_bytes()),
            settings.access_ttl()?,
            settings.refresh_ttl()?,
        ))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a fresh pair for `user_id` as of `now`
    ///
    /// # Errors
    /// Propagates `TokenError::Signing` from the codec or from an expiry
    /// past the representable range
    pub fn issue_pair(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        let access = Claims::new(user_id, now, self.access_ttl)?;
        let refresh = Claims::new(user_id, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }
}
