/// Token Validation and Refresh Rotation
///
/// Tokens are stateless: a correctly signed, unexpired token is the whole proof.
/// Rotation therefore does not invalidate the refresh token it was handed.
/// The old one stays usable until its own `exp`. Tracking a per-user
/// generation (or the `jti`) in the credential store is where single-use
/// refresh would hook in.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::issuer::{TokenIssuer, TokenPair};
use crate::error::{RotationError, TokenError};

#[derive(Clone)]
pub struct TokenValidator {
    issuer: TokenIssuer,
}

impl TokenValidator {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Verify signature and expiry of any token this service issued
    ///
    /// # Errors
    /// - `Malformed` / `BadSignature` from the codec
    /// - `Expired` if `exp` is not strictly after `now`
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = self.issuer.codec().decode(token)?;
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Validate a token and return the user id it was issued for
    pub fn subject(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, RotationError> {
        let claims = self.validate(token, now)?;
        claims.user_id().ok_or(RotationError::InvalidToken)
    }

    /// Exchange a refresh token for a brand-new pair
    ///
    /// # Errors
    /// - `InvalidToken` for a malformed, forged or subject-less token
    /// - `TokenExpired` once the refresh token has passed its `exp`
    /// - `Signing` if the new pair cannot be encoded
    pub fn rotate(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<TokenPair, RotationError> {
        let user_id = self.subject(refresh_token, now)?;
        let pair = self.issuer.issue_pair(user_id, now)?;

        tracing::debug!(user_id = %user_id, "Refresh token rotated");
        Ok(pair)
    }
}
