/// JWT Token Encoding and Decoding
///
/// Compact `header.payload.signature` tokens signed with HS256. The codec
/// checks structure, algorithm and signature only; expiry is judged by the
/// caller against its own clock.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use crate::auth::claims::Claims;
use crate::error::TokenError;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    key_id: String,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            key_id: key_id(secret),
        }
    }

    /// Short fingerprint of the signing secret, carried as the `kid` header
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign claims into a token string
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if serialization or signing fails
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let mut header = Header::new(ALGORITHM);
        header.kid = Some(self.key_id.clone());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims
    ///
    /// # Errors
    /// - `BadSignature` if the MAC over header and payload does not match
    /// - `Malformed` for anything else, including any algorithm other than HS256
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => {
                    tracing::debug!(error = %e, "Rejected malformed token");
                    TokenError::Malformed
                }
            })
    }
}

fn key_id(secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}
