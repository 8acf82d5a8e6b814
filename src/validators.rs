/// Input validators for registration
///
/// Usernames are taken verbatim (no trimming, no case folding): they are
/// case-sensitive identities.

use crate::error::ValidationError;

const MAX_USERNAME_LENGTH: usize = 256;
// bcrypt only reads the first 72 bytes.
const MAX_PASSWORD_LENGTH: usize = 72;

/// Validates a username
/// - Must not be empty
/// - At most 256 bytes
/// - No control characters or null bytes
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong(
            "username".to_string(),
            MAX_USERNAME_LENGTH,
        ));
    }

    if username.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat("username".to_string()));
    }

    Ok(())
}

/// Validates a password
/// - Must not be empty
/// - At most 72 bytes
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        ));
    }

    Ok(())
}
