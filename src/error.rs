/// Error Handling Module
///
/// Every component returns its own typed error. `AppError` is the only type
/// that crosses the service boundary, and it is where detail is dropped:
/// token failures, unknown users and wrong passwords all become `Credential`.

use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for caller input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(String),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} bytes)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Password hashing errors (entropy or resource failure)
///
/// Never carries the plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    Hashing(String),
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::Hashing(msg) => write!(f, "Password hashing failed: {}", msg),
        }
    }
}

impl StdError for PasswordError {}

/// Token codec and validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three segments, bad base64/JSON, or an unexpected algorithm
    Malformed,
    /// The recomputed MAC does not match the presented one
    BadSignature,
    /// Signature is fine but `exp` is not in the future
    Expired,
    /// Encoding failed on our side
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::BadSignature => write!(f, "Token signature mismatch"),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Refresh-token rotation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    InvalidToken,
    TokenExpired,
    Signing(String),
}

impl fmt::Display for RotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationError::InvalidToken => write!(f, "Invalid token"),
            RotationError::TokenExpired => write!(f, "Token has expired"),
            RotationError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for RotationError {}

impl From<TokenError> for RotationError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => RotationError::TokenExpired,
            TokenError::Signing(msg) => RotationError::Signing(msg),
            TokenError::Malformed | TokenError::BadSignature => RotationError::InvalidToken,
        }
    }
}

/// Credential store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Username already taken
    Conflict(String),
    NotFound,
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Conflict(username) => {
                write!(f, "Username already registered: {}", username)
            }
            StorageError::NotFound => write!(f, "Record not found"),
            StorageError::Unavailable(msg) => write!(f, "Credential store unavailable: {}", msg),
        }
    }
}

impl StdError for StorageError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingRequired(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Error returned by `AuthService` to the request-handling layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Validation(ValidationError),
    /// Authentication failed. Intentionally carries no reason.
    Credential,
    Conflict(String),
    Storage(StorageError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Credential => write!(f, "Invalid credentials"),
            AppError::Conflict(username) => {
                write!(f, "Username already registered: {}", username)
            }
            AppError::Storage(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl AppError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Credential => "INVALID_CREDENTIALS",
            AppError::Conflict(_) => "DUPLICATE_ENTRY",
            AppError::Storage(StorageError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to hand to an untrusted caller
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Credential => "Invalid credentials".to_string(),
            AppError::Conflict(_) => "Username already registered".to_string(),
            AppError::Storage(StorageError::Unavailable(_)) => {
                "Credential store temporarily unavailable".to_string()
            }
            AppError::Storage(_) => "Storage error occurred".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(username) => AppError::Conflict(username),
            other => AppError::Storage(other),
        }
    }
}

impl From<RotationError> for AppError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::InvalidToken | RotationError::TokenExpired => AppError::Credential,
            RotationError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::Internal(msg),
            TokenError::Malformed | TokenError::BadSignature | TokenError::Expired => {
                AppError::Credential
            }
        }
    }
}

// ============================================================================
// 3. RESPONSE SHAPE
// ============================================================================

/// Serializable error body for whatever transport sits above the service
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Request id the failure was logged under
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String) -> Self {
        Self {
            error_id,
            message,
            code,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn from_app_error(error: &AppError, request_id: &str) -> Self {
        Self::new(
            request_id.to_string(),
            error.public_message(),
            error.code().to_string(),
        )
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation logging context
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn log_error(&self, error: &AppError) {
        match error {
            AppError::Validation(_) | AppError::Conflict(_) => {
                tracing::warn!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    error = %error,
                    "Rejected input"
                );
            }
            AppError::Credential => self.log_auth_failure("unspecified"),
            AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(
                    request_id = %self.request_id,
                    operation = %self.operation,
                    user_id = ?self.user_id,
                    error = %error,
                    "Operation failed"
                );
            }
        }
    }

    /// Warn about a failed authentication with the cause the caller never sees
    pub fn log_auth_failure(&self, reason: &str) {
        tracing::warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            user_id = ?self.user_id,
            reason = reason,
            "Authentication failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("username".to_string());
        assert_eq!(err.to_string(), "username is empty");
    }

    #[test]
    fn test_token_failures_collapse_to_credential() {
        for err in [TokenError::Malformed, TokenError::BadSignature, TokenError::Expired] {
            assert_eq!(AppError::from(err), AppError::Credential);
        }
        assert_eq!(AppError::from(RotationError::InvalidToken), AppError::Credential);
        assert_eq!(AppError::from(RotationError::TokenExpired), AppError::Credential);
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err: AppError = RotationError::Signing("boom".to_string()).into();
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_storage_conflict_becomes_conflict() {
        let err: AppError = StorageError::Conflict("alice".to_string()).into();
        assert_eq!(err, AppError::Conflict("alice".to_string()));
        assert_eq!(err.code(), "DUPLICATE_ENTRY");
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = AppError::Storage(StorageError::Unavailable("disk on fire".to_string()));
        assert!(!err.public_message().contains("disk"));
        assert_eq!(err.code(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::from_app_error(&AppError::Credential, "req-1");
        assert_eq!(response.error_id, "req-1");
        assert_eq!(response.code, "INVALID_CREDENTIALS");
        assert_eq!(response.message, "Invalid credentials");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_auth_failure_is_warned_with_reason() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            ErrorContext::new("user_login").log_auth_failure("wrong password");
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains(r#""level":"WARN""#), "{}", output);
        assert!(output.contains(r#""reason":"wrong password""#), "{}", output);
        assert!(output.contains(r#""operation":"user_login""#), "{}", output);
    }

    #[test]
    fn test_error_context_creation() {
        let ctx = ErrorContext::new("login");
        assert_eq!(ctx.operation, "login");
        assert!(ctx.user_id.is_none());

        let ctx = ctx.with_user_id("user-123".to_string());
        assert_eq!(ctx.user_id, Some("user-123".to_string()));
    }
}
