use std::io::{self, BufRead, Write};
use std::sync::Arc;

use radionica_auth::auth::AuthService;
use radionica_auth::configuration::get_configuration;
use radionica_auth::error::{AppError, ErrorResponse, ValidationError};
use radionica_auth::store::InMemoryCredentialStore;
use radionica_auth::telemetry::init_telemetry;

fn main() -> io::Result<()> {
    // Load settings
    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // Structured logging
    if let Err(e) = init_telemetry(&configuration.log_level) {
        eprintln!("Failed to initialize telemetry: {}", e);
    }
    tracing::info!("Configuration loaded successfully");

    let store = Arc::new(InMemoryCredentialStore::new());
    let service = match AuthService::from_settings(&configuration, store) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build auth service");
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let output = dispatch(&service, &line);
        writeln!(stdout, "{}", output)?;
        stdout.flush()?;
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

/// Run one `<command> <args...>` line and render the outcome as JSON
///
/// `register` and `login` take the rest of the line after the username as
/// the password, so passwords may contain spaces.
fn dispatch(service: &AuthService, line: &str) -> serde_json::Value {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();

    let result = match parts.as_slice() {
        ["register", username, password] => service
            .register(username, password)
            .map(|user| serde_json::json!({ "user": user })),
        ["login", username, password] => service
            .login(username, password)
            .map(|pair| serde_json::json!(pair)),
        ["refresh", token] => service
            .refresh_token(token.trim())
            .map(|pair| serde_json::json!(pair)),
        ["whoami", token] => service
            .authenticate(token.trim())
            .map(|user_id| serde_json::json!({ "user_id": user_id })),
        _ => Err(AppError::Validation(ValidationError::InvalidFormat(
            "command (expected register|login|refresh|whoami)".to_string(),
        ))),
    };

    match result {
        Ok(value) => value,
        Err(e) => {
            let request_id = uuid::Uuid::new_v4().to_string();
            serde_json::json!(ErrorResponse::from_app_error(&e, &request_id))
        }
    }
}
