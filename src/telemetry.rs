use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON logging.
///
/// `RUST_LOG` wins over `default_level`. Fails instead of panicking when a
/// global subscriber is already installed.
pub fn init_telemetry(default_level: &str) -> Result<(), String> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .map_err(|e| format!("invalid log filter: {}", e))?;

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
        .map_err(|e| e.to_string())
}
