//! Structured logging setup.

use crate::config::TelemetryConfig;
use crate::TelemetryError;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level so operators can
/// override filtering without a config change.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => {
            EnvFilter::try_new(spec).map_err(|e| TelemetryError::Filter(e.to_string()))?
        }
        _ => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::Filter(e.to_string()))?,
    };

    if config.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
    }
}
