//! Telemetry configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the logging bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line
    pub service_name: String,
    /// Log level filter, EnvFilter syntax (`info`, `casino_gateway=debug`, ...)
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "casino-gateway".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("CASINO_SERVICE_NAME") {
            if !name.is_empty() {
                config.service_name = name;
            }
        }
        if let Ok(level) = std::env::var("CASINO_LOG_LEVEL") {
            if !level.is_empty() {
                config.log_level = level;
            }
        }
        if let Ok(json) = std::env::var("CASINO_LOG_JSON") {
            config.json_logs = matches!(json.as_str(), "1" | "true" | "yes");
        }

        config
    }
}
