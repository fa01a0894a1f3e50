//! # Casino Telemetry
//!
//! Logging bootstrap shared by casino platform binaries.
//!
//! Installs a global `tracing` subscriber configured from the environment:
//! plain fmt output for development, JSON lines for production log
//! shipping.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use casino_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("failed to init telemetry");
//!
//!     // Application code runs here; spans and events are now collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CASINO_SERVICE_NAME` | `casino-gateway` | Service name stamped on logs |
//! | `CASINO_LOG_LEVEL` | `info` | Log level filter (EnvFilter syntax) |
//! | `CASINO_LOG_JSON` | `false` | Emit JSON lines instead of fmt output |

#![warn(clippy::all)]
#![deny(unsafe_code)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;
use tracing::info;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Log level filter could not be parsed
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed
    #[error("failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize telemetry for a service binary.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(config)?;

    info!(
        service = %config.service_name,
        json = config.json_logs,
        "telemetry initialized"
    );

    Ok(TelemetryGuard)
}

/// Guard that keeps telemetry active for the process lifetime.
pub struct TelemetryGuard;

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
    }
}
