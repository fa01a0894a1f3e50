//! Domain types for the gateway.
//!
//! Core correlation model, configuration, notification envelope, and error
//! handling. Outbound transport lives in `crate::dispatch`, inbound handling
//! in `crate::ingress`.

pub mod config;
pub mod correlation;
pub mod error;
pub mod notification;
pub mod registry;

// Re-exports for convenience
pub use config::{DownstreamConfig, GatewayConfig, LimitsConfig, TimeoutConfig};
pub use correlation::CorrelationKey;
pub use error::{ActionError, GatewayError, RegistryError};
pub use notification::{Notification, NotificationError, NotificationKind};
pub use registry::{CorrelationRegistry, PendingWait, RegistryStats, WaitError};
