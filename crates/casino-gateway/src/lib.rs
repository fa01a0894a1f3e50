// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Casino API Gateway - synchronous facade over asynchronous game completions.
//!
//! Game services complete actions out-of-band: the gateway POSTs an action
//! downstream, and the result arrives later as a push notification on a
//! separate webhook driven by the platform's pub/sub topic. This crate makes
//! that round trip look like one blocking HTTP call to the client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          CASINO GATEWAY                              │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌────────────────┐   ┌─────────────┐           │
//! │  │  Action API  │   │ Notify Ingress │   │    Admin    │           │
//! │  │  Port 8000   │   │   Port 8001    │   │  Port 8081  │           │
//! │  └──────┬───────┘   └───────┬────────┘   └─────────────┘           │
//! │         │                   │                                       │
//! │  ┌──────┴───────┐   ┌───────┴────────┐                             │
//! │  │  Initiator   │   │    Receiver    │                             │
//! │  │ (register +  │   │ (handshake or  │                             │
//! │  │  dispatch)   │   │  resolve)      │                             │
//! │  └──────┬───────┘   └───────┬────────┘                             │
//! │         │                   │                                       │
//! │  ┌──────┴───────────────────┴────────┐                             │
//! │  │       Correlation Registry        │                             │
//! │  │  (keyed oneshot wait handles)     │                             │
//! │  └───────────────────────────────────┘                             │
//! └─────────┬───────────────────▲───────────────────────────────────────┘
//!           │ POST action       │ push notification
//!           ▼                   │
//!     game services ──────► pub/sub topic
//! ```
//!
//! # Correlation flow
//!
//! 1. `POST /actions/{action}` arrives; the Initiator mints a correlation
//!    key and registers a wait handle.
//! 2. The action is POSTed downstream with the key embedded in the body.
//! 3. The handler suspends on the handle (no polling).
//! 4. The game service publishes the result; the topic pushes it to
//!    `POST /notifications` with the same key.
//! 5. The Receiver resolves the handle; the suspended handler wakes and
//!    returns the payload. A timeout expires the handle instead and the
//!    caller gets `408`.
//!
//! # Usage
//!
//! ```ignore
//! use casino_gateway::{GatewayConfig, GatewayService, HttpDownstreamClient};
//! use std::sync::Arc;
//!
//! let config = GatewayConfig::default();
//! let client = Arc::new(HttpDownstreamClient::new(&config.downstream)?);
//! let mut service = GatewayService::new(config, client.clone(), client)?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod dispatch;
pub mod domain;
pub mod ingress;
pub mod middleware;
pub mod service;

// Re-exports for public API
pub use dispatch::{ActionDispatcher, ActionInitiator, HandshakeConfirmer, HttpDownstreamClient};
pub use domain::config::GatewayConfig;
pub use domain::correlation::CorrelationKey;
pub use domain::error::{ActionError, GatewayError};
pub use domain::notification::{Notification, NotificationKind};
pub use domain::registry::{CorrelationRegistry, PendingWait};
pub use ingress::{Disposition, NotificationReceiver};
pub use middleware::GatewayMetrics;
pub use service::GatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server identification string reported by the health endpoints
pub fn server_version() -> String {
    format!("CasinoGateway/v{VERSION}")
}
