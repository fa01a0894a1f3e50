//! Middleware for the gateway's HTTP servers.
//!
//! Layer order on the public API: Request → Cors → BodyLimit → Tracing → Handler.
//! The ingress server carries only BodyLimit → Tracing (the topic does not
//! need CORS).

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::GatewayMetrics;
pub use tracing::TracingLayer;
