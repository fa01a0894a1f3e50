//! Outbound dispatch to the downstream game-action service.
//!
//! The gateway talks downstream through two narrow ports so that the
//! initiator and the ingress receiver can be exercised without a network:
//! [`ActionDispatcher`] fires the action POST, [`HandshakeConfirmer`]
//! performs the one-time subscription confirmation GET. The production
//! implementation of both is [`HttpDownstreamClient`].

pub mod client;
pub mod initiator;

pub use client::HttpDownstreamClient;
pub use initiator::ActionInitiator;

use crate::domain::correlation::CorrelationKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outbound action request carrying the correlation key.
///
/// The key rides inside the body; the game service echoes it back in the
/// completion notification it publishes to the topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Key the completion notification must echo
    pub correlation_id: CorrelationKey,
    /// Action name, e.g. `blackjack/play`
    pub action: String,
    /// Caller-supplied action payload
    pub payload: serde_json::Value,
}

/// Dispatch error types
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Connection, DNS, or timeout failure before a response arrived
    #[error("transport failure: {0}")]
    Transport(String),
    /// Downstream answered with a non-success status
    #[error("downstream service returned status {0}")]
    Status(u16),
    /// Test-channel dispatcher with no receiver left
    #[error("dispatch channel closed")]
    ChannelClosed,
}

/// Port for firing the outbound action call.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Deliver one action request downstream. A success return means the
    /// downstream service accepted the action; the result itself arrives
    /// later via the notification ingress.
    async fn dispatch(&self, request: ActionRequest) -> Result<(), DispatchError>;
}

/// Port for the one-time subscription-confirmation handshake.
#[async_trait]
pub trait HandshakeConfirmer: Send + Sync {
    /// GET the confirmation URL to activate notification delivery.
    async fn confirm(&self, url: &str) -> Result<(), DispatchError>;
}

/// In-memory dispatcher for testing
pub mod channel {
    use super::*;
    use tokio::sync::mpsc;

    /// Dispatcher that forwards requests into an mpsc channel.
    pub struct ChannelDispatcher(pub mpsc::Sender<ActionRequest>);

    #[async_trait]
    impl ActionDispatcher for ChannelDispatcher {
        async fn dispatch(&self, request: ActionRequest) -> Result<(), DispatchError> {
            self.0
                .send(request)
                .await
                .map_err(|_| DispatchError::ChannelClosed)
        }
    }

    /// Create a test dispatcher and the receiving end of its channel.
    pub fn create_test_dispatcher(
        buffer: usize,
    ) -> (ChannelDispatcher, mpsc::Receiver<ActionRequest>) {
        let (tx, rx) = mpsc::channel(buffer);
        (ChannelDispatcher(tx), rx)
    }
}
