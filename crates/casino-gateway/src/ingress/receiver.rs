//! Notification receiver - resolves inbound pub/sub messages against the
//! correlation registry.
//!
//! The ingress endpoint always acknowledges receipt; classification below is
//! for logs and metrics only. A miss is not an error: network reordering
//! legitimately produces notifications for waits that no longer exist.

use crate::dispatch::HandshakeConfirmer;
use crate::domain::notification::{Notification, NotificationKind};
use crate::domain::registry::CorrelationRegistry;
use crate::middleware::GatewayMetrics;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Classification of one inbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handshake received and its URL confirmed
    Confirmed,
    /// Handshake received but the confirmation GET failed
    HandshakeFailed,
    /// Event matched and woke a waiter
    Resolved,
    /// Event carried a key but no waiter was found (late, duplicate, or
    /// already expired)
    Unmatched,
    /// Event carried no usable correlation key (protocol mismatch upstream)
    Uncorrelated,
    /// Body could not be parsed
    Malformed,
}

/// Processes everything the pub/sub topic pushes at the gateway.
pub struct NotificationReceiver {
    registry: Arc<CorrelationRegistry>,
    confirmer: Arc<dyn HandshakeConfirmer>,
    metrics: Arc<GatewayMetrics>,
}

impl NotificationReceiver {
    pub fn new(
        registry: Arc<CorrelationRegistry>,
        confirmer: Arc<dyn HandshakeConfirmer>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            confirmer,
            metrics,
        }
    }

    /// Handle one raw ingress body.
    ///
    /// Never fails outward: every outcome is folded into a [`Disposition`]
    /// so one bad message cannot break processing of the ones behind it.
    /// Registry resolution is a plain map operation - this method only
    /// suspends for the handshake confirmation GET.
    pub async fn handle(&self, raw: &str) -> Disposition {
        self.metrics.record_notification();

        let notification = match Notification::parse(raw) {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "discarding malformed notification");
                self.metrics.record_notification_malformed();
                return Disposition::Malformed;
            }
        };

        match notification.kind {
            NotificationKind::SubscriptionConfirmation => {
                self.handle_handshake(&notification).await
            }
            NotificationKind::Event => self.handle_event(notification),
        }
    }

    async fn handle_handshake(&self, notification: &Notification) -> Disposition {
        // Parsing guarantees the URL is present for this kind
        let Some(url) = notification.subscribe_url.as_deref() else {
            self.metrics.record_notification_malformed();
            return Disposition::Malformed;
        };

        info!(
            message_id = notification.message_id.as_deref().unwrap_or("-"),
            "subscription handshake received"
        );

        match self.confirmer.confirm(url).await {
            Ok(()) => {
                self.metrics.record_handshake_confirmed();
                Disposition::Confirmed
            }
            Err(e) => {
                // The topic retries unconfirmed subscriptions; nothing to do
                // here beyond recording the failure.
                warn!(error = %e, "handshake confirmation failed");
                self.metrics.record_handshake_failed();
                Disposition::HandshakeFailed
            }
        }
    }

    fn handle_event(&self, notification: Notification) -> Disposition {
        let Some(key) = notification.key else {
            warn!(
                message_id = notification.message_id.as_deref().unwrap_or("-"),
                "event notification carried no correlation key"
            );
            self.metrics.record_notification_uncorrelated();
            return Disposition::Uncorrelated;
        };

        if self.registry.resolve(&key, notification.body) {
            self.metrics.record_notification_resolved();
            Disposition::Resolved
        } else {
            debug!(key = %key, "no waiter for notification, discarding");
            self.metrics.record_notification_unmatched();
            Disposition::Unmatched
        }
    }
}
