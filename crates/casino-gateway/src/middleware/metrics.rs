//! Gateway traffic metrics.
//!
//! Plain atomic counters exported as JSON on the admin surface, with a
//! Prometheus text rendering behind the `metrics` feature.

use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Action counters
    pub actions_total: AtomicU64,
    pub actions_resolved: AtomicU64,
    pub actions_timed_out: AtomicU64,
    pub actions_dispatch_failed: AtomicU64,

    // Notification counters
    pub notifications_total: AtomicU64,
    pub notifications_resolved: AtomicU64,
    pub notifications_unmatched: AtomicU64,
    pub notifications_uncorrelated: AtomicU64,
    pub notifications_malformed: AtomicU64,

    // Handshake counters
    pub handshakes_confirmed: AtomicU64,
    pub handshakes_failed: AtomicU64,

    // Latency tracking (simplified - in production use histograms)
    pub total_wait_ms: AtomicU64,
    pub resolved_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one action request and its outcome
    pub fn record_action(&self, outcome: ActionOutcome, wait_ms: u64) {
        self.actions_total.fetch_add(1, Ordering::Relaxed);
        match outcome {
            ActionOutcome::Resolved => {
                self.actions_resolved.fetch_add(1, Ordering::Relaxed);
                self.total_wait_ms.fetch_add(wait_ms, Ordering::Relaxed);
                self.resolved_count_for_latency
                    .fetch_add(1, Ordering::Relaxed);
            }
            ActionOutcome::TimedOut => {
                self.actions_timed_out.fetch_add(1, Ordering::Relaxed);
            }
            ActionOutcome::DispatchFailed => {
                self.actions_dispatch_failed.fetch_add(1, Ordering::Relaxed);
            }
            // Internal failures only count toward the total
            ActionOutcome::Internal => {}
        }
    }

    /// Record one inbound notification
    pub fn record_notification(&self) {
        self.notifications_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a notification that resolved a waiter
    pub fn record_notification_resolved(&self) {
        self.notifications_resolved.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a keyed notification with no matching waiter
    pub fn record_notification_unmatched(&self) {
        self.notifications_unmatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event notification carrying no usable correlation key
    pub fn record_notification_uncorrelated(&self) {
        self.notifications_uncorrelated
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record an unparseable notification body
    pub fn record_notification_malformed(&self) {
        self.notifications_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful handshake confirmation
    pub fn record_handshake_confirmed(&self) {
        self.handshakes_confirmed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed handshake confirmation
    pub fn record_handshake_failed(&self) {
        self.handshakes_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Average completion wait for resolved actions, in milliseconds
    pub fn average_wait_ms(&self) -> f64 {
        let total = self.total_wait_ms.load(Ordering::Relaxed);
        let count = self.resolved_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export as a JSON object for the admin surface
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "actions": {
                "total": self.actions_total.load(Ordering::Relaxed),
                "resolved": self.actions_resolved.load(Ordering::Relaxed),
                "timed_out": self.actions_timed_out.load(Ordering::Relaxed),
                "dispatch_failed": self.actions_dispatch_failed.load(Ordering::Relaxed),
                "average_wait_ms": self.average_wait_ms(),
            },
            "notifications": {
                "total": self.notifications_total.load(Ordering::Relaxed),
                "resolved": self.notifications_resolved.load(Ordering::Relaxed),
                "unmatched": self.notifications_unmatched.load(Ordering::Relaxed),
                "uncorrelated": self.notifications_uncorrelated.load(Ordering::Relaxed),
                "malformed": self.notifications_malformed.load(Ordering::Relaxed),
            },
            "handshakes": {
                "confirmed": self.handshakes_confirmed.load(Ordering::Relaxed),
                "failed": self.handshakes_failed.load(Ordering::Relaxed),
            },
        })
    }

    /// Export metrics in Prometheus text format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        let counters: [(&str, &str, u64); 11] = [
            (
                "gateway_actions_total",
                "Total action requests",
                self.actions_total.load(Ordering::Relaxed),
            ),
            (
                "gateway_actions_resolved_total",
                "Actions resolved by a notification",
                self.actions_resolved.load(Ordering::Relaxed),
            ),
            (
                "gateway_actions_timed_out_total",
                "Actions that hit the wait deadline",
                self.actions_timed_out.load(Ordering::Relaxed),
            ),
            (
                "gateway_actions_dispatch_failed_total",
                "Actions whose downstream dispatch failed",
                self.actions_dispatch_failed.load(Ordering::Relaxed),
            ),
            (
                "gateway_notifications_total",
                "Inbound notifications received",
                self.notifications_total.load(Ordering::Relaxed),
            ),
            (
                "gateway_notifications_resolved_total",
                "Notifications that resolved a waiter",
                self.notifications_resolved.load(Ordering::Relaxed),
            ),
            (
                "gateway_notifications_unmatched_total",
                "Keyed notifications with no waiter",
                self.notifications_unmatched.load(Ordering::Relaxed),
            ),
            (
                "gateway_notifications_uncorrelated_total",
                "Event notifications without a correlation key",
                self.notifications_uncorrelated.load(Ordering::Relaxed),
            ),
            (
                "gateway_notifications_malformed_total",
                "Unparseable notification bodies",
                self.notifications_malformed.load(Ordering::Relaxed),
            ),
            (
                "gateway_handshakes_confirmed_total",
                "Subscription handshakes confirmed",
                self.handshakes_confirmed.load(Ordering::Relaxed),
            ),
            (
                "gateway_handshakes_failed_total",
                "Subscription handshake confirmations that failed",
                self.handshakes_failed.load(Ordering::Relaxed),
            ),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }

        output
    }
}

/// Outcome of one action request, for metric classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Resolved,
    TimedOut,
    DispatchFailed,
    Internal,
}
