//! Correlation registry - the async-to-sync bridge.
//!
//! Maps correlation keys to per-request wait handles so that many concurrent
//! HTTP handlers can each suspend on their own action while the notification
//! ingress resolves completions as they arrive.
//!
//! Every terminal transition (resolved, expired, cancelled) is a single
//! atomic removal from the map, so exactly one of two racing parties wins
//! and the loser observes a clean no-op.

use crate::domain::correlation::CorrelationKey;
use crate::domain::error::RegistryError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Payload delivered to a waiter when its notification arrives.
pub type ResultPayload = serde_json::Value;

/// Registry-side state for one outstanding action.
struct PendingEntry {
    /// Channel that wakes the suspended waiter
    sender: oneshot::Sender<ResultPayload>,
    /// When the wait was registered
    created_at: Instant,
    /// After this instant the sweeper may reclaim the entry
    deadline: Instant,
    /// Action name (for logging)
    action: String,
}

/// Atomic counters describing registry traffic.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Waits registered
    pub registered: AtomicU64,
    /// Waits resolved by a notification
    pub resolved: AtomicU64,
    /// Waits that timed out (waiter deadline or sweeper)
    pub expired: AtomicU64,
    /// Waits cancelled (client disconnect or dispatch rollback)
    pub cancelled: AtomicU64,
    /// Defensive duplicate-key rejections (should stay 0)
    pub duplicate_keys: AtomicU64,
}

/// Serializable snapshot of [`RegistryStats`] for the admin surface.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub registered: u64,
    pub resolved: u64,
    pub expired: u64,
    pub cancelled: u64,
    pub duplicate_keys: u64,
}

impl RegistryStats {
    /// Capture the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            duplicate_keys: self.duplicate_keys.load(Ordering::Relaxed),
        }
    }
}

/// Concurrent store of in-flight waits, shared by every request handler and
/// the notification ingress.
///
/// Flow:
/// 1. The initiator mints a [`CorrelationKey`] and calls [`register`]
/// 2. The returned [`PendingWait`] suspends the HTTP handler via [`PendingWait::wait`]
/// 3. The ingress calls [`resolve`] when the matching notification arrives
/// 4. Whichever of resolution / expiry happens first removes the entry
///
/// [`register`]: CorrelationRegistry::register
/// [`resolve`]: CorrelationRegistry::resolve
pub struct CorrelationRegistry {
    /// Map of correlation key to pending entry
    entries: DashMap<CorrelationKey, PendingEntry>,
    /// Wait bound applied when the caller does not specify one
    default_wait: Duration,
    /// Traffic counters
    stats: RegistryStats,
    /// Back-reference handed to wait handles for their cleanup paths
    this: Weak<Self>,
}

impl CorrelationRegistry {
    /// Create a shared registry with the given default wait bound.
    ///
    /// Returns an `Arc` because every wait handle keeps a back-reference
    /// for its timeout and cancellation cleanup.
    pub fn new(default_wait: Duration) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            entries: DashMap::new(),
            default_wait,
            stats: RegistryStats::default(),
            this: this.clone(),
        })
    }

    /// Insert a fresh wait for `key` and hand back the waiter-side handle.
    ///
    /// The key is caller-generated; an already-present key is an internal
    /// invariant violation and is rejected rather than overwritten.
    pub fn register(
        &self,
        key: CorrelationKey,
        action: &str,
        wait: Option<Duration>,
    ) -> Result<PendingWait, RegistryError> {
        let wait = wait.unwrap_or(self.default_wait);
        let now = Instant::now();
        let deadline = now + wait;
        let (tx, rx) = oneshot::channel();

        match self.entries.entry(key) {
            Entry::Occupied(_) => {
                self.stats.duplicate_keys.fetch_add(1, Ordering::Relaxed);
                Err(RegistryError::DuplicateKey(key))
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    sender: tx,
                    created_at: now,
                    deadline,
                    action: action.to_string(),
                });
                self.stats.registered.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, action, wait_ms = wait.as_millis() as u64, "registered wait");
                Ok(PendingWait {
                    key,
                    created_at: now,
                    deadline,
                    receiver: rx,
                    registry: self.this.clone(),
                    settled: false,
                })
            }
        }
    }

    /// Deliver a notification payload to the waiter for `key`.
    ///
    /// Returns whether a live waiter was matched. `false` covers every
    /// benign miss - unknown key, already expired, already resolved, or a
    /// waiter that disconnected - and must be treated as a no-op by callers:
    /// network reordering makes all of these legitimate.
    pub fn resolve(&self, key: &CorrelationKey, payload: ResultPayload) -> bool {
        let Some((_, entry)) = self.entries.remove(key) else {
            debug!(key = %key, "notification has no pending wait");
            return false;
        };

        let waited = entry.created_at.elapsed();
        match entry.sender.send(payload) {
            Ok(()) => {
                self.stats.resolved.fetch_add(1, Ordering::Relaxed);
                debug!(
                    key = %key,
                    action = %entry.action,
                    waited_ms = waited.as_millis() as u64,
                    "resolved wait"
                );
                true
            }
            Err(_) => {
                // Waiter dropped between our removal and the send
                self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, action = %entry.action, "waiter gone, payload dropped");
                false
            }
        }
    }

    /// Expire the wait for `key` if it is still outstanding.
    ///
    /// Returns whether expiry took effect. `false` means the entry already
    /// reached a terminal state - usually a resolution that won the race -
    /// and the caller must prefer that outcome over reporting a timeout.
    pub fn expire(&self, key: &CorrelationKey) -> bool {
        let Some((_, entry)) = self.entries.remove(key) else {
            return false;
        };
        self.stats.expired.fetch_add(1, Ordering::Relaxed);
        warn!(
            key = %key,
            action = %entry.action,
            waited_ms = entry.created_at.elapsed().as_millis() as u64,
            "wait expired without a notification"
        );
        true
    }

    /// Silently remove the wait for `key` (dispatch rollback, client gone).
    ///
    /// Returns whether an entry was removed.
    pub(crate) fn cancel(&self, key: &CorrelationKey) -> bool {
        if self.entries.remove(key).is_some() {
            self.stats.cancelled.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cancelled wait");
            true
        } else {
            false
        }
    }

    /// Reclaim entries whose deadline passed without any party acting.
    ///
    /// Normal cleanup is done by the waiter's own timeout; this is the
    /// backstop for waits whose handler died before reaching it. Returns the
    /// number of entries removed.
    pub fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|key, entry| {
            if now < entry.deadline {
                return true;
            }
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            removed += 1;
            warn!(
                key = %key,
                action = %entry.action,
                "sweeper reclaimed abandoned wait"
            );
            false
        });

        removed
    }

    /// Number of currently outstanding waits
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `key` has an outstanding wait
    pub fn is_pending(&self, key: &CorrelationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Traffic counters
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Default wait bound
    pub fn default_wait(&self) -> Duration {
        self.default_wait
    }
}

/// Errors surfaced by [`PendingWait::wait`].
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The deadline passed and expiry won the race against resolution
    #[error("no completion notification within the deadline")]
    Timeout,
    /// The registry entry vanished without delivering a payload
    #[error("wait abandoned before a result arrived")]
    Abandoned,
}

/// Waiter-side handle for one outstanding action.
///
/// Holds the receiving half of the wait; consuming it with [`wait`] suspends
/// the caller until resolution or the deadline. Dropping the handle without
/// waiting (client disconnect) cancels the registry entry.
///
/// [`wait`]: PendingWait::wait
pub struct PendingWait {
    key: CorrelationKey,
    created_at: Instant,
    deadline: Instant,
    receiver: oneshot::Receiver<ResultPayload>,
    registry: Weak<CorrelationRegistry>,
    settled: bool,
}

impl PendingWait {
    /// The correlation key this wait is registered under
    pub fn key(&self) -> CorrelationKey {
        self.key
    }

    /// The wait bound this handle was registered with
    pub fn wait_bound(&self) -> Duration {
        self.deadline.duration_since(self.created_at)
    }

    /// Suspend until the wait resolves or its deadline passes.
    ///
    /// No polling: the caller parks on the oneshot future and is woken
    /// directly by the resolving party. On timeout the handle races
    /// [`CorrelationRegistry::expire`] against a concurrent resolution; if
    /// expiry loses, the already-delivered payload is returned instead of a
    /// timeout, so a request that completed just under the wire is never
    /// reported as failed.
    pub async fn wait(mut self) -> Result<ResultPayload, WaitError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let outcome = tokio::time::timeout(remaining, &mut self.receiver).await;
        self.settled = true;

        match outcome {
            Ok(Ok(payload)) => Ok(payload),
            // Entry was reclaimed without a payload. At the deadline boundary
            // that is the sweeper winning the expiry race and reads as a
            // timeout; earlier than that it is a genuine anomaly.
            Ok(Err(_)) => {
                if Instant::now() >= self.deadline {
                    Err(WaitError::Timeout)
                } else {
                    Err(WaitError::Abandoned)
                }
            }
            Err(_elapsed) => {
                let Some(registry) = self.registry.upgrade() else {
                    return Err(WaitError::Abandoned);
                };
                if registry.expire(&self.key) {
                    return Err(WaitError::Timeout);
                }
                // Expiry lost: a resolution removed the entry first. The
                // payload is in flight on the channel - drain it.
                match (&mut self.receiver).await {
                    Ok(payload) => {
                        debug!(key = %self.key, "resolution beat the deadline");
                        Ok(payload)
                    }
                    Err(_) => Err(WaitError::Abandoned),
                }
            }
        }
    }

    /// Tear the wait down without waiting (dispatch rollback path).
    pub fn discard(mut self) {
        self.settled = true;
        if let Some(registry) = self.registry.upgrade() {
            registry.cancel(&self.key);
        }
    }
}

impl Drop for PendingWait {
    fn drop(&mut self) {
        // Handle dropped mid-flight: the client went away. Best-effort
        // cleanup so the entry does not linger until the sweeper.
        if !self.settled {
            if let Some(registry) = self.registry.upgrade() {
                registry.cancel(&self.key);
            }
        }
    }
}

/// Background task reclaiming abandoned waits.
pub async fn sweeper_task(registry: Arc<CorrelationRegistry>, interval: Duration) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        let removed = registry.remove_expired();
        if removed > 0 {
            debug!(removed, "sweeper pass reclaimed waits");
        }
    }
}
