//! # Correlation Registry Concurrency Properties
//!
//! Verifies the invariants the registry must hold under arbitrary
//! interleavings of waiters, resolutions, and expiries:
//!
//! 1. **Exactly-once terminal transition**: for any key, at most one of
//!    resolve/expire takes effect; the loser is a clean no-op.
//! 2. **No cross-delivery**: a waiter only ever receives the payload
//!    published under its own key.
//! 3. **No residue**: every terminal transition removes the entry.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use casino_gateway::domain::registry::{CorrelationRegistry, WaitError};
    use casino_gateway::CorrelationKey;
    use futures::future::join_all;
    use rand::Rng;
    use serde_json::json;

    fn registry() -> Arc<CorrelationRegistry> {
        CorrelationRegistry::new(Duration::from_secs(5))
    }

    /// Many concurrent waiters, each resolved with a distinct payload: every
    /// waiter gets exactly its own result.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_waiters_receive_only_their_own_payload() {
        const PAIRS: usize = 64;
        let registry = registry();

        let mut waiters = Vec::with_capacity(PAIRS);
        let mut keys = Vec::with_capacity(PAIRS);
        for i in 0..PAIRS {
            let key = CorrelationKey::new();
            let pending = registry.register(key, &format!("action-{i}"), None).unwrap();
            keys.push(key);
            waiters.push(tokio::spawn(async move {
                let payload = pending.wait().await.unwrap();
                (i, payload)
            }));
        }

        // Resolve out of order with per-key payloads and random jitter
        let resolvers: Vec<_> = keys
            .iter()
            .enumerate()
            .rev()
            .map(|(i, key)| {
                let registry = Arc::clone(&registry);
                let key = *key;
                tokio::spawn(async move {
                    let jitter = rand::thread_rng().gen_range(0..10u64);
                    tokio::time::sleep(Duration::from_millis(jitter)).await;
                    assert!(registry.resolve(&key, json!({ "waiter": i })));
                })
            })
            .collect();
        join_all(resolvers).await;

        for result in join_all(waiters).await {
            let (i, payload) = result.unwrap();
            assert_eq!(payload["waiter"], i as u64, "cross-delivered payload");
        }
        assert_eq!(registry.pending_count(), 0);
    }

    /// Deliberate resolve-vs-expire races: exactly one side wins every time,
    /// and the registry ends empty.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_resolve_expire_race_has_exactly_one_winner() {
        const ROUNDS: usize = 100;
        let registry = registry();

        for _ in 0..ROUNDS {
            let key = CorrelationKey::new();
            // Hold the handle so the receiver stays alive during the race
            let pending = registry.register(key, "raced", None).unwrap();

            let resolver = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.resolve(&key, json!("winner")) })
            };
            let expirer = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.expire(&key) })
            };

            let resolved = resolver.await.unwrap();
            let expired = expirer.await.unwrap();

            assert!(
                resolved ^ expired,
                "expected exactly one winner, got resolved={resolved} expired={expired}"
            );
            assert!(!registry.is_pending(&key));

            // If resolution won, the waiter must observe the payload
            match pending.wait().await {
                Ok(payload) => {
                    assert!(resolved);
                    assert_eq!(payload, json!("winner"));
                }
                Err(WaitError::Abandoned) => assert!(expired),
                Err(e) => panic!("unexpected wait outcome: {e}"),
            }
        }

        let snap = registry.stats().snapshot();
        assert_eq!(snap.resolved + snap.expired, ROUNDS as u64);
    }

    /// A waiter with a short deadline times out inside a sane window and
    /// leaves nothing behind.
    #[tokio::test]
    async fn test_timeout_is_bounded_and_cleans_up() {
        let registry = registry();
        let key = CorrelationKey::new();
        let pending = registry
            .register(key, "slow-game", Some(Duration::from_millis(50)))
            .unwrap();

        let started = Instant::now();
        let result = pending.wait().await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(WaitError::Timeout)));
        assert!(elapsed >= Duration::from_millis(50), "returned early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(400), "returned late: {elapsed:?}");

        // The key is gone: a subsequent resolve is a no-op
        assert!(!registry.resolve(&key, json!(null)));
        assert_eq!(registry.pending_count(), 0);
    }

    /// Notifications for unknown keys do not disturb any in-flight waiter.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_key_noise_leaves_waiters_untouched() {
        let registry = registry();
        let key = CorrelationKey::new();
        let pending = registry.register(key, "blackjack/play", None).unwrap();

        // Blast unrelated resolutions while the real waiter is suspended
        let noise = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for _ in 0..200 {
                    assert!(!registry.resolve(&CorrelationKey::new(), json!("noise")));
                }
            })
        };

        let resolver = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert!(registry.resolve(&key, json!({"result": "WIN"})));
            })
        };

        let payload = pending.wait().await.unwrap();
        assert_eq!(payload["result"], "WIN");

        noise.await.unwrap();
        resolver.await.unwrap();
        assert_eq!(registry.pending_count(), 0);
    }

    /// Dropped waiters (client disconnects) cancel their entries even under
    /// concurrent load.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_mass_disconnect_leaves_no_residue() {
        const WAITERS: usize = 50;
        let registry = registry();

        let handles: Vec<_> = (0..WAITERS)
            .map(|i| {
                registry
                    .register(CorrelationKey::new(), &format!("doomed-{i}"), None)
                    .unwrap()
            })
            .collect();

        assert_eq!(registry.pending_count(), WAITERS);
        drop(handles);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(registry.stats().snapshot().cancelled, WAITERS as u64);
    }
}
