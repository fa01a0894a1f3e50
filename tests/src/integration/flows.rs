//! # Gateway Round-Trip Flows
//!
//! Exercises the initiator → registry → receiver chain end to end over the
//! in-memory dispatcher, with the notification receiver fed the same wire
//! envelopes the pub/sub topic would deliver.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use casino_gateway::dispatch::channel::create_test_dispatcher;
    use casino_gateway::dispatch::{ActionRequest, DispatchError};
    use casino_gateway::domain::registry::CorrelationRegistry;
    use casino_gateway::{
        ActionError, ActionInitiator, CorrelationKey, Disposition, GatewayMetrics,
        HandshakeConfirmer, NotificationReceiver,
    };
    use futures::future::join_all;
    use serde_json::json;
    use tokio::sync::mpsc;

    /// Confirmer that counts confirmation GETs instead of performing them.
    #[derive(Default)]
    struct CountingConfirmer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HandshakeConfirmer for CountingConfirmer {
        async fn confirm(&self, _url: &str) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[allow(clippy::type_complexity)]
    fn harness() -> (
        Arc<ActionInitiator>,
        Arc<NotificationReceiver>,
        Arc<CountingConfirmer>,
        Arc<CorrelationRegistry>,
        mpsc::Receiver<ActionRequest>,
    ) {
        let registry = CorrelationRegistry::new(Duration::from_secs(5));
        let (dispatcher, dispatched) = create_test_dispatcher(64);
        let confirmer = Arc::new(CountingConfirmer::default());
        let initiator = Arc::new(ActionInitiator::new(
            Arc::clone(&registry),
            Arc::new(dispatcher),
        ));
        let confirmer_port: Arc<dyn HandshakeConfirmer> = confirmer.clone();
        let receiver = Arc::new(NotificationReceiver::new(
            Arc::clone(&registry),
            confirmer_port,
            Arc::new(GatewayMetrics::new()),
        ));
        (initiator, receiver, confirmer, registry, dispatched)
    }

    /// Build the envelope the topic would push for a completed action.
    fn completion_envelope(key: CorrelationKey, result: &str) -> String {
        json!({
            "Type": "Notification",
            "MessageId": format!("mid-{key}"),
            "Message": json!({
                "correlation_id": key.to_string(),
                "result": result,
            })
            .to_string(),
        })
        .to_string()
    }

    /// Happy path: action dispatched, completion notification arrives inside
    /// the window, caller receives the game result.
    #[tokio::test]
    async fn test_action_resolves_with_pushed_result() {
        let (initiator, receiver, _confirmer, registry, mut dispatched) = harness();

        // Play the downstream game service + topic: complete whatever the
        // gateway dispatches.
        let game_service = tokio::spawn(async move {
            let request = dispatched.recv().await.unwrap();
            let envelope = completion_envelope(request.correlation_id, "WIN");
            assert_eq!(receiver.handle(&envelope).await, Disposition::Resolved);
        });

        let result = initiator
            .execute("blackjack/play", json!({"bet": 100}), None)
            .await
            .unwrap();

        assert_eq!(result["result"], "WIN");
        game_service.await.unwrap();
        assert_eq!(registry.pending_count(), 0);
    }

    /// A notification arriving after the wait deadline: the caller gets a
    /// timeout, and the late delivery is still acknowledged without error.
    #[tokio::test]
    async fn test_late_notification_after_timeout() {
        let (initiator, receiver, _confirmer, registry, mut dispatched) = harness();

        let outcome = initiator
            .execute("roulette/spin", json!({}), Some(Duration::from_millis(100)))
            .await;
        assert!(matches!(outcome, Err(ActionError::Timeout(_))));

        // The action was dispatched; its completion just arrived too late
        let request = dispatched.recv().await.unwrap();
        let envelope = completion_envelope(request.correlation_id, "WIN");
        assert_eq!(receiver.handle(&envelope).await, Disposition::Unmatched);
        assert_eq!(registry.pending_count(), 0);
    }

    /// Handshake messages confirm the subscription and never touch waits.
    #[tokio::test]
    async fn test_handshake_confirms_without_touching_waits() {
        let (initiator, receiver, confirmer, registry, mut dispatched) = harness();

        let pending = initiator
            .initiate("blackjack/play", json!({}), None)
            .await
            .unwrap();
        let _ = dispatched.recv().await.unwrap();

        let handshake = json!({
            "Type": "SubscriptionConfirmation",
            "SubscribeURL": "https://topic.example/confirm?token=xyz",
        })
        .to_string();

        assert_eq!(receiver.handle(&handshake).await, Disposition::Confirmed);
        assert_eq!(confirmer.calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_pending(&pending.key()));
    }

    /// Failed dispatch leaves no wait behind and surfaces as a dispatch
    /// error, not a timeout.
    #[tokio::test]
    async fn test_dispatch_failure_leaves_no_orphan() {
        struct RefusingDispatcher;

        #[async_trait]
        impl casino_gateway::ActionDispatcher for RefusingDispatcher {
            async fn dispatch(&self, _request: ActionRequest) -> Result<(), DispatchError> {
                Err(DispatchError::Status(502))
            }
        }

        let registry = CorrelationRegistry::new(Duration::from_secs(5));
        let initiator = ActionInitiator::new(Arc::clone(&registry), Arc::new(RefusingDispatcher));

        let outcome = initiator.execute("blackjack/play", json!({}), None).await;
        assert!(matches!(outcome, Err(ActionError::Dispatch(_))));
        assert_eq!(registry.pending_count(), 0);
    }

    /// N concurrent round trips with distinct payloads: nobody receives a
    /// result belonging to another request.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_round_trips_no_cross_delivery() {
        const PLAYERS: usize = 32;
        let (initiator, receiver, _confirmer, registry, mut dispatched) = harness();

        // Game service task: complete every dispatched action, echoing the
        // bet back so each caller can check it got its own round.
        let game_service = tokio::spawn(async move {
            for _ in 0..PLAYERS {
                let request = dispatched.recv().await.unwrap();
                let bet = request.payload["bet"].as_u64().unwrap();
                let envelope = json!({
                    "Type": "Notification",
                    "Message": json!({
                        "correlation_id": request.correlation_id.to_string(),
                        "result": "WIN",
                        "bet": bet,
                    })
                    .to_string(),
                })
                .to_string();
                assert_eq!(receiver.handle(&envelope).await, Disposition::Resolved);
            }
        });

        let rounds: Vec<_> = (0..PLAYERS)
            .map(|i| {
                let initiator = Arc::clone(&initiator);
                tokio::spawn(async move {
                    let result = initiator
                        .execute("blackjack/play", json!({"bet": i as u64}), None)
                        .await
                        .unwrap();
                    assert_eq!(result["bet"], i as u64, "received another player's round");
                })
            })
            .collect();

        for round in join_all(rounds).await {
            round.unwrap();
        }
        game_service.await.unwrap();
        assert_eq!(registry.pending_count(), 0);
    }

    /// Envelope noise (malformed, keyless, unknown-key) interleaved with a
    /// live round does not break the round.
    #[tokio::test]
    async fn test_envelope_noise_does_not_break_live_round() {
        let (initiator, receiver, _confirmer, _registry, mut dispatched) = harness();

        let game_service = tokio::spawn(async move {
            let request = dispatched.recv().await.unwrap();

            // Noise first
            assert_eq!(receiver.handle("garbage").await, Disposition::Malformed);
            let keyless = json!({
                "Type": "Notification",
                "Message": json!({"result": "?"}).to_string(),
            })
            .to_string();
            assert_eq!(receiver.handle(&keyless).await, Disposition::Uncorrelated);
            assert_eq!(
                receiver
                    .handle(&completion_envelope(CorrelationKey::new(), "LOSE"))
                    .await,
                Disposition::Unmatched
            );

            // Then the real completion
            let envelope = completion_envelope(request.correlation_id, "WIN");
            assert_eq!(receiver.handle(&envelope).await, Disposition::Resolved);
        });

        let result = initiator
            .execute("blackjack/play", json!({"bet": 1}), None)
            .await
            .unwrap();
        assert_eq!(result["result"], "WIN");
        game_service.await.unwrap();
    }
}
