//! Gateway service - main entry point.
//!
//! Runs up to three HTTP servers: the public action API, the notification
//! ingress the pub/sub topic pushes into, and a localhost admin surface.

use crate::dispatch::{ActionDispatcher, ActionInitiator, HandshakeConfirmer};
use crate::domain::config::GatewayConfig;
use crate::domain::error::{ActionError, GatewayError};
use crate::domain::registry::{sweeper_task, CorrelationRegistry};
use crate::ingress::NotificationReceiver;
use crate::middleware::metrics::ActionOutcome;
use crate::middleware::{create_cors_layer, GatewayMetrics, TracingLayer};
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};

/// Gateway service state
pub struct GatewayService {
    config: GatewayConfig,
    registry: Arc<CorrelationRegistry>,
    initiator: Arc<ActionInitiator>,
    receiver: Arc<NotificationReceiver>,
    metrics: Arc<GatewayMetrics>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    http_addr: Option<SocketAddr>,
    ingress_addr: Option<SocketAddr>,
    admin_addr: Option<SocketAddr>,
}

impl GatewayService {
    /// Create a new gateway service.
    ///
    /// The outbound ports are injected so deployments and tests can choose
    /// the transport; production passes the same `HttpDownstreamClient` for
    /// both.
    pub fn new(
        config: GatewayConfig,
        dispatcher: Arc<dyn ActionDispatcher>,
        confirmer: Arc<dyn HandshakeConfirmer>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let registry = CorrelationRegistry::new(config.timeouts.wait);
        let metrics = Arc::new(GatewayMetrics::new());

        let initiator = Arc::new(ActionInitiator::new(Arc::clone(&registry), dispatcher));
        let receiver = Arc::new(NotificationReceiver::new(
            Arc::clone(&registry),
            confirmer,
            Arc::clone(&metrics),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            registry,
            initiator,
            receiver,
            metrics,
            shutdown_tx,
            shutdown_rx,
            http_addr: None,
            ingress_addr: None,
            admin_addr: None,
        })
    }

    /// Bind the enabled listeners and start serving.
    ///
    /// Returns once all servers are up; they run until [`shutdown`] is
    /// called. Bound addresses are available afterwards via the accessors
    /// (relevant when configured with port 0).
    ///
    /// [`shutdown`]: GatewayService::shutdown
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        info!("Starting casino gateway...");

        self.start_sweeper();

        if self.config.http.enabled {
            let addr = self.spawn_server(self.config.http_addr(), self.build_http_router()).await?;
            info!(addr = %addr, "action API listening");
            self.http_addr = Some(addr);
        }

        if self.config.ingress.enabled {
            let addr = self
                .spawn_server(self.config.ingress_addr(), self.build_ingress_router())
                .await?;
            info!(addr = %addr, "notification ingress listening");
            self.ingress_addr = Some(addr);
        }

        if self.config.admin.enabled {
            let addr = self
                .spawn_server(self.config.admin_addr(), self.build_admin_router())
                .await?;
            info!(addr = %addr, "admin server listening");
            self.admin_addr = Some(addr);
        }

        info!("Casino gateway started");
        Ok(())
    }

    /// Trigger graceful shutdown of all servers and the sweeper.
    pub fn shutdown(&self) {
        info!("Shutting down casino gateway...");
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the correlation registry
    pub fn registry(&self) -> Arc<CorrelationRegistry> {
        Arc::clone(&self.registry)
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Bound address of the action API (after [`start`])
    ///
    /// [`start`]: GatewayService::start
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http_addr
    }

    /// Bound address of the notification ingress (after `start`)
    pub fn ingress_addr(&self) -> Option<SocketAddr> {
        self.ingress_addr
    }

    /// Bound address of the admin server (after `start`)
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_addr
    }

    /// Bind one listener and serve a router on it until shutdown.
    async fn spawn_server(
        &self,
        addr: SocketAddr,
        router: Router,
    ) -> Result<SocketAddr, GatewayError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            });
            if let Err(e) = serve.await {
                error!(addr = %local_addr, error = %e, "server error");
            }
        });

        Ok(local_addr)
    }

    /// Build the public action API router
    fn build_http_router(&self) -> Router {
        let state = AppState {
            initiator: Arc::clone(&self.initiator),
            metrics: Arc::clone(&self.metrics),
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new())
            .layer(DefaultBodyLimit::max(self.config.limits.max_action_bytes));

        Router::new()
            .route("/actions/:action", post(handle_action))
            .route("/health", get(health_check))
            .layer(middleware)
            .with_state(state)
    }

    /// Build the notification ingress router
    fn build_ingress_router(&self) -> Router {
        let state = IngressState {
            receiver: Arc::clone(&self.receiver),
        };

        let middleware = ServiceBuilder::new()
            .layer(TracingLayer::new())
            .layer(RequestBodyLimitLayer::new(
                self.config.limits.max_notification_bytes,
            ));

        Router::new()
            .route("/notifications", post(handle_notification))
            .route("/health", get(health_check))
            .layer(middleware)
            .with_state(state)
    }

    /// Build the admin router
    fn build_admin_router(&self) -> Router {
        let metrics = Arc::clone(&self.metrics);
        let registry = Arc::clone(&self.registry);

        let router = Router::new()
            .route("/health", get(health_check))
            .route(
                "/metrics",
                get(move || {
                    let metrics = Arc::clone(&metrics);
                    async move { Json(metrics.to_json()) }
                }),
            )
            .route(
                "/pending",
                get(move || {
                    let registry = Arc::clone(&registry);
                    async move {
                        Json(serde_json::json!({
                            "count": registry.pending_count(),
                            "stats": registry.stats().snapshot(),
                        }))
                    }
                }),
            );

        #[cfg(feature = "metrics")]
        let router = {
            let metrics = Arc::clone(&self.metrics);
            router.route(
                "/metrics/prometheus",
                get(move || {
                    let metrics = Arc::clone(&metrics);
                    async move { metrics.to_prometheus() }
                }),
            )
        };

        router
    }

    /// Start the background sweeper for abandoned waits
    fn start_sweeper(&self) {
        let registry = Arc::clone(&self.registry);
        let interval = self.config.timeouts.sweep_interval;
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = sweeper_task(registry, interval) => {}
                _ = shutdown.changed() => {
                    debug!("sweeper stopped");
                }
            }
        });
    }
}

/// State shared by the action API handlers
#[derive(Clone)]
struct AppState {
    initiator: Arc<ActionInitiator>,
    metrics: Arc<GatewayMetrics>,
}

/// State shared by the ingress handlers
#[derive(Clone)]
struct IngressState {
    receiver: Arc<NotificationReceiver>,
}

/// Handle `POST /actions/{action}`: initiate downstream, suspend until the
/// correlated completion, answer synchronously.
async fn handle_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    payload: Option<Json<serde_json::Value>>,
) -> axum::response::Response {
    let payload = payload.map(|Json(v)| v).unwrap_or(serde_json::Value::Null);
    let started = Instant::now();

    match state.initiator.execute(&action, payload, None).await {
        Ok(result) => {
            let waited_ms = started.elapsed().as_millis() as u64;
            state
                .metrics
                .record_action(ActionOutcome::Resolved, waited_ms);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            let outcome = match &e {
                ActionError::Timeout(_) => ActionOutcome::TimedOut,
                ActionError::Dispatch(_) => ActionOutcome::DispatchFailed,
                ActionError::Internal(_) => ActionOutcome::Internal,
            };
            state.metrics.record_action(outcome, 0);
            if matches!(e, ActionError::Internal(_)) {
                error!(action = %action, error = %e, "action failed internally");
            }
            e.into_response()
        }
    }
}

/// Handle `POST /notifications`: classify and acknowledge.
///
/// Always `200 OK` - the topic only needs receipt, not a business-level
/// match.
async fn handle_notification(
    State(state): State<IngressState>,
    body: String,
) -> impl IntoResponse {
    let disposition = state.receiver.handle(&body).await;
    debug!(?disposition, "notification processed");
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "received"})),
    )
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "casino-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
