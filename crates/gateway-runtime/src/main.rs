//! # Casino Gateway Runtime
//!
//! The deployable entry point for the casino API gateway.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (from environment)
//! 2. Load configuration (defaults + environment overrides)
//! 3. Build the downstream HTTP client
//! 4. Start the gateway service (action API, notification ingress, admin)
//! 5. Run until Ctrl+C, then shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use casino_gateway::{
    ActionDispatcher, GatewayConfig, GatewayService, HandshakeConfirmer, HttpDownstreamClient,
};
use casino_telemetry::{init_telemetry, TelemetryConfig};

/// Load configuration from defaults and environment overrides.
fn load_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();

    if let Ok(port) = std::env::var("CASINO_HTTP_PORT") {
        match port.parse() {
            Ok(p) => config.http.port = p,
            Err(_) => warn!(value = %port, "ignoring invalid CASINO_HTTP_PORT"),
        }
    }
    if let Ok(port) = std::env::var("CASINO_INGRESS_PORT") {
        match port.parse() {
            Ok(p) => config.ingress.port = p,
            Err(_) => warn!(value = %port, "ignoring invalid CASINO_INGRESS_PORT"),
        }
    }
    if let Ok(port) = std::env::var("CASINO_ADMIN_PORT") {
        match port.parse() {
            Ok(p) => config.admin.port = p,
            Err(_) => warn!(value = %port, "ignoring invalid CASINO_ADMIN_PORT"),
        }
    }
    if let Ok(url) = std::env::var("CASINO_DOWNSTREAM_URL") {
        if !url.is_empty() {
            config.downstream.base_url = url;
        }
    }
    if let Ok(secs) = std::env::var("CASINO_WAIT_TIMEOUT_SECS") {
        match secs.parse() {
            Ok(s) => config.timeouts.wait = Duration::from_secs(s),
            Err(_) => warn!(value = %secs, "ignoring invalid CASINO_WAIT_TIMEOUT_SECS"),
        }
    }

    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let _guard = init_telemetry(&telemetry_config).context("failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Casino Gateway v{}", casino_gateway::VERSION);
    info!("===========================================");

    let config = load_config();

    let client = Arc::new(
        HttpDownstreamClient::new(&config.downstream)
            .context("failed to build downstream client")?,
    );

    let dispatcher: Arc<dyn ActionDispatcher> = client.clone();
    let confirmer: Arc<dyn HandshakeConfirmer> = client;
    let mut service = GatewayService::new(config, dispatcher, confirmer)
        .context("failed to create gateway service")?;
    service.start().await.context("failed to start gateway")?;

    info!("Gateway is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    service.shutdown();
    // Give in-flight requests a moment to drain
    tokio::time::sleep(Duration::from_secs(1)).await;

    info!("Shutdown complete");
    Ok(())
}
