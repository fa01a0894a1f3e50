//! HTTP client for the downstream action service.

use crate::dispatch::{ActionDispatcher, ActionRequest, DispatchError, HandshakeConfirmer};
use crate::domain::config::DownstreamConfig;
use crate::domain::error::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

/// Production implementation of the outbound ports, built on a shared
/// connection pool.
pub struct HttpDownstreamClient {
    client: Client,
    base_url: String,
}

impl HttpDownstreamClient {
    /// Build a client from downstream configuration.
    pub fn new(config: &DownstreamConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL actions are posted under
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ActionDispatcher for HttpDownstreamClient {
    async fn dispatch(&self, request: ActionRequest) -> Result<(), DispatchError> {
        let url = format!("{}/actions/{}", self.base_url, request.action);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        debug!(
            key = %request.correlation_id,
            action = %request.action,
            status = status.as_u16(),
            "action accepted downstream"
        );
        Ok(())
    }
}

#[async_trait]
impl HandshakeConfirmer for HttpDownstreamClient {
    async fn confirm(&self, url: &str) -> Result<(), DispatchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status.as_u16()));
        }

        info!(status = status.as_u16(), "subscription confirmed");
        Ok(())
    }
}
