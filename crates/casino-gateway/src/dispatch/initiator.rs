//! Request initiator - registers a wait, then fires the downstream action.

use crate::dispatch::{ActionDispatcher, ActionRequest};
use crate::domain::correlation::CorrelationKey;
use crate::domain::error::ActionError;
use crate::domain::registry::{CorrelationRegistry, PendingWait, ResultPayload, WaitError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Initiates game actions and hands back the wait handle for their
/// asynchronous completion.
pub struct ActionInitiator {
    registry: Arc<CorrelationRegistry>,
    dispatcher: Arc<dyn ActionDispatcher>,
}

impl ActionInitiator {
    pub fn new(registry: Arc<CorrelationRegistry>, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// Register a wait and dispatch the action downstream.
    ///
    /// Registration happens first so a completion notification can never
    /// arrive before its wait exists. If the dispatch fails the registration
    /// is rolled back - no orphaned wait survives an action that never
    /// happened.
    pub async fn initiate(
        &self,
        action: &str,
        payload: serde_json::Value,
        wait: Option<Duration>,
    ) -> Result<PendingWait, ActionError> {
        let key = CorrelationKey::new();
        let pending = self
            .registry
            .register(key, action, wait)
            .map_err(|e| {
                error!(key = %key, error = %e, "registration failed");
                ActionError::Internal(e.to_string())
            })?;

        let request = ActionRequest {
            correlation_id: key,
            action: action.to_string(),
            payload,
        };

        if let Err(e) = self.dispatcher.dispatch(request).await {
            pending.discard();
            return Err(ActionError::Dispatch(e));
        }

        debug!(key = %key, action, "action dispatched, awaiting completion");
        Ok(pending)
    }

    /// Initiate an action and suspend until its completion or timeout.
    ///
    /// The synchronous facade used by the HTTP handlers: one call covers the
    /// full round trip.
    pub async fn execute(
        &self,
        action: &str,
        payload: serde_json::Value,
        wait: Option<Duration>,
    ) -> Result<ResultPayload, ActionError> {
        let pending = self.initiate(action, payload, wait).await?;
        let bound = pending.wait_bound();

        match pending.wait().await {
            Ok(result) => Ok(result),
            Err(WaitError::Timeout) => Err(ActionError::Timeout(bound)),
            Err(WaitError::Abandoned) => Err(ActionError::Internal(
                "wait abandoned before completion".to_string(),
            )),
        }
    }

    /// The registry this initiator registers waits in
    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }
}
