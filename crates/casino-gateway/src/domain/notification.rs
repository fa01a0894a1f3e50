//! Inbound notification envelope for the pub/sub push channel.
//!
//! The topic delivers two message kinds to the ingress endpoint: a one-time
//! subscription-confirmation handshake, and event notifications whose inner
//! message is a JSON document carrying the correlation key alongside the
//! game result.

use crate::domain::correlation::CorrelationKey;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Field inside the inner event message that carries the correlation key.
pub const CORRELATION_FIELD: &str = "correlation_id";

/// Message kinds delivered by the topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// One-time handshake; must be confirmed via its URL before events flow
    SubscriptionConfirmation,
    /// Application event for an in-flight action
    Event,
}

/// Outer envelope as delivered by the topic.
///
/// Field names follow the topic's wire contract, hence the PascalCase.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "MessageId")]
    message_id: Option<String>,
    #[serde(rename = "Timestamp")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "SubscribeURL")]
    subscribe_url: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

/// Envelope parsing failures. All of these are local to one inbound message
/// and never abort ingress processing.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Body is not a valid envelope
    #[error("invalid notification envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    /// Envelope `Type` is neither handshake nor event
    #[error("unknown notification type: {0}")]
    UnknownKind(String),
    /// Handshake without a confirmation URL
    #[error("handshake missing confirmation URL")]
    MissingSubscribeUrl,
    /// Event without an inner message
    #[error("event missing message body")]
    MissingMessage,
    /// Inner message is not valid JSON
    #[error("event message is not valid JSON: {0}")]
    MalformedMessage(#[source] serde_json::Error),
}

/// One parsed inbound notification.
#[derive(Debug)]
pub struct Notification {
    /// Message kind
    pub kind: NotificationKind,
    /// Topic-assigned message id (for logging)
    pub message_id: Option<String>,
    /// Publish timestamp, when the topic provides one
    pub timestamp: Option<DateTime<Utc>>,
    /// Confirmation URL (handshake only)
    pub subscribe_url: Option<String>,
    /// Correlation key extracted from the event body, when present
    pub key: Option<CorrelationKey>,
    /// Inner event payload (`Value::Null` for handshakes)
    pub body: Value,
}

impl Notification {
    /// Parse a raw ingress body into a notification.
    pub fn parse(raw: &str) -> Result<Self, NotificationError> {
        let envelope: Envelope =
            serde_json::from_str(raw).map_err(NotificationError::Envelope)?;

        match envelope.kind.as_str() {
            "SubscriptionConfirmation" => {
                let url = envelope
                    .subscribe_url
                    .ok_or(NotificationError::MissingSubscribeUrl)?;
                Ok(Self {
                    kind: NotificationKind::SubscriptionConfirmation,
                    message_id: envelope.message_id,
                    timestamp: envelope.timestamp,
                    subscribe_url: Some(url),
                    key: None,
                    body: Value::Null,
                })
            }
            "Notification" => {
                let message = envelope.message.ok_or(NotificationError::MissingMessage)?;
                let body: Value = serde_json::from_str(&message)
                    .map_err(NotificationError::MalformedMessage)?;
                let key = body
                    .get(CORRELATION_FIELD)
                    .and_then(Value::as_str)
                    .and_then(|s| CorrelationKey::parse(s).ok());
                Ok(Self {
                    kind: NotificationKind::Event,
                    message_id: envelope.message_id,
                    timestamp: envelope.timestamp,
                    subscribe_url: None,
                    key,
                    body,
                })
            }
            other => Err(NotificationError::UnknownKind(other.to_string())),
        }
    }
}
