//! Correlation key linking an outbound action to its eventual notification.
//!
//! Uses random UUID v4: the key doubles as an unguessable callback token,
//! so it must not be predictable from timing or ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token identifying one in-flight action/notification pair.
///
/// Generated once per initiated action, threaded through the outbound
/// dispatch payload and matched against the inbound notification. Never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(Uuid);

impl CorrelationKey {
    /// Generate a fresh random key (UUID v4)
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationKey {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<CorrelationKey> for Uuid {
    fn from(key: CorrelationKey) -> Self {
        key.0
    }
}

impl AsRef<Uuid> for CorrelationKey {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}
