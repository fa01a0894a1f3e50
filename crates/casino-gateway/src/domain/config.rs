//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Public action API server
    pub http: HttpConfig,
    /// Notification ingress server (webhook target of the pub/sub topic)
    pub ingress: IngressConfig,
    /// Admin server (localhost only by default)
    pub admin: AdminConfig,
    /// Downstream game-action service
    pub downstream: DownstreamConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// CORS configuration for the public API
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            ingress: IngressConfig::default(),
            admin: AdminConfig::default(),
            downstream: DownstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Enabled listeners must not share a port. Port 0 (ephemeral, used
        // by tests) is exempt.
        let ports: Vec<u16> = [
            (self.http.enabled, self.http.port),
            (self.ingress.enabled, self.ingress.port),
            (self.admin.enabled, self.admin.port),
        ]
        .into_iter()
        .filter(|(enabled, port)| *enabled && *port != 0)
        .map(|(_, port)| port)
        .collect();
        let unique_ports: HashSet<_> = ports.iter().collect();
        if unique_ports.len() != ports.len() {
            return Err(ConfigError::DuplicatePorts);
        }

        if self.timeouts.wait.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "completion wait cannot be 0".into(),
            ));
        }
        if self.timeouts.dispatch.is_zero() {
            return Err(ConfigError::InvalidTimeout("dispatch cannot be 0".into()));
        }

        if self.downstream.base_url.is_empty() {
            return Err(ConfigError::InvalidDownstream(
                "base_url cannot be empty".into(),
            ));
        }
        if !self.downstream.base_url.starts_with("http") {
            return Err(ConfigError::InvalidDownstream(format!(
                "base_url must be an http(s) URL: {}",
                self.downstream.base_url
            )));
        }

        if self.limits.max_notification_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_notification_bytes cannot be 0".into(),
            ));
        }
        if self.limits.max_action_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_action_bytes cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get public API bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Get notification ingress bind address
    pub fn ingress_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ingress.host, self.ingress.port)
    }

    /// Get admin bind address
    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.admin.host, self.admin.port)
    }
}

/// Public action API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8000)
    pub port: u16,
    /// Enable the public API server
    pub enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
            enabled: true,
        }
    }
}

/// Notification ingress server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8001)
    pub port: u16,
    /// Enable the ingress server
    pub enabled: bool,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8001,
            enabled: true,
        }
    }
}

/// Admin server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (localhost only by default)
    pub host: IpAddr,
    /// Port (default: 8081)
    pub port: u16,
    /// Enable the admin server
    pub enabled: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8081,
            enabled: true,
        }
    }
}

/// Downstream game-action service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Base URL of the action service; action names are appended as a path
    /// segment (`{base_url}/actions/{action}`)
    pub base_url: String,
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Per-request timeout for outbound calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a caller waits for the completion notification
    #[serde(with = "humantime_serde")]
    pub wait: Duration,
    /// Upper bound on the outbound dispatch call
    #[serde(with = "humantime_serde")]
    pub dispatch: Duration,
    /// Upper bound on the handshake confirmation GET
    #[serde(with = "humantime_serde")]
    pub handshake: Duration,
    /// Sweeper pass interval for abandoned waits
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(10),
            dispatch: Duration::from_secs(5),
            handshake: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(10),
        }
    }
}

/// Request size limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max inbound notification body size in bytes (default: 256KB)
    pub max_notification_bytes: usize,
    /// Max action request body size in bytes (default: 64KB)
    pub max_action_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_notification_bytes: 256 * 1024,
            max_action_bytes: 64 * 1024,
        }
    }
}

/// CORS configuration for the public API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Max age for preflight cache in seconds
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 3600,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Multiple servers using the same port
    #[error("duplicate ports configured")]
    DuplicatePorts,
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Invalid downstream service configuration
    #[error("invalid downstream config: {0}")]
    InvalidDownstream(String),
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Plain number means seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.ingress.port, 8001);
        assert_eq!(config.admin.port, 8081);
    }

    #[test]
    fn test_duplicate_ports_rejected() {
        let mut config = GatewayConfig::default();
        config.ingress.port = config.http.port;
        assert!(matches!(config.validate(), Err(ConfigError::DuplicatePorts)));
    }

    #[test]
    fn test_ephemeral_ports_allowed_to_collide() {
        let mut config = GatewayConfig::default();
        config.http.port = 0;
        config.ingress.port = 0;
        config.admin.port = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_wait_rejected() {
        let mut config = GatewayConfig::default();
        config.timeouts.wait = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_empty_downstream_url_rejected() {
        let mut config = GatewayConfig::default();
        config.downstream.base_url = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDownstream(_))
        ));
    }

    #[test]
    fn test_config_addresses() {
        let config = GatewayConfig::default();
        assert_eq!(config.http_addr().port(), 8000);
        assert_eq!(config.ingress_addr().port(), 8001);
        assert!(config.admin_addr().ip().is_loopback());
    }

    #[test]
    fn test_duration_roundtrip_through_serde() {
        let mut config = GatewayConfig::default();
        config.timeouts.wait = Duration::from_millis(2500);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: GatewayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.timeouts.wait, Duration::from_millis(2500));
        assert_eq!(parsed.timeouts.dispatch, Duration::from_secs(5));
    }
}
