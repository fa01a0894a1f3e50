//! CORS layer for the public action API.
//!
//! Wrapper around tower-http CORS with gateway configuration.

use crate::domain::config::CorsConfig;
use axum::http::{HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Create a CORS layer from gateway config
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::very_permissive();
    }

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age_secs));

    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cors_layer_builds() {
        let config = CorsConfig::default();
        let layer = create_cors_layer(&config);
        assert!(config.enabled);
        drop(layer);
    }

    #[test]
    fn test_specific_origins_accepted() {
        let config = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://play.example.com".to_string()],
            max_age_secs: 600,
        };
        let layer = create_cors_layer(&config);
        drop(layer);
    }
}
