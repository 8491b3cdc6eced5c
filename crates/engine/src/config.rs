//! Engine configuration loaded from environment variables.

use service_kit::{ServerConfig, downstream_url};

/// Engine settings: the shared server settings plus collaborator URLs.
///
/// Reads `BIKES_URL`, `BILLING_URL` and `RESERVATIONS_URL` on top of the
/// variables read by [`ServerConfig`]. Each URL defaults to the matching
/// service on localhost.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub server: ServerConfig,
    pub bikes_url: String,
    pub billing_url: String,
    pub reservations_url: String,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig::from_lookup(crate::DEFAULT_PORT, &lookup),
            bikes_url: downstream_url(&lookup, "BIKES_URL", 3001),
            billing_url: downstream_url(&lookup, "BILLING_URL", 3003),
            reservations_url: downstream_url(&lookup, "RESERVATIONS_URL", 3004),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config.server.port, 3005);
        assert_eq!(config.bikes_url, "http://localhost:3001");
        assert_eq!(config.billing_url, "http://localhost:3003");
        assert_eq!(config.reservations_url, "http://localhost:3004");
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(|key| match key {
            "PORT" => Some("9000".to_string()),
            "BILLING_URL" => Some("http://billing/".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.billing_url, "http://billing");
    }
}
