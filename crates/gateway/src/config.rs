//! Gateway configuration loaded from environment variables.

use service_kit::{ServerConfig, downstream_url};

/// Gateway settings: the shared server settings plus one URL per service.
///
/// Reads `BIKES_URL`, `USERS_URL`, `BILLING_URL`, `RESERVATIONS_URL` and
/// `RESERVATION_ENGINE_URL`, each defaulting to the service's port on
/// localhost.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub bikes_url: String,
    pub users_url: String,
    pub billing_url: String,
    pub reservations_url: String,
    pub engine_url: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig::from_lookup(crate::DEFAULT_PORT, &lookup),
            bikes_url: downstream_url(&lookup, "BIKES_URL", 3001),
            users_url: downstream_url(&lookup, "USERS_URL", 3002),
            billing_url: downstream_url(&lookup, "BILLING_URL", 3003),
            reservations_url: downstream_url(&lookup, "RESERVATIONS_URL", 3004),
            engine_url: downstream_url(&lookup, "RESERVATION_ENGINE_URL", 3005),
        }
    }
}
