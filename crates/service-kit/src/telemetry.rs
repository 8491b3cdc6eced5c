//! Structured logging and Prometheus recorder setup.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::ServerConfig;
use crate::error::BootstrapError;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines for local development.
    #[default]
    Pretty,
    /// One JSON object per event for log shippers.
    Json,
}

impl LogFormat {
    /// Parses `LOG_FORMAT`; anything other than `json` selects the pretty format.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `LOG_LEVEL` when both are set.
pub fn init(config: &ServerConfig, service: &'static str) -> Result<(), BootstrapError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    match config.log_format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt_layer.json().with_current_span(true).with_span_list(false))
            .try_init(),
        LogFormat::Pretty => Registry::default().with(filter).with(fmt_layer).try_init(),
    }
    .map_err(|e| BootstrapError::Telemetry(e.to_string()))?;

    tracing::info!(service, format = ?config.log_format, "logging initialized");
    Ok(())
}

/// Installs the global Prometheus recorder and returns its render handle.
pub fn install_metrics() -> Result<PrometheusHandle, BootstrapError> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
