//! Prometheus metrics for Switchyard.
//!
//! Metrics are recorded through the `metrics` facade, so recording is a no-op
//! until a recorder is installed with [`init_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchyard_dispatch_total` | Counter | `status` | Dispatched requests by response status |
//! | `switchyard_dispatch_duration_seconds` | Histogram | - | Dispatch latency |
//! | `switchyard_route_cache_total` | Counter | `result` | Route cache lookups (`hit`, `miss`) |

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

/// Dispatch counter, labelled by `status`.
pub const DISPATCH_TOTAL: &str = "switchyard_dispatch_total";

/// Dispatch latency histogram.
pub const DISPATCH_DURATION_SECONDS: &str = "switchyard_dispatch_duration_seconds";

/// Route cache lookups, labelled by `result`.
pub const ROUTE_CACHE_TOTAL: &str = "switchyard_route_cache_total";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus exporter.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for dispatch duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

impl From<&switchyard_config::MetricsConfig> for MetricsConfig {
    fn from(section: &switchyard_config::MetricsConfig) -> Self {
        Self {
            enabled: section.enabled,
            addr: section.addr.clone(),
            ..Self::default()
        }
    }
}

/// Installs the Prometheus exporter and describes the standard metrics.
///
/// The scrape listener is spawned onto the current tokio runtime when there
/// is one, otherwise onto a background thread.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for a bad listen address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(DISPATCH_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    describe_metrics();
    tracing::info!(%addr, "prometheus exporter listening");

    Ok(())
}

/// Registers descriptions for the standard metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        DISPATCH_TOTAL,
        Unit::Count,
        "Requests dispatched, by response status"
    );
    describe_histogram!(
        DISPATCH_DURATION_SECONDS,
        Unit::Seconds,
        "Time from route resolution to response"
    );
    describe_counter!(
        ROUTE_CACHE_TOTAL,
        Unit::Count,
        "Route table cache lookups, by result"
    );
}

/// Records one dispatched request.
pub fn record_dispatch(status_code: u16, duration: Duration) {
    counter!(DISPATCH_TOTAL, "status" => status_code.to_string()).increment(1);
    histogram!(DISPATCH_DURATION_SECONDS).record(duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert!(!config.duration_buckets.is_empty());
    }

    #[test]
    fn test_from_section() {
        let section = switchyard_config::MetricsConfig {
            enabled: true,
            addr: "127.0.0.1:9100".to_string(),
        };
        let config = MetricsConfig::from(&section);
        assert!(config.enabled);
        assert_eq!(config.addr, "127.0.0.1:9100");
    }

    #[test]
    fn test_cache_metric_name_matches_router() {
        assert_eq!(ROUTE_CACHE_TOTAL, switchyard_router::CACHE_METRIC);
    }

    #[test]
    fn test_disabled_is_noop() {
        assert!(init_metrics(&MetricsConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-addr".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_without_recorder() {
        describe_metrics();
        record_dispatch(200, Duration::from_millis(3));
        record_dispatch(419, Duration::from_millis(1));
    }
}
