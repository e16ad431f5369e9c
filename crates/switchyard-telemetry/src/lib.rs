//! Observability for Switchyard services.
//!
//! - **Logging**: `tracing-subscriber` with an env filter and JSON or pretty output
//! - **Metrics**: the `metrics` facade with an optional Prometheus exporter
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `switchyard_dispatch_total` | Counter | `status` | Dispatched requests |
//! | `switchyard_dispatch_duration_seconds` | Histogram | - | Dispatch latency |
//! | `switchyard_route_cache_total` | Counter | `result` | Route cache hits and misses |
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_config::SwitchyardConfig;
//! use switchyard_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = SwitchyardConfig::development();
//! init_telemetry(&TelemetryConfig::from(&config.telemetry))?;
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, record_dispatch, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    tracing::info!(
        service = %config.service_name,
        metrics = config.metrics.enabled,
        "telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_everything_disabled() {
        let config = TelemetryConfig {
            logging: LogConfig {
                enabled: false,
                ..LogConfig::default()
            },
            ..TelemetryConfig::default()
        };
        assert!(init_telemetry(&config).is_ok());
    }
}
