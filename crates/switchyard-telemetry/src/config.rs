//! Telemetry configuration.

use crate::logging::LogConfig;
use crate::metrics::MetricsConfig;

/// Configuration for all telemetry subsystems.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name, attached to the start-up log line.
    pub service_name: String,

    /// Logging configuration.
    pub logging: LogConfig,

    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "switchyard".to_string(),
            logging: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl From<&switchyard_config::TelemetrySection> for TelemetryConfig {
    fn from(section: &switchyard_config::TelemetrySection) -> Self {
        Self {
            service_name: section.service_name.clone(),
            logging: LogConfig::from(&section.logging),
            metrics: MetricsConfig::from(&section.metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_loaded_config() {
        let loaded = switchyard_config::SwitchyardConfig::production();
        let config = TelemetryConfig::from(&loaded.telemetry);
        assert_eq!(config.service_name, "switchyard");
        assert!(config.logging.json_format);
        assert!(config.metrics.enabled);
    }
}
