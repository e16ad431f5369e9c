//! Main configuration types.
//!
//! This module provides the top-level [`SwitchyardConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    AppConfig, ConfigError, CsrfConfig, LogFormat, RoutingConfig, ServerConfig, TelemetrySection,
};

/// Complete Switchyard configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use switchyard_config::SwitchyardConfig;
///
/// let config = SwitchyardConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(!config.app.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Application behaviour.
    #[serde(default)]
    pub app: AppConfig,

    /// Route sources and cache.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// CSRF protection.
    #[serde(default)]
    pub csrf: CsrfConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl SwitchyardConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard_config::{AppConfig, SwitchyardConfig};
    ///
    /// let config = SwitchyardConfig::builder()
    ///     .app(AppConfig { debug: true })
    ///     .build();
    ///
    /// assert!(config.app.debug);
    /// ```
    #[must_use]
    pub fn builder() -> SwitchyardConfigBuilder {
        SwitchyardConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - Server or metrics address is not a socket address
    /// - The request timeout is zero
    /// - The CSRF token name or header name is empty or malformed
    /// - Caching is enabled without a cache path
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }

        if self.telemetry.metrics.enabled
            && self
                .telemetry
                .metrics
                .addr
                .parse::<std::net::SocketAddr>()
                .is_err()
        {
            return Err(ConfigError::invalid_value(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", self.telemetry.metrics.addr),
            ));
        }

        if self.routing.cache_enabled && self.routing.cache_path.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "routing.cache_path",
                "must be set when routing.cache_enabled is true",
            ));
        }

        if self.csrf.token_name.is_empty() {
            return Err(ConfigError::invalid_value("csrf.token_name", "must not be empty"));
        }

        if !is_header_name(&self.csrf.header_name) {
            return Err(ConfigError::invalid_value(
                "csrf.header_name",
                format!("not a valid header name: '{}'", self.csrf.header_name),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Debug diagnostics on, pretty logs with colours and source locations,
    /// and the route cache disabled so edits to route files apply at once.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard_config::SwitchyardConfig;
    ///
    /// let config = SwitchyardConfig::development();
    /// assert!(config.app.debug);
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.app.debug = true;
        config.routing.cache_enabled = false;

        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.ansi_enabled = true;
        config.telemetry.logging.include_location = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard_config::{LogFormat, SwitchyardConfig};
    ///
    /// let config = SwitchyardConfig::production();
    /// assert!(!config.app.debug);
    /// assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.app.debug = false;
        config.routing.cache_enabled = true;
        config.csrf.enabled = true;

        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.logging.ansi_enabled = false;
        config.telemetry.metrics.enabled = true;

        config
    }
}

// RFC 7230 token characters; `http` accepts lowercase names only.
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Builder for [`SwitchyardConfig`].
#[derive(Debug, Default)]
pub struct SwitchyardConfigBuilder {
    server: Option<ServerConfig>,
    app: Option<AppConfig>,
    routing: Option<RoutingConfig>,
    csrf: Option<CsrfConfig>,
    telemetry: Option<TelemetrySection>,
}

impl SwitchyardConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the application configuration.
    #[must_use]
    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = Some(app);
        self
    }

    /// Set the routing configuration.
    #[must_use]
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Set the CSRF configuration.
    #[must_use]
    pub fn csrf(mut self, csrf: CsrfConfig) -> Self {
        self.csrf = Some(csrf);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetrySection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> SwitchyardConfig {
        SwitchyardConfig {
            server: self.server.unwrap_or_default(),
            app: self.app.unwrap_or_default(),
            routing: self.routing.unwrap_or_default(),
            csrf: self.csrf.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<SwitchyardConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsConfig;

    #[test]
    fn test_default_config() {
        let config = SwitchyardConfig::default();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
        assert_eq!(config.telemetry.service_name, "switchyard");
        assert_eq!(config.csrf.token_name, "_token");
        assert!(config.routing.cache_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_keeps_other_defaults() {
        let config = SwitchyardConfig::builder()
            .server(ServerConfig {
                http_addr: "127.0.0.1:3000".to_string(),
                ..Default::default()
            })
            .build();

        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.routing.source_dir, "routes");
    }

    #[test]
    fn test_validate_invalid_server_addr() {
        let err = SwitchyardConfig::builder()
            .server(ServerConfig {
                http_addr: "not-an-address".to_string(),
                ..Default::default()
            })
            .build_validated()
            .unwrap_err();
        assert!(err.to_string().contains("http_addr"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let err = SwitchyardConfig::builder()
            .server(ServerConfig {
                request_timeout_ms: 0,
                ..Default::default()
            })
            .build_validated()
            .unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_metrics_addr_only_when_enabled() {
        let mut telemetry = TelemetrySection {
            metrics: MetricsConfig {
                enabled: false,
                addr: "nowhere".to_string(),
            },
            ..Default::default()
        };
        let config = SwitchyardConfig::builder().telemetry(telemetry.clone()).build();
        assert!(config.validate().is_ok());

        telemetry.metrics.enabled = true;
        let err = SwitchyardConfig::builder()
            .telemetry(telemetry)
            .build_validated()
            .unwrap_err();
        assert!(err.to_string().contains("metrics.addr"));
    }

    #[test]
    fn test_validate_csrf_names() {
        let empty_token = SwitchyardConfig::builder()
            .csrf(CsrfConfig {
                token_name: String::new(),
                ..Default::default()
            })
            .build();
        assert!(empty_token.validate().is_err());

        let bad_header = SwitchyardConfig::builder()
            .csrf(CsrfConfig {
                header_name: "X CSRF".to_string(),
                ..Default::default()
            })
            .build();
        assert!(bad_header.validate().is_err());
    }

    #[test]
    fn test_validate_cache_path_required() {
        let config = SwitchyardConfig::builder()
            .routing(RoutingConfig {
                cache_path: " ".to_string(),
                ..Default::default()
            })
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("cache_path"));
    }

    #[test]
    fn test_development_preset() {
        let config = SwitchyardConfig::development();
        assert!(config.app.debug);
        assert!(!config.routing.cache_enabled);
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);
        assert!(config.telemetry.logging.ansi_enabled);
    }

    #[test]
    fn test_production_preset() {
        let config = SwitchyardConfig::production();
        assert!(!config.app.debug);
        assert!(config.routing.cache_enabled);
        assert_eq!(config.telemetry.logging.level, "info");
        assert!(config.telemetry.metrics.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [app]
            debug = true

            [csrf]
            header_name = "x-xsrf-token"
        "#;

        let config: SwitchyardConfig = toml::from_str(toml_str).unwrap();
        assert!(config.app.debug);
        assert_eq!(config.csrf.header_name, "x-xsrf-token");
        assert_eq!(config.csrf.token_name, "_token");
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<SwitchyardConfig, _> = toml::from_str("[authorization]\nenabled = true");
        assert!(result.is_err());
    }
}
