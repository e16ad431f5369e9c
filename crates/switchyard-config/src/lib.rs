//! # Switchyard Configuration
//!
//! Typed, layered configuration for Switchyard services.
//!
//! ## Layers
//!
//! 1. **Defaults**: built-in values, or the `development()` / `production()` presets
//! 2. **Config file**: TOML or JSON
//! 3. **Environment**: `PREFIX__SECTION__KEY` variables, optionally from `.env`
//!
//! Later layers override earlier ones. Unknown fields are rejected.
//!
//! ## Example
//!
//! ```no_run
//! use switchyard_config::ConfigLoader;
//!
//! # fn main() -> Result<(), switchyard_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("switchyard.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("SWITCHYARD")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sections
//!
//! | Section     | Keys                                                   |
//! |-------------|--------------------------------------------------------|
//! | `server`    | `http_addr`, `request_timeout_ms`, `shutdown_timeout_secs` |
//! | `app`       | `debug`                                                |
//! | `routing`   | `source_dir`, `cache_path`, `cache_enabled`            |
//! | `csrf`      | `enabled`, `token_name`, `header_name`                 |
//! | `telemetry` | `service_name`, `logging.*`, `metrics.*`               |

#![doc(html_root_url = "https://docs.rs/switchyard-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{SwitchyardConfig, SwitchyardConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AppConfig, CsrfConfig, LogFormat, LoggingConfig, MetricsConfig, RoutingConfig, ServerConfig,
    TelemetrySection,
};
