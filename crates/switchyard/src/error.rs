//! Start-up errors.

use thiserror::Error;

/// Failure while assembling or starting an application.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] switchyard_config::ConfigError),

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] switchyard_telemetry::TelemetryError),

    /// The route table could not be built, cached or registered.
    #[error(transparent)]
    Route(#[from] switchyard_router::RouteError),

    /// A route names a handler or middleware that is not registered.
    #[error(transparent)]
    Binding(#[from] switchyard_server::BindError),

    /// The server could not start.
    #[error(transparent)]
    Server(#[from] switchyard_server::ServerError),
}
