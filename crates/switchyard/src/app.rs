//! Application assembly.
//!
//! [`App`] collects configuration, handlers and middleware, then loads the
//! route table and binds everything into a ready-to-run [`Server`].

use std::path::Path;
use std::sync::Arc;

use switchyard_config::{ConfigLoader, RoutingConfig, SwitchyardConfig};
use switchyard_core::{MemoryTokenStore, RecordSink, TokenStore};
use switchyard_middleware::MiddlewareRegistry;
use switchyard_router::{source, RouteCache, RouteError, RouteTable};
use switchyard_server::{Dispatcher, Handler, HandlerRegistry, Router, Server};
use switchyard_telemetry::{init_telemetry, TelemetryConfig};

use crate::error::StartupError;

/// Configuration file read by [`App::from_env`] when present.
pub const CONFIG_FILE: &str = "switchyard.toml";

/// Prefix for environment overrides, e.g. `SWITCHYARD__APP__DEBUG=true`.
pub const ENV_PREFIX: &str = "SWITCHYARD";

/// Loads the route table described by `routing`.
///
/// With the cache enabled, a fresh artifact is reused and a stale or missing
/// one is rebuilt from the source directory and written back. Otherwise the
/// sources are read every time.
///
/// # Errors
///
/// Returns `RouteError` if a source file is invalid or the artifact cannot be
/// written.
pub fn load_routes(routing: &RoutingConfig) -> Result<RouteTable, RouteError> {
    let source_dir = Path::new(&routing.source_dir);
    if !routing.cache_enabled {
        return source::load_dir(source_dir);
    }
    RouteCache::new(&routing.cache_path, source_dir).load_or_build(|| source::load_dir(source_dir))
}

/// A Switchyard application under construction.
///
/// # Example
///
/// ```rust,ignore
/// use switchyard::prelude::*;
///
/// async fn show(params: ParamBag) -> HandlerResult<String> {
///     Ok(format!("user {}", params.get("id").unwrap_or_default()))
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), switchyard::StartupError> {
///     App::from_env()?
///         .handler("UserController@show", show)?
///         .run()
///         .await
/// }
/// ```
pub struct App {
    config: SwitchyardConfig,
    handlers: HandlerRegistry,
    middleware: MiddlewareRegistry,
    tokens: Arc<dyn TokenStore>,
    sink: Option<Arc<dyn RecordSink>>,
}

impl App {
    /// Creates an application with no handlers or middleware.
    #[must_use]
    pub fn new(config: SwitchyardConfig) -> Self {
        Self {
            config,
            handlers: HandlerRegistry::new(),
            middleware: MiddlewareRegistry::new(),
            tokens: Arc::new(MemoryTokenStore::new()),
            sink: None,
        }
    }

    /// Creates an application from `switchyard.toml` (if present), `.env`
    /// and `SWITCHYARD__*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Config` if any layer is invalid.
    pub fn from_env() -> Result<Self, StartupError> {
        let config = ConfigLoader::new()
            .with_defaults()
            .with_optional_file(CONFIG_FILE)?
            .with_dotenv()?
            .with_env_prefix(ENV_PREFIX)
            .load()?;
        Ok(Self::new(config))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    /// Registers a handler under a `Controller@action` reference.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Route` if the reference is malformed.
    pub fn handler<H, Args>(mut self, reference: &str, handler: H) -> Result<Self, StartupError>
    where
        H: Handler<Args>,
    {
        self.handlers.register(reference, handler)?;
        Ok(self)
    }

    /// Returns the handler registry for bulk registration.
    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    /// Returns the middleware registry.
    pub fn middleware_mut(&mut self) -> &mut MiddlewareRegistry {
        &mut self.middleware
    }

    /// Replaces the CSRF token store.
    #[must_use]
    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Replaces the failure record sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Loads the configured route table and builds the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the routes cannot be loaded or reference an
    /// unregistered handler or middleware.
    pub fn build(self) -> Result<Server, StartupError> {
        let table = load_routes(&self.config.routing)?;
        self.build_with_table(table)
    }

    /// Builds the server around an already-assembled route table.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Binding` if a route references an unregistered
    /// handler or middleware.
    pub fn build_with_table(self, table: RouteTable) -> Result<Server, StartupError> {
        let router = Router::bind(table, &self.handlers, &self.middleware)?;
        let mut dispatcher = Dispatcher::from_config(Arc::new(router), &self.config, self.tokens);
        if let Some(sink) = self.sink {
            dispatcher = dispatcher.with_sink(sink);
        }
        Ok(Server::new(self.config.server, dispatcher))
    }

    /// Initializes telemetry, builds the server and runs it until SIGTERM or
    /// SIGINT.
    ///
    /// # Errors
    ///
    /// Returns the first start-up failure.
    pub async fn run(self) -> Result<(), StartupError> {
        init_telemetry(&TelemetryConfig::from(&self.config.telemetry))?;
        let server = self.build()?;
        server.run().await?;
        Ok(())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("handlers", &self.handlers)
            .field("middleware", &self.middleware.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use switchyard_core::{fixtures, HandlerResult, ParamBag};
    use switchyard_server::BindError;

    const USERS: &str = r#"
[[route]]
method = "get"
path = "/users/{id}[int]"
handler = "UserController@show"
"#;

    async fn show(params: ParamBag) -> HandlerResult<String> {
        Ok(format!("user {}", params.get("id").unwrap_or_default()))
    }

    fn routing(dir: &Path, cache_enabled: bool) -> RoutingConfig {
        RoutingConfig {
            source_dir: dir.join("routes").display().to_string(),
            cache_path: dir.join("cache/routes.json").display().to_string(),
            cache_enabled,
        }
    }

    fn app(routing: RoutingConfig) -> App {
        App::new(SwitchyardConfig {
            routing,
            ..SwitchyardConfig::default()
        })
    }

    #[test]
    fn test_load_routes_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/users.toml"), USERS).unwrap();

        let routing = routing(dir.path(), true);
        let table = load_routes(&routing).unwrap();
        assert_eq!(table.len(), 1);
        assert!(Path::new(&routing.cache_path).exists());

        let cached = load_routes(&routing).unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[test]
    fn test_load_routes_without_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/users.toml"), USERS).unwrap();

        let routing = routing(dir.path(), false);
        assert_eq!(load_routes(&routing).unwrap().len(), 1);
        assert!(!Path::new(&routing.cache_path).exists());
    }

    #[test]
    fn test_invalid_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/bad.toml"), "[[route]]\nverb = \"get\"\n").unwrap();

        let err = app(routing(dir.path(), false)).build().unwrap_err();
        assert!(matches!(err, StartupError::Route(RouteError::Source { .. })));
    }

    #[test]
    fn test_unknown_handler_fails_to_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/users.toml"), USERS).unwrap();

        let err = app(routing(dir.path(), false)).build().unwrap_err();
        assert!(matches!(
            err,
            StartupError::Binding(BindError::UnknownHandler { .. })
        ));
    }

    #[test]
    fn test_malformed_handler_reference() {
        let result = App::new(SwitchyardConfig::default()).handler("show", show);
        assert!(matches!(result, Err(StartupError::Route(_))));
    }

    #[tokio::test]
    async fn test_built_server_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("routes")).unwrap();
        fs::write(dir.path().join("routes/users.toml"), USERS).unwrap();

        let server = app(routing(dir.path(), true))
            .handler("UserController@show", show)
            .unwrap()
            .build()
            .unwrap();

        let ok = server.dispatcher().dispatch(fixtures::get("/users/7")).await;
        assert_eq!(ok.status(), 200);

        let rejected = server.dispatcher().dispatch(fixtures::get("/users/x")).await;
        assert_eq!(rejected.status(), 403);
    }
}
