//! Application assembly.
//!
//! [`App`] ties the pieces together: configuration selects the registry
//! strategy, the route tree receives its type providers, and requests are
//! dispatched to whichever node matches their path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;
use praetor_config::{Bindings, ManifestLoader, PraetorConfig};
use praetor_core::{
    Catalog, ContentNegotiator, Dispatcher, ErrorBoundary, HandlerFactory, Registry,
    RegistryBuilder, Request, Resource, Response, Signature,
};

use crate::AppError;

/// An assembled application.
///
/// # Example
///
/// ```
/// use http::{Method, StatusCode};
/// use praetor::prelude::*;
/// use praetor::App;
///
/// let app = App::builder()
///     .catalog(fixtures::catalog())
///     .route(Resource::new("orders").with_signature(Signature::new(fixtures::ORDERS)))
///     .build()
///     .unwrap();
///
/// let response = app.handle(Request::new(Method::GET, "/orders").with_accept("application/json"));
/// assert_eq!(response.body_text(), "orders:list_json");
///
/// let missing = app.handle(Request::new(Method::GET, "/nowhere"));
/// assert_eq!(missing.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct App {
    config: PraetorConfig,
    registry: Arc<Registry>,
    routes: Resource,
    paths: HashMap<Signature, String>,
    dispatcher: Dispatcher,
}

impl App {
    /// Creates a new application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Dispatches `request` to the route matching its path.
    ///
    /// Paths without a route, or whose route has no handler, answer
    /// `404 Not Found`.
    pub fn handle(&self, request: Request) -> Response {
        match self.routes.find(request.path()) {
            Some(resource) => self.dispatcher.dispatch(resource.provider(), request),
            None => {
                tracing::debug!(path = %request.path(), "no route");
                let mut response = Response::new();
                response.send_error(StatusCode::NOT_FOUND);
                response
            }
        }
    }

    /// Returns the configuration the application was built with.
    pub fn config(&self) -> &PraetorConfig {
        &self.config
    }

    /// Returns the handler type registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Returns the route tree.
    pub fn routes(&self) -> &Resource {
        &self.routes
    }

    /// Returns the path a signature is served at.
    pub fn path_of(&self, signature: &Signature) -> Option<&str> {
        self.paths.get(signature).map(String::as_str)
    }
}

/// Builder for [`App`].
///
/// Handler classes come from a [`Catalog`] registered in code, or from the
/// manifest at `dispatch.manifest_path` resolved through [`Bindings`]. When
/// the configuration enables hot reload the manifest is re-read on every
/// resolution; otherwise it is read once at build time.
#[derive(Debug)]
pub struct AppBuilder {
    config: Option<PraetorConfig>,
    catalog: Option<Catalog>,
    bindings: Bindings,
    registry: RegistryBuilder,
    routes: Resource,
    dispatcher: Dispatcher,
    init_logging: bool,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self {
            config: None,
            catalog: None,
            bindings: Bindings::new(),
            registry: Registry::builder(),
            routes: Resource::root(),
            dispatcher: Dispatcher::new(),
            init_logging: false,
        }
    }
}

impl AppBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration. Defaults to [`PraetorConfig::default`].
    #[must_use]
    pub fn config(mut self, config: PraetorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers handler classes from code.
    #[must_use]
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the bindings used to read the handler manifest.
    #[must_use]
    pub fn bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Sets the handler factory.
    #[must_use]
    pub fn factory(mut self, factory: impl HandlerFactory + 'static) -> Self {
        self.registry = self.registry.factory(factory);
        self
    }

    /// Sets the content negotiator.
    #[must_use]
    pub fn negotiator(mut self, negotiator: impl ContentNegotiator + 'static) -> Self {
        self.registry = self.registry.negotiator(negotiator);
        self
    }

    /// Sets the error boundary for unhandled dispatch failures.
    #[must_use]
    pub fn boundary(mut self, boundary: impl ErrorBoundary + 'static) -> Self {
        self.dispatcher = self.dispatcher.with_boundary(boundary);
        self
    }

    /// Adds a child of the root route.
    #[must_use]
    pub fn route(mut self, resource: Resource) -> Self {
        self.routes = self.routes.with_child(resource);
        self
    }

    /// Replaces the whole route tree.
    #[must_use]
    pub fn routes(mut self, root: Resource) -> Self {
        self.routes = root;
        self
    }

    /// Installs the global log subscriber from the `logging` section during
    /// [`build`](Self::build).
    #[must_use]
    pub fn init_logging(mut self) -> Self {
        self.init_logging = true;
        self
    }

    /// Validates the configuration and assembles the application.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the configuration is invalid, logging cannot be
    /// initialized, no catalog is available, or the manifest cannot be read.
    pub fn build(self) -> Result<App, AppError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        if self.init_logging {
            praetor_telemetry::init_logging(&config.logging.to_log_config())?;
        }

        let registry = Arc::new(Self::build_registry(
            &config,
            self.registry,
            self.catalog,
            self.bindings,
        )?);

        let mut routes = self.routes;
        let paths = routes.init_type_providers(&registry);
        tracing::info!(
            routes = paths.len(),
            reloading = registry.is_reloading(),
            "application assembled"
        );

        Ok(App {
            config,
            registry,
            routes,
            paths,
            dispatcher: self.dispatcher,
        })
    }

    fn build_registry(
        config: &PraetorConfig,
        builder: RegistryBuilder,
        catalog: Option<Catalog>,
        bindings: Bindings,
    ) -> Result<Registry, AppError> {
        let manifest = config.dispatch.manifest_path.clone();
        if config.dispatch.reloading_enabled() {
            let path = manifest.ok_or(AppError::MissingCatalog)?;
            return Ok(builder.reloading(ManifestLoader::new(path, bindings)));
        }

        match (catalog, manifest) {
            (Some(catalog), _) => Ok(builder.cached(catalog)),
            (None, Some(path)) => {
                let catalog = Self::load_manifest(path, bindings)?;
                Ok(builder.cached(catalog))
            }
            (None, None) => Err(AppError::MissingCatalog),
        }
    }

    fn load_manifest(path: PathBuf, bindings: Bindings) -> Result<Catalog, AppError> {
        Ok(ManifestLoader::new(path, bindings).load_catalog()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praetor_config::DispatchConfig;
    use praetor_core::fixtures;

    #[test]
    fn test_build_requires_catalog() {
        let err = App::builder().build().unwrap_err();
        assert!(matches!(err, AppError::MissingCatalog));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = PraetorConfig::builder()
            .dispatch(DispatchConfig {
                hot_reload: true,
                ..Default::default()
            })
            .build();
        let err = App::builder()
            .config(config)
            .catalog(fixtures::catalog())
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_paths_are_recorded() {
        let app = App::builder()
            .catalog(fixtures::catalog())
            .route(Resource::new("pages").with_signature(Signature::new(fixtures::DERIVED)))
            .build()
            .unwrap();

        assert_eq!(app.path_of(&Signature::new(fixtures::DERIVED)), Some("/pages"));
        assert_eq!(app.path_of(&Signature::new(fixtures::ORDERS)), None);
        assert!(!app.registry().is_reloading());
    }

    #[test]
    fn test_missing_manifest_fails_build() {
        let config = PraetorConfig::builder()
            .dispatch(DispatchConfig {
                manifest_path: Some("/nonexistent/handlers.toml".into()),
                ..Default::default()
            })
            .build();
        let err = App::builder().config(config).build().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
