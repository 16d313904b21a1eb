//! Handler manifests.
//!
//! A manifest lists handler classes and their actions in TOML. Code is
//! attached by name through [`Bindings`]: each handler names a constructor
//! and each action names an invoker. [`ManifestLoader`] re-reads the file on
//! every call, so a reloading registry observes edits without a restart.
//!
//! ```toml
//! [[handler]]
//! name = "app::Page"
//!
//! [[handler.action]]
//! name = "show"
//! invoke = "page.show"
//! verbs = ["GET"]
//! produces = "text/html"
//!
//! [[handler]]
//! name = "app::Orders"
//! extends = "app::Page"
//! constructor = "orders"
//!
//! [[handler.action]]
//! name = "create"
//! invoke = "orders.create"
//! verbs = ["POST"]
//! consumes = "application/json"
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::Method;
use praetor_core::{
    injected_constructor, plain_constructor, ActionDecl, Catalog, Constructor, Container,
    ContextLoader, Exchange, Handler, HandlerClass, Invoker, LoadingContext, MediaTypeList,
    ResolveError,
};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Parsed manifest file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Handler entries in file order.
    #[serde(default, rename = "handler")]
    pub handlers: Vec<HandlerEntry>,
}

/// One `[[handler]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HandlerEntry {
    /// Class name.
    pub name: String,

    /// Parent class name. Omitted for direct descendants of the root.
    #[serde(default)]
    pub extends: Option<String>,

    /// Constructor binding. Omitted for abstract classes.
    #[serde(default)]
    pub constructor: Option<String>,

    /// Declared actions.
    #[serde(default, rename = "action")]
    pub actions: Vec<ActionEntry>,
}

/// One `[[handler.action]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ActionEntry {
    /// Action name.
    pub name: String,

    /// Invoker binding.
    pub invoke: String,

    /// Verbs. Empty inherits from the overridden action.
    #[serde(default)]
    pub verbs: Vec<String>,

    /// Accepted request media types.
    #[serde(default)]
    pub consumes: Option<String>,

    /// Produced response media types.
    #[serde(default)]
    pub produces: Option<String>,

    /// Method filter this action is restricted to.
    #[serde(default)]
    pub segment: Option<String>,
}

impl Manifest {
    /// Parses a manifest from TOML.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::parse(&content)
    }

    /// Builds a catalog, attaching code from `bindings`.
    ///
    /// # Errors
    ///
    /// Fails on duplicate classes or actions, unknown bindings, invalid verbs
    /// and invalid media types.
    pub fn to_catalog(&self, bindings: &Bindings) -> Result<Catalog, ConfigError> {
        let mut seen = HashSet::new();
        let mut catalog = Catalog::new();
        for entry in &self.handlers {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::invalid_manifest(&entry.name, "declared twice"));
            }
            catalog.register(entry.to_class(bindings)?);
        }
        Ok(catalog)
    }
}

impl HandlerEntry {
    fn to_class(&self, bindings: &Bindings) -> Result<HandlerClass, ConfigError> {
        let mut class = HandlerClass::new(&self.name);
        if let Some(parent) = &self.extends {
            class = class.extends(parent);
        }
        if let Some(name) = &self.constructor {
            class = class.with_constructor(bindings.constructor_named(name)?);
        }

        let mut seen = HashSet::new();
        for action in &self.actions {
            if !seen.insert(action.name.as_str()) {
                return Err(ConfigError::invalid_manifest(
                    &self.name,
                    format!("action '{}' declared twice", action.name),
                ));
            }
            class = class.action(action.to_decl(&self.name, bindings)?);
        }
        Ok(class)
    }
}

impl ActionEntry {
    fn to_decl(&self, handler: &str, bindings: &Bindings) -> Result<ActionDecl, ConfigError> {
        let mut decl = ActionDecl::new(&self.name, bindings.invoker_named(&self.invoke)?);

        for verb in &self.verbs {
            let method = Method::from_bytes(verb.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| {
                    ConfigError::invalid_manifest(
                        handler,
                        format!("action '{}': invalid verb '{verb}'", self.name),
                    )
                })?;
            decl = decl.verb(method);
        }
        if let Some(types) = &self.consumes {
            self.check_media(handler, types)?;
            decl = decl.consumes(types);
        }
        if let Some(types) = &self.produces {
            self.check_media(handler, types)?;
            decl = decl.produces(types);
        }
        if let Some(segment) = &self.segment {
            decl = decl.segment(segment);
        }
        Ok(decl)
    }

    fn check_media(&self, handler: &str, types: &str) -> Result<(), ConfigError> {
        MediaTypeList::try_parse(types).map(drop).map_err(|e| {
            ConfigError::invalid_manifest(handler, format!("action '{}': {e}", self.name))
        })
    }
}

/// Named code that manifests refer to.
///
/// # Example
///
/// ```
/// use praetor_config::{Bindings, Manifest};
/// use praetor_core::{Exchange, Handler, LoadingContext};
///
/// #[derive(Default)]
/// struct Page;
/// impl Handler for Page {}
///
/// let bindings = Bindings::new()
///     .constructor("page", Page::default)
///     .action("page.show", |_: &mut Page, ex: &mut Exchange| {
///         ex.response.write("shown");
///         Ok(())
///     });
///
/// let manifest = Manifest::parse(r#"
///     [[handler]]
///     name = "app::Page"
///     constructor = "page"
///
///     [[handler.action]]
///     name = "show"
///     invoke = "page.show"
///     verbs = ["GET"]
/// "#).unwrap();
///
/// let catalog = manifest.to_catalog(&bindings).unwrap();
/// assert!(catalog.load_class("app::Page").is_some());
/// ```
#[derive(Clone, Default)]
pub struct Bindings {
    constructors: HashMap<String, Constructor>,
    invokers: HashMap<String, Invoker>,
}

impl Bindings {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a plain constructor.
    #[must_use]
    pub fn constructor<H, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), plain_constructor(f));
        self
    }

    /// Binds a constructor that reads services.
    #[must_use]
    pub fn injected<H, F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        H: Handler,
        F: Fn(&Container) -> anyhow::Result<H> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), injected_constructor(f));
        self
    }

    /// Binds an invoker.
    #[must_use]
    pub fn invoker(mut self, name: impl Into<String>, invoker: Invoker) -> Self {
        self.invokers.insert(name.into(), invoker);
        self
    }

    /// Binds an invoker over a concrete handler type.
    #[must_use]
    pub fn action<H, F>(self, name: impl Into<String>, f: F) -> Self
    where
        H: Handler,
        F: Fn(&mut H, &mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.invoker(name, Invoker::typed(f))
    }

    fn constructor_named(&self, name: &str) -> Result<Constructor, ConfigError> {
        self.constructors
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::unknown_binding("constructor", name))
    }

    fn invoker_named(&self, name: &str) -> Result<Invoker, ConfigError> {
        self.invokers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::unknown_binding("invoker", name))
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut constructors: Vec<_> = self.constructors.keys().collect();
        constructors.sort();
        let mut invokers: Vec<_> = self.invokers.keys().collect();
        invokers.sort();
        f.debug_struct("Bindings")
            .field("constructors", &constructors)
            .field("invokers", &invokers)
            .finish()
    }
}

/// Loads a fresh catalog from a manifest file on every call.
///
/// # Example
///
/// ```no_run
/// use praetor_config::{Bindings, ManifestLoader};
/// use praetor_core::{Registry, Signature};
///
/// let loader = ManifestLoader::new("handlers.toml", Bindings::new());
/// let registry = Registry::reloading(loader);
/// let handler_type = registry.resolve(&Signature::new("app::Orders"));
/// ```
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    path: PathBuf,
    bindings: Arc<Bindings>,
}

impl ManifestLoader {
    /// Creates a loader for the manifest at `path`.
    pub fn new(path: impl Into<PathBuf>, bindings: Bindings) -> Self {
        Self {
            path: path.into(),
            bindings: Arc::new(bindings),
        }
    }

    /// Returns the manifest path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the binding table.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Reads the manifest and builds a catalog.
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        let catalog = Manifest::from_file(&self.path)?.to_catalog(&self.bindings)?;
        tracing::debug!(
            path = %self.path.display(),
            classes = catalog.len(),
            "handler manifest loaded"
        );
        Ok(catalog)
    }
}

impl ContextLoader for ManifestLoader {
    fn load_context(&self) -> Result<Arc<dyn LoadingContext>, ResolveError> {
        let catalog = self.load_catalog().map_err(ResolveError::context_load)?;
        Ok(Arc::new(catalog))
    }
}
