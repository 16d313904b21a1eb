//! Class lookup and reloadable loading contexts.
//!
//! A [`LoadingContext`] answers "which class is registered under this name".
//! [`Catalog`] is the in-memory implementation. A [`ContextLoader`] produces
//! a fresh context on demand; the reloading registry asks it for a new one on
//! every resolution so edited handler definitions are picked up.

use std::collections::HashMap;
use std::sync::Arc;

use crate::class::HandlerClass;
use crate::error::ResolveError;

/// Resolves class names to classes.
pub trait LoadingContext: Send + Sync {
    /// Returns the class registered under `name`.
    fn load_class(&self, name: &str) -> Option<Arc<HandlerClass>>;
}

/// Produces fresh loading contexts.
pub trait ContextLoader: Send + Sync {
    /// Creates a new, independent loading context.
    fn load_context(&self) -> Result<Arc<dyn LoadingContext>, ResolveError>;
}

impl<F> ContextLoader for F
where
    F: Fn() -> anyhow::Result<Catalog> + Send + Sync,
{
    fn load_context(&self) -> Result<Arc<dyn LoadingContext>, ResolveError> {
        let catalog = self().map_err(ResolveError::context_load)?;
        Ok(Arc::new(catalog))
    }
}

/// An in-memory set of handler classes.
///
/// # Example
///
/// ```
/// use praetor_core::{Catalog, HandlerClass, LoadingContext};
///
/// let catalog = Catalog::new()
///     .with(HandlerClass::new("app::Base"))
///     .with(HandlerClass::new("app::Home").extends("app::Base"));
///
/// assert_eq!(catalog.len(), 2);
/// assert!(catalog.load_class("app::Home").is_some());
/// assert!(catalog.load_class("app::Missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: HashMap<String, Arc<HandlerClass>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any class of the same name.
    pub fn register(&mut self, class: HandlerClass) -> &mut Self {
        self.classes
            .insert(class.name().to_string(), Arc::new(class));
        self
    }

    /// Registers a class and returns the catalog.
    #[must_use]
    pub fn with(mut self, class: HandlerClass) -> Self {
        self.register(class);
        self
    }

    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns `true` if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl LoadingContext for Catalog {
    fn load_class(&self, name: &str) -> Option<Arc<HandlerClass>> {
        self.classes.get(name).cloned()
    }
}
