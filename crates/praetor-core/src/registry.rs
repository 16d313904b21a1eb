//! Handler type registries.
//!
//! A registry turns a [`Signature`] into a shared [`HandlerType`]. Two
//! strategies exist:
//!
//! - [`CachedRegistry`] builds each action table and handler type once and
//!   returns the same instance on every later call. Builds are serialized
//!   under one lock; lookups of already built types only take a read lock.
//! - [`ReloadingRegistry`] asks its [`ContextLoader`] for a fresh loading
//!   context on every call and builds from scratch, so edited handler
//!   definitions are picked up without a restart. Nothing is retained.
//!
//! [`Registry`] wraps either strategy.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use praetor_core::{fixtures, Registry, Signature};
//!
//! let registry = Registry::cached(fixtures::catalog());
//! let sig = Signature::new(fixtures::DERIVED);
//!
//! let first = registry.resolve(&sig).unwrap();
//! let second = registry.resolve(&sig).unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::{ContextLoader, LoadingContext};
use crate::class::ROOT_CLASS;
use crate::error::{ResolveError, ResolveResult};
use crate::factory::{DefaultFactory, HandlerFactory};
use crate::handler_type::HandlerType;
use crate::media::{ContentNegotiator, QualityNegotiator};
use crate::signature::Signature;
use crate::table::ActionTable;

/// Memoizing registry over a fixed loading context.
pub struct CachedRegistry {
    context: Arc<dyn LoadingContext>,
    factory: Arc<dyn HandlerFactory>,
    negotiator: Arc<dyn ContentNegotiator>,
    types: RwLock<HashMap<Signature, Arc<HandlerType>>>,
    tables: Mutex<HashMap<Signature, Arc<ActionTable>>>,
    table_builds: AtomicUsize,
}

impl CachedRegistry {
    /// Creates a registry over `context`.
    pub fn new(
        context: Arc<dyn LoadingContext>,
        factory: Arc<dyn HandlerFactory>,
        negotiator: Arc<dyn ContentNegotiator>,
    ) -> Self {
        Self {
            context,
            factory,
            negotiator,
            types: RwLock::new(HashMap::new()),
            tables: Mutex::new(HashMap::new()),
            table_builds: AtomicUsize::new(0),
        }
    }

    /// Returns the handler type for `signature`, building it on first use.
    pub fn resolve(&self, signature: &Signature) -> ResolveResult<Arc<HandlerType>> {
        if let Some(handler_type) = self.types.read().get(signature) {
            return Ok(Arc::clone(handler_type));
        }

        let mut tables = self.tables.lock();
        // Another thread may have finished the build while we waited.
        if let Some(handler_type) = self.types.read().get(signature) {
            return Ok(Arc::clone(handler_type));
        }

        let table = self.table_for(&mut tables, signature, &mut Vec::new())?;
        let handler_type = Arc::new(HandlerType::new(
            &table,
            Arc::clone(&self.factory),
            Arc::clone(&self.negotiator),
        )?);
        self.types
            .write()
            .insert(signature.clone(), Arc::clone(&handler_type));

        tracing::debug!(
            signature = %signature,
            actions = handler_type.action_count(),
            "handler type registered"
        );
        Ok(handler_type)
    }

    /// Returns the action table for `signature`, building it on first use.
    pub fn action_table(&self, signature: &Signature) -> ResolveResult<Arc<ActionTable>> {
        let mut tables = self.tables.lock();
        self.table_for(&mut tables, signature, &mut Vec::new())
    }

    /// Returns how many action tables have been built.
    pub fn table_builds(&self) -> usize {
        self.table_builds.load(Ordering::Relaxed)
    }

    /// Returns how many handler types are memoized.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Returns `true` if no handler type has been built yet.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    fn table_for(
        &self,
        tables: &mut HashMap<Signature, Arc<ActionTable>>,
        signature: &Signature,
        chain: &mut Vec<String>,
    ) -> ResolveResult<Arc<ActionTable>> {
        if let Some(table) = tables.get(signature) {
            return Ok(Arc::clone(table));
        }

        let name = signature.class_name();
        if chain.iter().any(|c| c == name) {
            chain.push(name.to_string());
            return Err(ResolveError::invalid_hierarchy(
                name,
                format!("cyclic parent chain {}", chain.join(" -> ")),
            ));
        }
        let class = self
            .context
            .load_class(name)
            .ok_or_else(|| ResolveError::class_not_found(name))?;

        chain.push(name.to_string());
        let parent = match class.parent() {
            None | Some(ROOT_CLASS) => Arc::clone(
                tables
                    .entry(Signature::new(ROOT_CLASS))
                    .or_insert_with(|| Arc::new(ActionTable::root())),
            ),
            Some(parent) => {
                if self.context.load_class(parent).is_none() {
                    return Err(ResolveError::invalid_hierarchy(
                        name,
                        format!("unknown parent class {parent}"),
                    ));
                }
                self.table_for(tables, &Signature::new(parent), chain)?
            }
        };
        chain.pop();

        let table = Arc::new(ActionTable::build(class, signature.clone(), &parent));
        self.table_builds.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            signature = %signature,
            depth = table.depth(),
            actions = table.len(),
            "action table built"
        );
        tables.insert(signature.clone(), Arc::clone(&table));
        Ok(table)
    }
}

impl fmt::Debug for CachedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRegistry")
            .field("types", &self.len())
            .field("table_builds", &self.table_builds())
            .finish_non_exhaustive()
    }
}

/// Registry that rebuilds from a fresh loading context on every call.
pub struct ReloadingRegistry {
    loader: Arc<dyn ContextLoader>,
    factory: Arc<dyn HandlerFactory>,
    negotiator: Arc<dyn ContentNegotiator>,
}

impl ReloadingRegistry {
    /// Creates a registry over `loader`.
    pub fn new(
        loader: Arc<dyn ContextLoader>,
        factory: Arc<dyn HandlerFactory>,
        negotiator: Arc<dyn ContentNegotiator>,
    ) -> Self {
        Self {
            loader,
            factory,
            negotiator,
        }
    }

    /// Builds a new handler type for `signature`.
    pub fn resolve(&self, signature: &Signature) -> ResolveResult<Arc<HandlerType>> {
        let context = self.loader.load_context()?;
        tracing::debug!(signature = %signature, "resolving against fresh context");
        CachedRegistry::new(
            context,
            Arc::clone(&self.factory),
            Arc::clone(&self.negotiator),
        )
        .resolve(signature)
    }
}

impl fmt::Debug for ReloadingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadingRegistry").finish_non_exhaustive()
    }
}

/// A handler type registry of either strategy.
#[derive(Debug)]
pub enum Registry {
    /// Builds once per signature.
    Cached(CachedRegistry),
    /// Rebuilds on every call.
    Reloading(ReloadingRegistry),
}

impl Registry {
    /// Creates a builder to set the factory and negotiator.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Creates a cached registry with the default factory and negotiator.
    pub fn cached(context: impl LoadingContext + 'static) -> Self {
        Self::builder().cached(context)
    }

    /// Creates a reloading registry with the default factory and negotiator.
    pub fn reloading(loader: impl ContextLoader + 'static) -> Self {
        Self::builder().reloading(loader)
    }

    /// Resolves `signature` to a handler type.
    pub fn resolve(&self, signature: &Signature) -> ResolveResult<Arc<HandlerType>> {
        match self {
            Self::Cached(registry) => registry.resolve(signature),
            Self::Reloading(registry) => registry.resolve(signature),
        }
    }

    /// Returns `true` for the reloading strategy.
    pub const fn is_reloading(&self) -> bool {
        matches!(self, Self::Reloading(_))
    }
}

/// Builder for [`Registry`].
pub struct RegistryBuilder {
    factory: Arc<dyn HandlerFactory>,
    negotiator: Arc<dyn ContentNegotiator>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            factory: Arc::new(DefaultFactory),
            negotiator: Arc::new(QualityNegotiator),
        }
    }
}

impl RegistryBuilder {
    /// Sets the handler factory.
    #[must_use]
    pub fn factory(mut self, factory: impl HandlerFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    /// Sets the content negotiator.
    #[must_use]
    pub fn negotiator(mut self, negotiator: impl ContentNegotiator + 'static) -> Self {
        self.negotiator = Arc::new(negotiator);
        self
    }

    /// Builds a cached registry over `context`.
    pub fn cached(self, context: impl LoadingContext + 'static) -> Registry {
        Registry::Cached(CachedRegistry::new(
            Arc::new(context),
            self.factory,
            self.negotiator,
        ))
    }

    /// Builds a reloading registry over `loader`.
    pub fn reloading(self, loader: impl ContextLoader + 'static) -> Registry {
        Registry::Reloading(ReloadingRegistry::new(
            Arc::new(loader),
            self.factory,
            self.negotiator,
        ))
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::class::HandlerClass;
    use crate::fixtures;

    fn cached() -> CachedRegistry {
        CachedRegistry::new(
            Arc::new(fixtures::catalog()),
            Arc::new(DefaultFactory),
            Arc::new(QualityNegotiator),
        )
    }

    #[test]
    fn test_cached_returns_same_instance() {
        let registry = cached();
        let sig = Signature::new(fixtures::DERIVED);
        let first = registry.resolve(&sig).unwrap();
        let second = registry.resolve(&sig).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parent_table_built_once() {
        let registry = cached();
        registry.resolve(&Signature::new(fixtures::DERIVED)).unwrap();
        // Derived and its parent Base.
        assert_eq!(registry.table_builds(), 2);

        registry
            .resolve(&Signature::with_filter(fixtures::DERIVED, "edit"))
            .unwrap();
        // Only the filtered table is new; Base is reused.
        assert_eq!(registry.table_builds(), 3);
    }

    #[test]
    fn test_filtered_and_unfiltered_are_distinct() {
        let registry = cached();
        let plain = registry.resolve(&Signature::new(fixtures::DERIVED)).unwrap();
        let edit = registry
            .resolve(&Signature::with_filter(fixtures::DERIVED, "edit"))
            .unwrap();
        assert!(!Arc::ptr_eq(&plain, &edit));
        assert!(edit.action("edit").is_some());
        assert!(plain.action("edit").is_none());
    }

    #[test]
    fn test_unknown_class() {
        let err = cached()
            .resolve(&Signature::new("fixtures::Missing"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::ClassNotFound { ref class } if class == "fixtures::Missing"));
    }

    #[test]
    fn test_abstract_class() {
        let err = cached()
            .resolve(&Signature::new(fixtures::BASE))
            .unwrap_err();
        assert!(matches!(err, ResolveError::AbstractHandler { .. }));
    }

    #[test]
    fn test_unknown_parent() {
        let catalog = Catalog::new().with(HandlerClass::new("Orphan").extends("Ghost"));
        let registry = Registry::cached(catalog);
        let err = registry.resolve(&Signature::new("Orphan")).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidHierarchy { .. }));
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_cyclic_hierarchy() {
        let catalog = Catalog::new()
            .with(HandlerClass::new("A").extends("B"))
            .with(HandlerClass::new("B").extends("A"));
        let err = Registry::cached(catalog)
            .resolve(&Signature::new("A"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidHierarchy { .. }));
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn test_action_table_lookup() {
        let registry = cached();
        let table = registry
            .action_table(&Signature::new(fixtures::BASE))
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(registry.table_builds(), 1);
    }

    #[test]
    fn test_reloading_builds_fresh_instances() {
        let registry = Registry::reloading(|| -> anyhow::Result<Catalog> {
            Ok(fixtures::catalog())
        });
        assert!(registry.is_reloading());

        let sig = Signature::new(fixtures::DERIVED);
        let first = registry.resolve(&sig).unwrap();
        let second = registry.resolve(&sig).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.action_count(), second.action_count());
    }

    #[test]
    fn test_reloading_surfaces_loader_errors() {
        let registry = Registry::reloading(|| -> anyhow::Result<Catalog> {
            anyhow::bail!("manifest unreadable")
        });
        let err = registry
            .resolve(&Signature::new(fixtures::DERIVED))
            .unwrap_err();
        assert!(matches!(err, ResolveError::ContextLoad { .. }));
    }
}
