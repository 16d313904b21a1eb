//! Per-route access to handler types.
//!
//! Every route holds a [`TypeProvider`]. Depending on how the route was set
//! up it has no handler, is not wired yet, forwards every lookup to a
//! registry, or resolves once and keeps the result.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{ResolveError, ResolveResult};
use crate::handler_type::HandlerType;
use crate::registry::Registry;
use crate::signature::Signature;

/// How a route reaches its handler type.
pub enum TypeProvider {
    /// The route has no handler.
    Unbound,
    /// The route has a handler but providers have not been initialised.
    Uninitialized,
    /// Every lookup goes to the registry. Used with reloading registries.
    Forwarding {
        /// Registry consulted on each lookup.
        registry: Arc<Registry>,
        /// Signature to resolve.
        signature: Signature,
    },
    /// The first successful lookup is kept.
    Caching {
        /// Registry consulted until a lookup succeeds.
        registry: Arc<Registry>,
        /// Signature to resolve.
        signature: Signature,
        /// The memoized handler type.
        cached: OnceLock<Arc<HandlerType>>,
    },
}

impl TypeProvider {
    /// Picks the provider suited to `registry`: forwarding when it reloads,
    /// caching otherwise.
    pub fn for_signature(registry: &Arc<Registry>, signature: Signature) -> Self {
        if registry.is_reloading() {
            Self::Forwarding {
                registry: Arc::clone(registry),
                signature,
            }
        } else {
            Self::Caching {
                registry: Arc::clone(registry),
                signature,
                cached: OnceLock::new(),
            }
        }
    }

    /// Returns the handler type, `None` for unbound routes.
    pub fn handler_type(&self) -> ResolveResult<Option<Arc<HandlerType>>> {
        match self {
            Self::Unbound => Ok(None),
            Self::Uninitialized => Err(ResolveError::Uninitialized),
            Self::Forwarding {
                registry,
                signature,
            } => registry.resolve(signature).map(Some),
            Self::Caching {
                registry,
                signature,
                cached,
            } => {
                if let Some(handler_type) = cached.get() {
                    return Ok(Some(Arc::clone(handler_type)));
                }
                let resolved = registry.resolve(signature)?;
                Ok(Some(Arc::clone(cached.get_or_init(|| resolved))))
            }
        }
    }

    /// Returns the signature, if the provider resolves one.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Forwarding { signature, .. } | Self::Caching { signature, .. } => Some(signature),
            Self::Unbound | Self::Uninitialized => None,
        }
    }
}

impl fmt::Debug for TypeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => f.write_str("Unbound"),
            Self::Uninitialized => f.write_str("Uninitialized"),
            Self::Forwarding { signature, .. } => {
                f.debug_tuple("Forwarding").field(signature).finish()
            }
            Self::Caching {
                signature, cached, ..
            } => f
                .debug_struct("Caching")
                .field("signature", signature)
                .field("resolved", &cached.get().is_some())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::fixtures;

    fn derived() -> Signature {
        Signature::new(fixtures::DERIVED)
    }

    #[test]
    fn test_unbound() {
        assert!(TypeProvider::Unbound.handler_type().unwrap().is_none());
        assert!(TypeProvider::Unbound.signature().is_none());
    }

    #[test]
    fn test_uninitialized() {
        assert!(matches!(
            TypeProvider::Uninitialized.handler_type(),
            Err(ResolveError::Uninitialized)
        ));
    }

    #[test]
    fn test_caching_for_cached_registry() {
        let registry = Arc::new(Registry::cached(fixtures::catalog()));
        let provider = TypeProvider::for_signature(&registry, derived());
        assert!(matches!(provider, TypeProvider::Caching { .. }));

        let first = provider.handler_type().unwrap().unwrap();
        let second = provider.handler_type().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &registry.resolve(&derived()).unwrap()));
    }

    #[test]
    fn test_caching_over_reloading_registry_resolves_once() {
        let registry = Arc::new(Registry::reloading(|| -> anyhow::Result<Catalog> {
            Ok(fixtures::catalog())
        }));
        let provider = TypeProvider::Caching {
            registry,
            signature: derived(),
            cached: OnceLock::new(),
        };
        let first = provider.handler_type().unwrap().unwrap();
        let second = provider.handler_type().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_forwarding_for_reloading_registry() {
        let registry = Arc::new(Registry::reloading(|| -> anyhow::Result<Catalog> {
            Ok(fixtures::catalog())
        }));
        let provider = TypeProvider::for_signature(&registry, derived());
        assert!(matches!(provider, TypeProvider::Forwarding { .. }));
        assert_eq!(provider.signature(), Some(&derived()));

        let first = provider.handler_type().unwrap().unwrap();
        let second = provider.handler_type().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let registry = Arc::new(Registry::cached(fixtures::catalog()));
        let provider = TypeProvider::for_signature(&registry, Signature::new("fixtures::Missing"));
        assert!(provider.handler_type().is_err());
        assert!(provider.handler_type().is_err());
        assert!(format!("{provider:?}").contains("resolved: false"));
    }
}
