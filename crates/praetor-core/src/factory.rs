//! Handler factories and dependency injection.
//!
//! A [`HandlerType`](crate::HandlerType) creates one handler instance per
//! request through a [`HandlerFactory`]. The default factory runs the class
//! constructor with an empty [`Container`]; [`InjectingFactory`] hands
//! constructors a container of shared services registered at startup.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use praetor_core::factory::{Container, HandlerFactory, InjectingFactory};
//! use praetor_core::{Handler, HandlerClass};
//!
//! struct Clock(u64);
//! struct Uptime { started: u64 }
//! impl Handler for Uptime {}
//!
//! let mut services = Container::new();
//! services.register(Arc::new(Clock(42)));
//!
//! let class = HandlerClass::new("app::Uptime").injected(|c: &Container| {
//!     let clock: Arc<Clock> = c.resolve_required()?;
//!     Ok(Uptime { started: clock.0 })
//! });
//!
//! let factory = InjectingFactory::new(services);
//! assert!(factory.create(&class).is_ok());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::class::HandlerClass;
use crate::error::ResolveError;
use crate::handler::Handler;

/// A service the container could not supply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot inject {type_name}: {reason}")]
pub struct InjectionError {
    /// Type that was requested.
    pub type_name: &'static str,
    /// Why it could not be supplied.
    pub reason: String,
}

impl InjectionError {
    /// Creates an error for a service that was never registered.
    #[must_use]
    pub fn not_registered<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "service not registered".to_string(),
        }
    }
}

/// Shared services keyed by type.
///
/// Services are registered once at startup, then read by handler
/// constructors on every request.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, replacing any earlier service of the same type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Registers a service and returns the container.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, service: T) -> Self {
        self.register(Arc::new(service));
        self
    }

    /// Looks up a service.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Looks up a service that must be present.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.resolve().ok_or_else(InjectionError::not_registered::<T>)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .finish()
    }
}

fn empty_container() -> &'static Container {
    static EMPTY: OnceLock<Container> = OnceLock::new();
    EMPTY.get_or_init(Container::new)
}

/// Creates handler instances for a class.
pub trait HandlerFactory: Send + Sync {
    /// Creates a fresh instance of `class`.
    fn create(&self, class: &HandlerClass) -> Result<Box<dyn Handler>, ResolveError>;
}

impl<F> HandlerFactory for F
where
    F: Fn(&HandlerClass) -> Result<Box<dyn Handler>, ResolveError> + Send + Sync,
{
    fn create(&self, class: &HandlerClass) -> Result<Box<dyn Handler>, ResolveError> {
        self(class)
    }
}

/// Runs the class constructor without services.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl HandlerFactory for DefaultFactory {
    fn create(&self, class: &HandlerClass) -> Result<Box<dyn Handler>, ResolveError> {
        class.instantiate(empty_container())
    }
}

/// Runs the class constructor with a shared service container.
#[derive(Debug, Clone)]
pub struct InjectingFactory {
    services: Arc<Container>,
}

impl InjectingFactory {
    /// Creates a factory over `services`.
    #[must_use]
    pub fn new(services: Container) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    /// Returns the service container.
    pub fn services(&self) -> &Container {
        &self.services
    }
}

impl HandlerFactory for InjectingFactory {
    fn create(&self, class: &HandlerClass) -> Result<Box<dyn Handler>, ResolveError> {
        class.instantiate(&self.services)
    }
}
