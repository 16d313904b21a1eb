//! Handler classes: the registration records the registry builds from.
//!
//! A [`HandlerClass`] names a handler, its parent class, how to construct it
//! and the actions it declares. Classes form a single-inheritance hierarchy
//! rooted at [`ROOT_CLASS`]; a class without an explicit parent derives from
//! the root directly.

use std::fmt;
use std::sync::Arc;

use crate::action::ActionDecl;
use crate::error::ResolveError;
use crate::factory::Container;
use crate::handler::Handler;

/// Name of the implicit base of every class hierarchy. It has depth 0 and no
/// actions.
pub const ROOT_CLASS: &str = "praetor::Handler";

/// Builds a handler instance from the service container.
pub type Constructor =
    Arc<dyn Fn(&Container) -> anyhow::Result<Box<dyn Handler>> + Send + Sync>;

/// Erases a plain constructor.
pub fn plain_constructor<H, F>(f: F) -> Constructor
where
    H: Handler,
    F: Fn() -> H + Send + Sync + 'static,
{
    Arc::new(move |_: &Container| Ok(Box::new(f()) as Box<dyn Handler>))
}

/// Erases a constructor that reads services.
pub fn injected_constructor<H, F>(f: F) -> Constructor
where
    H: Handler,
    F: Fn(&Container) -> anyhow::Result<H> + Send + Sync + 'static,
{
    Arc::new(move |container: &Container| {
        f(container).map(|h| Box::new(h) as Box<dyn Handler>)
    })
}

/// A handler class registration.
///
/// # Example
///
/// ```
/// use praetor_core::{ActionDecl, Exchange, Handler, HandlerClass};
///
/// #[derive(Default)]
/// struct Page;
/// impl Handler for Page {}
///
/// let base = HandlerClass::new("site::Page");
/// let home = HandlerClass::new("site::Home")
///     .extends("site::Page")
///     .constructor(Page::default)
///     .action(ActionDecl::typed("render", |_: &mut Page, ex: &mut Exchange| {
///         ex.response.write("welcome");
///         Ok(())
///     }).get().produces("text/html"));
///
/// assert!(base.is_abstract());
/// assert!(home.declares("render"));
/// assert_eq!(home.parent(), Some("site::Page"));
/// ```
#[derive(Clone)]
pub struct HandlerClass {
    name: String,
    parent: Option<String>,
    constructor: Option<Constructor>,
    actions: Vec<ActionDecl>,
}

impl HandlerClass {
    /// Creates an abstract class deriving from the root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            constructor: None,
            actions: Vec::new(),
        }
    }

    /// Sets the parent class.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Makes the class concrete with a plain constructor.
    #[must_use]
    pub fn constructor<H, F>(mut self, f: F) -> Self
    where
        H: Handler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.constructor = Some(plain_constructor(f));
        self
    }

    /// Makes the class concrete with a constructor that reads services.
    #[must_use]
    pub fn injected<H, F>(mut self, f: F) -> Self
    where
        H: Handler,
        F: Fn(&Container) -> anyhow::Result<H> + Send + Sync + 'static,
    {
        self.constructor = Some(injected_constructor(f));
        self
    }

    /// Sets a type-erased constructor.
    #[must_use]
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Declares an action.
    #[must_use]
    pub fn action(mut self, action: ActionDecl) -> Self {
        self.actions.push(action);
        self
    }

    /// Returns the class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parent class name, `None` for direct root descendants.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Returns the declared actions in declaration order.
    pub fn actions(&self) -> &[ActionDecl] {
        &self.actions
    }

    /// Tests whether the class declares an action named `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name() == name)
    }

    /// Returns `true` if the class has no constructor.
    pub fn is_abstract(&self) -> bool {
        self.constructor.is_none()
    }

    /// Runs the constructor.
    pub fn instantiate(&self, services: &Container) -> Result<Box<dyn Handler>, ResolveError> {
        let constructor = self
            .constructor
            .as_ref()
            .ok_or_else(|| ResolveError::abstract_handler(&self.name))?;
        constructor(services).map_err(|e| ResolveError::instantiation(&self.name, e))
    }
}

impl fmt::Debug for HandlerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("abstract", &self.is_abstract())
            .field("actions", &self.actions.len())
            .finish()
    }
}
