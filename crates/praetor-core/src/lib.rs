//! # Praetor Core
//!
//! Handler resolution, action negotiation and the dispatch lifecycle.
//!
//! This crate decides, for a request's verb, content type and accepted
//! response types, which action on which handler runs and which media type it
//! produces, or that the request is rejected with 405, 406 or 415.
//!
//! - [`Signature`] - Class name plus optional method filter identifying a handler type
//! - [`HandlerClass`] / [`ActionDecl`] - Explicit registration of handlers and their actions
//! - [`Catalog`] / [`LoadingContext`] / [`ContextLoader`] - Class lookup, reloadable on demand
//! - [`ActionTable`] - Inherited plus own actions in negotiation order
//! - [`HandlerType`] / [`NegotiationOutcome`] - Verb and media type negotiation
//! - [`Registry`] - Cached or reloading signature → handler type resolution
//! - [`TypeProvider`] / [`Resource`] - Per-route access to handler types
//! - [`Handler`] / [`HandlerInstance`] - Lifecycle hooks and per-request processing
//! - [`Dispatcher`] / [`ErrorBoundary`] - End-to-end dispatch with an application error boundary
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use http::{Method, StatusCode};
//! use praetor_core::{
//!     ActionDecl, Catalog, Dispatcher, Exchange, Handler, HandlerClass, Registry, Request,
//!     Signature, TypeProvider,
//! };
//!
//! #[derive(Default)]
//! struct Greeter;
//! impl Handler for Greeter {}
//!
//! let catalog = Catalog::new().with(
//!     HandlerClass::new("app::Greeter")
//!         .constructor(Greeter::default)
//!         .action(
//!             ActionDecl::typed("hello", |_: &mut Greeter, ex: &mut Exchange| {
//!                 ex.response.write("hello");
//!                 Ok(())
//!             })
//!             .get()
//!             .produces("text/plain"),
//!         ),
//! );
//!
//! let registry = Arc::new(Registry::cached(catalog));
//! let provider = TypeProvider::for_signature(&registry, Signature::new("app::Greeter"));
//! let dispatcher = Dispatcher::new();
//!
//! let ok = dispatcher.dispatch(&provider, Request::new(Method::GET, "/"));
//! assert_eq!(ok.body_text(), "hello");
//!
//! let rejected = dispatcher.dispatch(&provider, Request::new(Method::PUT, "/"));
//! assert_eq!(rejected.status(), StatusCode::METHOD_NOT_ALLOWED);
//! ```

#![doc(html_root_url = "https://docs.rs/praetor-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod catalog;
mod class;
mod dispatch;
mod error;
mod exchange;
pub mod factory;
pub mod fixtures;
mod handler;
mod handler_type;
pub mod media;
mod provider;
mod registry;
mod resource;
mod signature;
mod table;

pub use action::{ActionDecl, ActionDescriptor, Invoker};
pub use catalog::{Catalog, ContextLoader, LoadingContext};
pub use class::{
    injected_constructor, plain_constructor, Constructor, HandlerClass, ROOT_CLASS,
};
pub use dispatch::{DefaultErrorBoundary, Dispatcher, ErrorBoundary};
pub use error::{DispatchError, ResolveError, ResolveResult};
pub use exchange::{Exchange, Request, Response};
pub use factory::{Container, DefaultFactory, HandlerFactory, InjectingFactory};
pub use handler::{AsAny, Handler, HandlerInstance};
pub use handler_type::{HandlerType, NegotiationOutcome};
pub use media::{ContentNegotiator, MediaType, MediaTypeList, QualityNegotiator};
pub use provider::TypeProvider;
pub use registry::{CachedRegistry, Registry, RegistryBuilder, ReloadingRegistry};
pub use resource::Resource;
pub use signature::{Signature, SEPARATOR};
pub use table::ActionTable;
