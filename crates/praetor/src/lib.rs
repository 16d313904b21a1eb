//! # Praetor
//!
//! **Handler resolution and content negotiation for request dispatch**
//!
//! Praetor decides, for each request, which action on which handler runs and
//! which media type it produces:
//!
//! - **Inheritance-aware action tables** – actions declared on a handler
//!   class hierarchy are merged, overrides replace what they redeclare
//! - **Negotiation** – verb, request content type and `Accept` select the
//!   action, or the request is rejected with 405, 415 or 406
//! - **Two registry strategies** – memoized handler types in production, a
//!   fresh manifest read per resolution during development
//! - **A fixed lifecycle** – access check, negotiation, init, caching
//!   headers, action, error hook, exit
//!
//! ## Quick Start
//!
//! ```
//! use http::Method;
//! use praetor::prelude::*;
//!
//! #[derive(Default)]
//! struct Status;
//! impl Handler for Status {}
//!
//! let catalog = Catalog::new().with(
//!     HandlerClass::new("app::Status")
//!         .constructor(Status::default)
//!         .action(
//!             ActionDecl::typed("show", |_: &mut Status, ex: &mut Exchange| {
//!                 ex.response.write("ok");
//!                 Ok(())
//!             })
//!             .get()
//!             .produces("text/plain"),
//!         ),
//! );
//!
//! let app = App::builder()
//!     .catalog(catalog)
//!     .route(Resource::new("status").with_signature(Signature::new("app::Status")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(app.handle(Request::new(Method::GET, "/status")).body_text(), "ok");
//! ```
//!
//! ## Dispatch
//!
//! ```text
//! Request → Resource::find → TypeProvider → Registry → HandlerType
//!                                                          ↓
//! Response ← exit ← action ← init/caching ← negotiate ← check_access
//! ```

#![doc(html_root_url = "https://docs.rs/praetor/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::{App, AppBuilder};
pub use error::AppError;

// Re-export core types
pub use praetor_core as core;

// Re-export configuration types
pub use praetor_config as config;

// Re-export logging setup
pub use praetor_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use praetor::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, AppBuilder, AppError};

    pub use praetor_core::{
        fixtures, ActionDecl, Catalog, Container, ContentNegotiator, DispatchError, Dispatcher,
        ErrorBoundary, Exchange, Handler, HandlerClass, HandlerType, InjectingFactory, Invoker,
        MediaType, MediaTypeList, NegotiationOutcome, QualityNegotiator, Registry, Request,
        ResolveError, Resource, Response, Signature, TypeProvider,
    };

    pub use praetor_config::{Bindings, ConfigLoader, ManifestLoader, PraetorConfig};
}
