//! Error types for Praetor.
//!
//! Two families of failures exist:
//!
//! - [`ResolveError`]: configuration and instantiation failures raised while
//!   turning a [`Signature`](crate::Signature) into a
//!   [`HandlerType`](crate::HandlerType) or a handler instance. These are
//!   programmer errors and are never turned into a client-facing status by the
//!   core.
//! - [`DispatchError`]: failures of the per-request lifecycle. Errors raised by
//!   handler hooks or actions are `anyhow::Error` values; when a handler's
//!   [`on_error`](crate::Handler::on_error) hook does not absorb them they are
//!   wrapped in [`DispatchError::Unhandled`] together with the exchange so the
//!   application-wide boundary can still write a response.
//!
//! Negotiation failures (405, 406, 415) are not errors; they are reported as
//! [`NegotiationOutcome::Rejected`](crate::NegotiationOutcome::Rejected).

use http::StatusCode;
use thiserror::Error;

use crate::exchange::Exchange;

/// Result type alias using [`ResolveError`].
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Failure to resolve or instantiate a handler.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The loading context does not know the class.
    #[error("handler class not found: {class}")]
    ClassNotFound {
        /// Name of the missing class.
        class: String,
    },

    /// The parent chain of a class is broken or cyclic.
    #[error("invalid handler hierarchy for {class}: {message}")]
    InvalidHierarchy {
        /// Class whose hierarchy is invalid.
        class: String,
        /// What is wrong with it.
        message: String,
    },

    /// The class has no constructor and cannot back a handler type.
    #[error("handler class {class} is abstract")]
    AbstractHandler {
        /// Name of the abstract class.
        class: String,
    },

    /// A fresh loading context could not be produced.
    #[error("failed to load handler context: {source}")]
    ContextLoad {
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// The factory failed to create a handler instance.
    #[error("failed to instantiate handler {class}: {source}")]
    Instantiation {
        /// Class that could not be instantiated.
        class: String,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// A type provider was queried before the route tree was initialised.
    #[error("type provider used before initialisation")]
    Uninitialized,
}

impl ResolveError {
    /// Creates a class-not-found error.
    #[must_use]
    pub fn class_not_found(class: impl Into<String>) -> Self {
        Self::ClassNotFound {
            class: class.into(),
        }
    }

    /// Creates an invalid-hierarchy error.
    #[must_use]
    pub fn invalid_hierarchy(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Creates an abstract-handler error.
    #[must_use]
    pub fn abstract_handler(class: impl Into<String>) -> Self {
        Self::AbstractHandler {
            class: class.into(),
        }
    }

    /// Creates a context-load error.
    pub fn context_load(source: impl Into<anyhow::Error>) -> Self {
        Self::ContextLoad {
            source: source.into(),
        }
    }

    /// Creates an instantiation error.
    pub fn instantiation(class: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Instantiation {
            class: class.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for errors caused by the handler configuration itself.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ClassNotFound { .. }
                | Self::InvalidHierarchy { .. }
                | Self::AbstractHandler { .. }
                | Self::ContextLoad { .. }
        )
    }
}

/// Failure of the per-request dispatch lifecycle.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler instance was bound to a second exchange.
    #[error("handler {handler} is already bound to an exchange")]
    AlreadyBound {
        /// Class of the handler.
        handler: String,
    },

    /// A handler instance was processed without being bound.
    #[error("handler {handler} is not bound to an exchange")]
    NotBound {
        /// Class of the handler.
        handler: String,
    },

    /// The handler type could not be resolved or instantiated.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// An error escaped the handler's own error hook.
    #[error("unhandled error in handler {handler}: {source}")]
    Unhandled {
        /// Class of the handler.
        handler: String,
        /// The exchange, so a boundary can still write a response.
        exchange: Box<Exchange>,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Returns the HTTP status an error boundary should answer with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Takes the exchange out of an [`Unhandled`](Self::Unhandled) error.
    #[must_use]
    pub fn into_exchange(self) -> Option<Exchange> {
        match self {
            Self::Unhandled { exchange, .. } => Some(*exchange),
            _ => None,
        }
    }
}
