//! Request dispatch.
//!
//! The [`Dispatcher`] runs one request end to end: resolve the route's
//! handler type, create an instance, bind the exchange and process it. Errors
//! that escape the handler go to the application's [`ErrorBoundary`].

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::error::DispatchError;
use crate::exchange::{Exchange, Request, Response};
use crate::provider::TypeProvider;

/// Turns unhandled dispatch errors into responses.
pub trait ErrorBoundary: Send + Sync {
    /// Produces the response for `error`.
    fn on_error(&self, error: DispatchError) -> Response;
}

impl<F> ErrorBoundary for F
where
    F: Fn(DispatchError) -> Response + Send + Sync,
{
    fn on_error(&self, error: DispatchError) -> Response {
        self(error)
    }
}

/// Logs the error and answers `500 Internal Server Error`.
///
/// A response the handler already committed is passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorBoundary;

impl ErrorBoundary for DefaultErrorBoundary {
    fn on_error(&self, error: DispatchError) -> Response {
        tracing::error!(error = %error, "request failed");
        let status = error.status_code();
        let mut response = error
            .into_exchange()
            .map_or_else(Response::new, Exchange::into_response);
        response.send_error(status);
        response
    }
}

/// Runs requests against route providers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use http::{Method, StatusCode};
/// use praetor_core::{fixtures, Dispatcher, Registry, Request, Signature, TypeProvider};
///
/// let registry = Arc::new(Registry::cached(fixtures::catalog()));
/// let provider = TypeProvider::for_signature(&registry, Signature::new(fixtures::DERIVED));
///
/// let response = Dispatcher::new().dispatch(&provider, Request::new(Method::GET, "/pages"));
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body_text(), "derived:show");
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    boundary: Arc<dyn ErrorBoundary>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            boundary: Arc::new(DefaultErrorBoundary),
        }
    }
}

impl Dispatcher {
    /// Creates a dispatcher with the default error boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the error boundary.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl ErrorBoundary + 'static) -> Self {
        self.boundary = Arc::new(boundary);
        self
    }

    /// Runs `request` and always produces a response.
    pub fn dispatch(&self, provider: &TypeProvider, request: Request) -> Response {
        self.try_dispatch(provider, request)
            .unwrap_or_else(|error| self.boundary.on_error(error))
    }

    /// Runs `request`, returning errors instead of passing them to the boundary.
    ///
    /// A route without a handler answers `404 Not Found`.
    pub fn try_dispatch(
        &self,
        provider: &TypeProvider,
        request: Request,
    ) -> Result<Response, DispatchError> {
        let Some(handler_type) = provider.handler_type()? else {
            tracing::debug!(path = %request.path(), "no handler for route");
            let mut response = Response::new();
            response.send_error(StatusCode::NOT_FOUND);
            return Ok(response);
        };

        let mut instance = handler_type.create_instance()?;
        instance.bind(Exchange::new(request))?;
        Ok(instance.process()?.into_response())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
