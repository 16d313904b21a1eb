//! Handlers and the per-request lifecycle.
//!
//! A [`Handler`] is a stateful object created fresh for every request. Its
//! actions are registered on a [`HandlerClass`](crate::HandlerClass); the
//! trait itself only carries the lifecycle hooks, all of which have defaults.
//!
//! [`HandlerInstance`] drives one request through a handler:
//!
//! ```text
//! bind ─▶ check_access ─▶ negotiate ─┬─▶ reject(405 | 406 | 415)
//!                                    └─▶ init ─▶ set_caching ─▶ invoke action
//!          any error ─▶ on_error
//!          always    ─▶ exit ─▶ unbind
//! ```
//!
//! If `check_access` commits the response (for example by redirecting to a
//! login page) negotiation is skipped. If `init` commits it, the action is
//! skipped.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use http::header::{self, HeaderValue};
use http::StatusCode;

use crate::error::DispatchError;
use crate::exchange::Exchange;
use crate::handler_type::{HandlerType, NegotiationOutcome};

/// Access to a value as [`Any`], so actions can reach their concrete handler.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A request handler.
///
/// Every hook except [`exit`](Self::exit) and
/// [`set_caching`](Self::set_caching) may fail; failures are passed to
/// [`on_error`](Self::on_error).
///
/// # Example
///
/// ```
/// use praetor_core::{Exchange, Handler};
///
/// #[derive(Default)]
/// struct Account {
///     user: Option<String>,
/// }
///
/// impl Handler for Account {
///     fn check_access(&mut self, exchange: &mut Exchange) -> anyhow::Result<()> {
///         match exchange.request.headers().get("x-user") {
///             Some(user) => self.user = Some(user.to_str()?.to_string()),
///             None => exchange.response.redirect("/login"),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: AsAny + Send {
    /// Decides whether the request may proceed.
    ///
    /// Committing the response here ends processing.
    fn check_access(&mut self, exchange: &mut Exchange) -> anyhow::Result<()> {
        let _ = exchange;
        Ok(())
    }

    /// Called when no action matches; `status` is 405, 406 or 415.
    fn reject(&mut self, exchange: &mut Exchange, status: StatusCode) -> anyhow::Result<()> {
        exchange.response.send_error(status);
        Ok(())
    }

    /// Prepares the handler once an action has been negotiated.
    fn init(&mut self, exchange: &mut Exchange) -> anyhow::Result<()> {
        let _ = exchange;
        Ok(())
    }

    /// Sets caching headers. Defaults to `Cache-Control: no-cache`.
    fn set_caching(&mut self, exchange: &mut Exchange) {
        exchange
            .response
            .set_header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }

    /// Handles an error raised during processing.
    ///
    /// Returning `Ok` absorbs the error. The default passes it on to the
    /// application error boundary.
    fn on_error(&mut self, exchange: &mut Exchange, error: anyhow::Error) -> anyhow::Result<()> {
        let _ = exchange;
        Err(error)
    }

    /// Called last, whatever happened before.
    fn exit(&mut self, exchange: &mut Exchange) {
        let _ = exchange;
    }
}

/// A handler bound to its type, processing at most one exchange at a time.
pub struct HandlerInstance {
    handler: Box<dyn Handler>,
    handler_type: Arc<HandlerType>,
    exchange: Option<Exchange>,
}

impl HandlerInstance {
    pub(crate) fn new(handler: Box<dyn Handler>, handler_type: Arc<HandlerType>) -> Self {
        Self {
            handler,
            handler_type,
            exchange: None,
        }
    }

    /// Returns the handler type this instance was created from.
    pub fn handler_type(&self) -> &Arc<HandlerType> {
        &self.handler_type
    }

    /// Returns `true` while an exchange is bound.
    pub const fn is_bound(&self) -> bool {
        self.exchange.is_some()
    }

    /// Returns the concrete handler, if it is an `H`.
    pub fn downcast_mut<H: Handler>(&mut self) -> Option<&mut H> {
        self.handler.as_mut().as_any_mut().downcast_mut::<H>()
    }

    /// Binds an exchange.
    ///
    /// Fails with [`DispatchError::AlreadyBound`] if one is already bound.
    pub fn bind(&mut self, exchange: Exchange) -> Result<(), DispatchError> {
        if self.exchange.is_some() {
            return Err(DispatchError::AlreadyBound {
                handler: self.handler_type.class_name().to_string(),
            });
        }
        self.exchange = Some(exchange);
        Ok(())
    }

    /// Runs the lifecycle over the bound exchange and unbinds it.
    ///
    /// Returns the exchange on success. An error not absorbed by
    /// [`Handler::on_error`] is returned as [`DispatchError::Unhandled`],
    /// carrying the exchange.
    pub fn process(&mut self) -> Result<Exchange, DispatchError> {
        let Some(mut exchange) = self.exchange.take() else {
            return Err(DispatchError::NotBound {
                handler: self.handler_type.class_name().to_string(),
            });
        };

        let handler = self.handler.as_mut();
        tracing::debug!(
            handler = %self.handler_type.class_name(),
            method = %exchange.request.method(),
            path = %exchange.request.path(),
            "processing request"
        );

        let outcome = match run(handler, &self.handler_type, &mut exchange) {
            Ok(()) => Ok(()),
            Err(error) => handler.on_error(&mut exchange, error),
        };
        handler.exit(&mut exchange);

        match outcome {
            Ok(()) => Ok(exchange),
            Err(source) => Err(DispatchError::Unhandled {
                handler: self.handler_type.class_name().to_string(),
                exchange: Box::new(exchange),
                source,
            }),
        }
    }
}

fn run(
    handler: &mut dyn Handler,
    handler_type: &HandlerType,
    exchange: &mut Exchange,
) -> anyhow::Result<()> {
    handler.check_access(exchange)?;
    if exchange.response.is_committed() {
        return Ok(());
    }

    match handler_type.negotiate(&exchange.request) {
        NegotiationOutcome::Rejected(status) => {
            tracing::debug!(status = status.as_u16(), "no action matches request");
            handler.reject(exchange, status)?;
        }
        NegotiationOutcome::Matched {
            action,
            content_type,
        } => {
            if let Some(content_type) = content_type {
                exchange.response.set_content_type(content_type);
            }
            handler.init(exchange)?;
            handler.set_caching(exchange);
            if !exchange.response.is_committed() {
                action.invoke(handler, exchange)?;
            }
        }
    }
    Ok(())
}

impl fmt::Debug for HandlerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerInstance")
            .field("handler_type", &self.handler_type.class_name())
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}
