//! Request and response values handed to handlers.
//!
//! Praetor does not own the transport. An adapter converts its native request
//! into a [`Request`], lets the dispatcher run the handler against an
//! [`Exchange`], and writes the resulting [`Response`] back.
//!
//! # Example
//!
//! ```
//! use http::{Method, StatusCode};
//! use praetor_core::{Exchange, Request};
//!
//! let request = Request::new(Method::POST, "/orders")
//!     .with_content_type("application/json")
//!     .with_accept("text/html;q=0.5, application/json");
//!
//! assert_eq!(request.content_type().unwrap().to_string(), "application/json");
//! assert_eq!(request.accepted_types().len(), 2);
//!
//! let mut exchange = Exchange::new(request);
//! exchange.response.send_error(StatusCode::NOT_ACCEPTABLE);
//! assert!(exchange.response.is_committed());
//! ```

use bytes::{Bytes, BytesMut};
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};

use crate::media::{MediaType, MediaTypeList};

/// An incoming request as seen by handlers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn with_content_type(self, content_type: &'static str) -> Self {
        self.with_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn with_accept(self, accept: &'static str) -> Self {
        self.with_header(header::ACCEPT, HeaderValue::from_static(accept))
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP verb.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the declared content type, if present and parseable.
    pub fn content_type(&self) -> Option<MediaType> {
        let value = self.headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        match MediaType::parse(value) {
            Ok(media) => Some(media),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring request content type");
                None
            }
        }
    }

    /// Returns the accepted response types.
    ///
    /// A request without a usable `Accept` header accepts `*/*`.
    pub fn accepted_types(&self) -> MediaTypeList {
        let joined = self
            .headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        let list = MediaTypeList::parse(&joined);
        if list.is_empty() {
            MediaTypeList::any()
        } else {
            list
        }
    }
}

/// The response a handler builds.
///
/// Writing a body, sending an error or redirecting commits the response; the
/// status and content type of a committed response no longer change.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content_type: Option<MediaType>,
    body: BytesMut,
    committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content_type: None,
            body: BytesMut::new(),
            committed: false,
        }
    }
}

impl Response {
    /// Creates an empty `200 OK` response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status unless the response is committed.
    pub fn set_status(&mut self, status: StatusCode) {
        if !self.committed {
            self.status = status;
        }
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing earlier values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Returns the response content type.
    pub fn content_type(&self) -> Option<&MediaType> {
        self.content_type.as_ref()
    }

    /// Sets the response content type unless the response is committed.
    pub fn set_content_type(&mut self, media: MediaType) {
        if !self.committed {
            self.content_type = Some(media);
        }
    }

    /// Returns `true` once the status and headers are final.
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Appends to the body and commits the response.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.extend_from_slice(chunk.as_ref());
        self.committed = true;
    }

    /// Sends an error status with its canonical reason as body.
    ///
    /// Ignored if the response is already committed.
    pub fn send_error(&mut self, status: StatusCode) {
        if self.committed {
            tracing::debug!(status = %status, "response already committed, error not sent");
            return;
        }
        self.status = status;
        self.content_type = Some(MediaType::from_parts(Some("text"), Some("plain")));
        self.body.clear();
        self.body
            .extend_from_slice(status.canonical_reason().unwrap_or("Error").as_bytes());
        self.committed = true;
    }

    /// Sends a `302 Found` redirect.
    ///
    /// Ignored if the response is already committed or `location` is not a
    /// valid header value.
    pub fn redirect(&mut self, location: &str) {
        if self.committed {
            return;
        }
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.status = StatusCode::FOUND;
                self.headers.insert(header::LOCATION, value);
                self.committed = true;
            }
            Err(e) => tracing::warn!(error = %e, location, "invalid redirect location"),
        }
    }

    /// Returns the body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consumes the response and returns its body.
    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

/// A request paired with the response being built for it.
#[derive(Debug)]
pub struct Exchange {
    /// The request.
    pub request: Request,
    /// The response.
    pub response: Response,
}

impl Exchange {
    /// Creates an exchange with an empty response.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: Response::new(),
        }
    }

    /// Consumes the exchange and returns the response.
    pub fn into_response(self) -> Response {
        self.response
    }
}
