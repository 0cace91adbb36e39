//! Handler traits.
//!
//! Two levels of handler exist:
//!
//! - [`Handler`] is the transport-level interface. It receives the response
//!   writer and the request and is what middleware wraps and what the server
//!   dispatches to.
//! - [`BusinessHandler`] is the endpoint contract. It never touches the
//!   writer; it returns a [`HandlerResult`] that the server's base wrapper
//!   turns into status, headers and body.

use crate::body::{BoxFuture, Request};
use crate::error::{ErrorKind, ResponseError};
use crate::writer::ResponseWriter;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// The transport-level handler interface.
///
/// # Example
///
/// ```
/// use logcollector_core::{BoxFuture, Handler, Request, ResponseWriter};
/// use http::StatusCode;
///
/// struct Teapot;
///
/// impl Handler for Teapot {
///     fn serve<'a>(
///         &'a self,
///         w: &'a mut dyn ResponseWriter,
///         _request: &'a mut Request,
///     ) -> BoxFuture<'a, ()> {
///         Box::pin(async move {
///             w.write_header(StatusCode::IM_A_TEAPOT);
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Serves one request by writing to `w`.
    fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, request: &'a mut Request)
        -> BoxFuture<'a, ()>;
}

/// A successful business handler result.
///
/// A `None` status is written as `200 OK`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    status: Option<StatusCode>,
    body: Bytes,
}

impl Reply {
    /// Creates a reply with an empty body and no explicit status.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a reply with the given body and no explicit status.
    #[must_use]
    pub fn body(body: impl Into<Bytes>) -> Self {
        Self {
            status: None,
            body: body.into(),
        }
    }

    /// Sets an explicit status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the explicit status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Splits the reply into status and body.
    #[must_use]
    pub fn into_parts(self) -> (Option<StatusCode>, Bytes) {
        (self.status, self.body)
    }
}

/// A failed business handler result.
///
/// A `None` status is written as `400 Bad Request`. Any body the handler
/// might have produced is discarded in favour of the error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    status: Option<StatusCode>,
    error: ResponseError,
}

impl Rejection {
    /// Creates a rejection with no explicit status.
    #[must_use]
    pub fn new(error: impl Into<ResponseError>) -> Self {
        Self {
            status: None,
            error: error.into(),
        }
    }

    /// Sets an explicit status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns the explicit status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the error envelope.
    #[must_use]
    pub fn error(&self) -> &ResponseError {
        &self.error
    }

    /// Splits the rejection into status and error.
    #[must_use]
    pub fn into_parts(self) -> (Option<StatusCode>, ResponseError) {
        (self.status, self.error)
    }
}

impl From<ResponseError> for Rejection {
    fn from(error: ResponseError) -> Self {
        Self::new(error)
    }
}

impl From<ErrorKind> for Rejection {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// The outcome of a business handler.
pub type HandlerResult = Result<Reply, Rejection>;

/// The endpoint contract.
///
/// Implementations may inspect and consume the request and may set
/// response headers (for example a custom `Content-Type`, which then takes
/// precedence over the JSON default), but all status and body writing
/// happens in the server's base wrapper.
pub trait BusinessHandler: Send + Sync + 'static {
    /// Handles a request.
    fn handle<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
        request: &'a mut Request,
    ) -> BoxFuture<'a, HandlerResult>;
}

/// A [`BusinessHandler`] backed by a closure.
///
/// Created by [`handler_fn`].
pub struct FnHandler<F> {
    func: F,
}

/// Creates a [`BusinessHandler`] from a closure.
///
/// # Example
///
/// ```
/// use logcollector_core::{handler_fn, ErrorKind, Rejection, Reply};
/// use http::StatusCode;
///
/// let handler = handler_fn(|_headers, request| {
///     Box::pin(async move {
///         if request.uri().query().is_some() {
///             return Err(Rejection::new(ErrorKind::BadRequest));
///         }
///         Ok(Reply::body("created").with_status(StatusCode::CREATED))
///     })
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F>(func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut HeaderMap, &'a mut Request) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    FnHandler { func }
}

impl<F> BusinessHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut HeaderMap, &'a mut Request) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        headers: &'a mut HeaderMap,
        request: &'a mut Request,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.func)(headers, request)
    }
}
