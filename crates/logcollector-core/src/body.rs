//! Request and body type aliases.
//!
//! Request bodies stay streaming all the way down to business handlers so
//! that a failing body read is observable where the body is consumed.

use bytes::Bytes;
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, Empty, Full};
use std::future::Future;
use std::pin::Pin;

/// A type-erased error used for body streaming failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The streaming request body type.
///
/// Only `Send` is required of the underlying body, so connection bodies can
/// be boxed as they are.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// The HTTP request type seen by middleware and handlers.
pub type Request = http::Request<RequestBody>;

/// Creates a request body from a complete buffer.
pub fn full_body(bytes: impl Into<Bytes>) -> RequestBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Creates an empty request body.
pub fn empty_body() -> RequestBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}
