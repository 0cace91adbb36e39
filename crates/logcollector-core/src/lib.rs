//! # Log Collector Core
//!
//! Core types and traits for the log collector REST layer.
//!
//! This crate provides the foundational types shared by the middleware,
//! server and business handler crates:
//!
//! - [`ResponseError`] / [`ErrorKind`] - The `{"code", "message"}` error envelope
//! - [`BusinessHandler`] - The three-part endpoint contract (body, status, error)
//! - [`Handler`] - The transport-level handler interface
//! - [`ResponseWriter`] / [`BufferedResponse`] - Response writing abstraction
//! - [`ParsedForm`] - Form-data container attached to requests

#![doc(html_root_url = "https://docs.rs/logcollector-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod error;
pub mod form;
mod handler;
mod writer;

pub use body::{empty_body, full_body, BoxError, BoxFuture, Request, RequestBody};
pub use error::{ErrorKind, ResponseError};
pub use form::{FormError, FormValues, ParsedForm};
pub use handler::{handler_fn, BusinessHandler, FnHandler, Handler, HandlerResult, Rejection, Reply};
pub use writer::{BufferedResponse, HttpResponse, ResponseWriter};

/// The `Content-Type` value used for every JSON envelope and as the default
/// content type for business handler responses.
pub const CONTENT_TYPE_JSON: &str = "application/json";
