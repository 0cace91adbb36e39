//! Form parsing stage.
//!
//! Parses the query string and, for `POST`, `PUT` and `PATCH` requests with
//! an `application/x-www-form-urlencoded` body, the body as well. The result
//! is stored in the request extensions as a [`ParsedForm`]. The body bytes
//! are put back on the request, so handlers further down can still read it.
//!
//! Malformed input short-circuits with `500` and an `InternalError`
//! envelope; the wrapped handler is not called.

use crate::middleware::{Middleware, Next};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use logcollector_core::{
    empty_body, full_body, BoxError, BoxFuture, ErrorKind, FormError, FormValues, ParsedForm,
    Request, RequestBody, ResponseError, ResponseWriter, CONTENT_TYPE_JSON,
};

/// Largest form body that will be parsed (10 MiB).
pub const MAX_FORM_BYTES: usize = 10 << 20;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Form parsing middleware.
#[derive(Debug, Clone, Copy)]
pub struct FormParser {
    max_body: usize,
}

impl FormParser {
    /// Creates a form parser with the default body limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_body: MAX_FORM_BYTES,
        }
    }

    /// Overrides the body size limit.
    #[must_use]
    pub fn with_max_body(mut self, max_body: usize) -> Self {
        self.max_body = max_body;
        self
    }

    /// Parses query and body form values, restoring the body afterwards.
    fn parse(request: &mut Request, max_body: usize) -> BoxFuture<'_, Result<ParsedForm, FormError>> {
        Box::pin(async move {
            let mut post_form = FormValues::new();

            if has_form_body(request) {
                let body = std::mem::replace(request.body_mut(), empty_body());
                let bytes = read_limited(body, max_body).await?;
                post_form.merge_encoded(&String::from_utf8_lossy(&bytes))?;
                *request.body_mut() = full_body(bytes);
            }

            let mut form = post_form.clone();
            if let Some(query) = request.uri().query() {
                form.merge_encoded(query)?;
            }

            Ok(ParsedForm { form, post_form })
        })
    }
}

impl Default for FormParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for FormParser {
    fn name(&self) -> &'static str {
        "parse_form"
    }

    fn process<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            match Self::parse(request, self.max_body).await {
                Ok(parsed) => {
                    request.extensions_mut().insert(parsed);
                    next.run(w, request).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, uri = %request.uri(), "parse form failed");
                    w.headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
                    w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
                    let envelope = ResponseError::new(ErrorKind::InternalError).to_json_bytes();
                    if let Err(e) = w.write(&envelope) {
                        tracing::error!(error = %e, "failed to write error response");
                    }
                }
            }
        })
    }
}

fn has_form_body(request: &Request) -> bool {
    let method = request.method();
    if method != Method::POST && method != Method::PUT && method != Method::PATCH {
        return false;
    }
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
}

fn read_limited(body: RequestBody, limit: usize) -> BoxFuture<'static, Result<Bytes, FormError>> {
    let collect: BoxFuture<'static, Result<http_body_util::Collected<Bytes>, BoxError>> =
        Box::pin(Limited::new(body, limit).collect());
    Box::pin(async move {
        match collect.await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                Err(FormError::TooLarge(limit))
            }
            Err(e) => Err(FormError::Body(e.to_string())),
        }
    })
}
