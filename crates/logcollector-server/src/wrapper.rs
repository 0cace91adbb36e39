//! Base wrapper: adapts a [`BusinessHandler`] to the transport [`Handler`].
//!
//! The wrapper is the only place that writes status and body for a route.
//! Its rules:
//!
//! - `Err(rejection)`: the envelope is written; status defaults to `400`.
//! - `Ok(reply)`: the body is written verbatim; status defaults to `200`.
//! - `Content-Type: application/json` is set unless the handler already set
//!   a content type.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use logcollector_core::{
    BoxFuture, BusinessHandler, Handler, Request, ResponseError, ResponseWriter, CONTENT_TYPE_JSON,
};
use std::sync::Arc;

/// Innermost layer of every route chain.
#[derive(Clone)]
pub struct BaseWrapper {
    handler: Arc<dyn BusinessHandler>,
}

impl BaseWrapper {
    /// Wraps a business handler.
    pub fn new<H: BusinessHandler>(handler: H) -> Self {
        Self::from_shared(Arc::new(handler))
    }

    /// Wraps an already shared business handler.
    pub fn from_shared(handler: Arc<dyn BusinessHandler>) -> Self {
        Self { handler }
    }
}

impl Handler for BaseWrapper {
    fn serve<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let result = self.handler.handle(w.headers_mut(), request).await;

            if !w.headers().contains_key(CONTENT_TYPE) {
                w.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
            }

            let (status, body) = match result {
                Ok(reply) => {
                    let (status, body) = reply.into_parts();
                    (status.unwrap_or(StatusCode::OK), body)
                }
                Err(rejection) => {
                    let (status, error) = rejection.into_parts();
                    (status.unwrap_or(StatusCode::BAD_REQUEST), error.to_json_bytes())
                }
            };

            w.write_header(status);
            write_body(w, &body);
        })
    }
}

impl std::fmt::Debug for BaseWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseWrapper").finish_non_exhaustive()
    }
}

/// Writes an error envelope with the JSON content type.
pub(crate) fn write_envelope(w: &mut dyn ResponseWriter, status: StatusCode, error: &ResponseError) {
    w.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    w.write_header(status);
    write_body(w, &error.to_json_bytes());
}

fn write_body(w: &mut dyn ResponseWriter, body: &Bytes) {
    if body.is_empty() {
        return;
    }
    if let Err(e) = w.write(body) {
        tracing::error!(error = %e, "failed to write response body");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logcollector_core::{
        empty_body, handler_fn, BufferedResponse, ErrorKind, HandlerResult, Rejection, Reply,
    };
    use proptest::prelude::*;

    fn fixed(result: HandlerResult) -> BaseWrapper {
        BaseWrapper::new(handler_fn(move |_headers, _request| {
            let result = result.clone();
            Box::pin(async move { result })
        }))
    }

    fn serve(wrapper: &BaseWrapper) -> BufferedResponse {
        let mut w = BufferedResponse::new();
        let mut request = http::Request::new(empty_body());
        tokio_test::block_on(wrapper.serve(&mut w, &mut request));
        w
    }

    #[test]
    fn test_ok_defaults_to_200() {
        let w = serve(&fixed(Ok(Reply::body("hello"))));
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert_eq!(w.body(), b"hello");
        assert_eq!(w.headers().get(CONTENT_TYPE).unwrap(), CONTENT_TYPE_JSON);
    }

    #[test]
    fn test_error_defaults_to_400_and_ignores_body() {
        let w = serve(&fixed(Err(Rejection::new(ErrorKind::BadRequest))));
        assert_eq!(w.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(w.body(), br#"{"code":"BadRequest","message":"bad request"}"#);
    }

    #[test]
    fn test_explicit_error_status() {
        let rejection = Rejection::new(ResponseError::custom("Conflict", "already exists"))
            .with_status(StatusCode::CONFLICT);
        let w = serve(&fixed(Err(rejection)));
        assert_eq!(w.status(), Some(StatusCode::CONFLICT));
        assert_eq!(
            w.body(),
            br#"{"code":"Conflict","message":"already exists"}"#
        );
    }

    #[test]
    fn test_handler_content_type_wins() {
        let wrapper = BaseWrapper::new(handler_fn(|headers, _request| {
            Box::pin(async move {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                Ok(Reply::body("plain"))
            })
        }));
        let w = serve(&wrapper);
        assert_eq!(w.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(w.body(), b"plain");
    }

    #[test]
    fn test_empty_reply_writes_no_body() {
        let w = serve(&fixed(Ok(Reply::empty())));
        assert_eq!(w.status(), Some(StatusCode::OK));
        assert!(w.body().is_empty());
    }

    fn status_strategy() -> impl Strategy<Value = Option<StatusCode>> {
        prop::option::of((200u16..600).prop_map(|code| StatusCode::from_u16(code).unwrap()))
    }

    proptest! {
        #[test]
        fn prop_success_status_rule(status in status_strategy(), body in ".{0,32}") {
            let mut reply = Reply::body(body.clone());
            if let Some(status) = status {
                reply = reply.with_status(status);
            }
            let w = serve(&fixed(Ok(reply)));
            prop_assert_eq!(w.status(), Some(status.unwrap_or(StatusCode::OK)));
            prop_assert_eq!(w.body(), body.as_bytes());
        }

        #[test]
        fn prop_error_status_rule(status in status_strategy(), kind in prop::sample::select(ErrorKind::all().to_vec())) {
            let mut rejection = Rejection::new(kind);
            if let Some(status) = status {
                rejection = rejection.with_status(status);
            }
            let w = serve(&fixed(Err(rejection)));
            prop_assert_eq!(w.status(), Some(status.unwrap_or(StatusCode::BAD_REQUEST)));
            let expected = ResponseError::new(kind).to_json_bytes();
            prop_assert_eq!(w.body(), &expected[..]);
        }
    }
}
