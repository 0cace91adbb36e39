//! `POST /v1/log`: accept a JSON log message and write it to the log.

use http::{HeaderMap, Method, StatusCode};
use http_body_util::BodyExt;
use logcollector_core::{
    empty_body, BoxFuture, BusinessHandler, ErrorKind, HandlerResult, Rejection, Reply, Request,
};
use logcollector_server::Route;

use crate::model::LogMessage;

/// Path the log handler is mounted on.
pub const LOG_PATH: &str = "/v1/log";

/// Reads a [`LogMessage`] from the request body and logs it at debug level.
///
/// - unreadable body: `400` with `InvalidParameter`
/// - body that is not a log message: `500` with `InternalError`
/// - otherwise `200` with an empty body
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPost;

impl BusinessHandler for LogPost {
    fn handle<'a>(
        &'a self,
        _headers: &'a mut HeaderMap,
        request: &'a mut Request,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let body = std::mem::replace(request.body_mut(), empty_body());
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    tracing::error!(error = %e, "read from body failed");
                    return Err(Rejection::new(ErrorKind::InvalidParameter)
                        .with_status(StatusCode::BAD_REQUEST));
                }
            };

            let message: LogMessage = serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!(error = %e, "unmarshal log json failed");
                Rejection::new(ErrorKind::InternalError)
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            })?;

            tracing::debug!(log = %message.message, "log message received");
            Ok(Reply::empty().with_status(StatusCode::OK))
        })
    }
}

/// Routes served by the collector.
#[must_use]
pub fn log_routes() -> Vec<Route> {
    vec![Route::new("logPost", Method::POST, LOG_PATH).handler(LogPost)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{Full, Limited};
    use logcollector_core::full_body;

    fn request(body: logcollector_core::RequestBody) -> Request {
        http::Request::builder()
            .method(Method::POST)
            .uri(LOG_PATH)
            .body(body)
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_message() {
        let mut headers = HeaderMap::new();
        let mut req = request(full_body(r#"{"message":"hello"}"#));

        let reply = LogPost.handle(&mut headers, &mut req).await.unwrap();
        assert_eq!(reply.status(), Some(StatusCode::OK));
        assert!(reply.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let mut headers = HeaderMap::new();
        let mut req = request(full_body("not-json"));

        let rejection = LogPost.handle(&mut headers, &mut req).await.unwrap_err();
        assert_eq!(rejection.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(rejection.error().code(), "InternalError");
    }

    #[tokio::test]
    async fn test_unreadable_body() {
        let failing = Limited::new(Full::new(Bytes::from_static(b"{\"message\":\"too long\"}")), 4)
            .boxed_unsync();
        let mut headers = HeaderMap::new();
        let mut req = request(failing);

        let rejection = LogPost.handle(&mut headers, &mut req).await.unwrap_err();
        assert_eq!(rejection.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(rejection.error().code(), "InvalidParameter");
    }

    #[test]
    fn test_log_routes() {
        let routes = log_routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].name(), "logPost");
        assert_eq!(*routes[0].method(), Method::POST);
        assert_eq!(routes[0].pattern(), LOG_PATH);
        assert!(routes[0].has_handler());
    }
}
