//! `/v1/log` served through the full server stack (CORS, router, wrapper).

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use logcollector::{log_routes, LOG_PATH};
use logcollector_server::{dispatch, RestServer, ServerConfig};
use logcollector_telemetry::{build_subscriber, LogConfig};

fn server(request_logging: bool) -> RestServer {
    let config = ServerConfig::builder()
        .http_addr("127.0.0.1:0")
        .request_logging(request_logging)
        .build();
    let mut server = RestServer::new(config);
    server.add_routes(log_routes());
    server
}

async fn body(response: logcollector_core::HttpResponse) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn post<B>(body: B) -> http::Request<B> {
    http::Request::builder()
        .method(Method::POST)
        .uri(LOG_PATH)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

#[tokio::test]
async fn test_log_message_accepted() {
    let service = server(false).service();
    let response = dispatch(&service, post(Full::new(Bytes::from_static(br#"{"message":"hello"}"#)))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(body(response).await.is_empty());
}

#[tokio::test]
async fn test_unreadable_body_is_invalid_parameter() {
    let service = server(false).service();
    let failing = Limited::new(Full::new(Bytes::from_static(br#"{"message":"hello"}"#)), 2);
    let response = dispatch(&service, post(failing)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(response).await,
        Bytes::from_static(br#"{"code":"InvalidParameter","message":"invalid parameter"}"#)
    );
}

#[tokio::test]
async fn test_not_json_is_internal_error() {
    let service = server(false).service();
    let response = dispatch(&service, post(Full::new(Bytes::from_static(b"not-json")))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body(response).await,
        Bytes::from_static(br#"{"code":"InternalError","message":"internal error"}"#)
    );
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let service = server(false).service();
    let request = http::Request::builder()
        .method(Method::GET)
        .uri(LOG_PATH)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let response = dispatch(&service, request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_debug_logging_records_message_and_request() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collector.log");
    let config = LogConfig {
        level: "debug".to_string(),
        file: Some(path.clone()),
        ..LogConfig::default()
    };
    let (subscriber, log_guard) = build_subscriber(&config).unwrap();
    let dispatch_guard = tracing::subscriber::set_default(subscriber);

    let service = server(config.is_debug()).service();
    let response = dispatch(&service, post(Full::new(Bytes::from_static(br#"{"message":"hello"}"#)))).await;
    assert_eq!(response.status(), StatusCode::OK);

    drop(dispatch_guard);
    drop(log_guard);
    let contents = std::fs::read_to_string(&path).unwrap();
    let records: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert!(records
        .iter()
        .any(|r| r["fields"]["log"] == "hello"));
    assert!(records
        .iter()
        .any(|r| r["fields"]["message"] == LOG_PATH && r["fields"]["status"] == 200));
}
