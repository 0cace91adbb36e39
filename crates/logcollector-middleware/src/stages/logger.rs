//! Debug request logging stage.
//!
//! Emits one `debug` record per request after the rest of the chain has
//! finished. The writer handed downstream is a [`StatusRecorder`], so the
//! record carries the status and body exactly as the client receives them.

use crate::middleware::{Middleware, Next};
use crate::recorder::StatusRecorder;
use logcollector_core::{BoxFuture, ParsedForm, Request, ResponseWriter};
use std::time::Instant;

/// Request logging middleware.
///
/// Only installed when the process runs at debug level; the decision is made
/// once, at route registration.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger;

impl RequestLogger {
    /// Creates a new request logger.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for RequestLogger {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    fn process<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let start = Instant::now();
            let mut recorder = StatusRecorder::new(w);

            next.run(&mut recorder, request).await;

            let latency = start.elapsed();
            let form = request
                .extensions()
                .get::<ParsedForm>()
                .map(|parsed| parsed.post_form.encode())
                .unwrap_or_default();

            tracing::debug!(
                status = recorder.status_code(),
                response = %String::from_utf8_lossy(recorder.body()),
                method = %request.method(),
                path = request.uri().path(),
                query = request.uri().query().unwrap_or_default(),
                form = %form,
                latency = ?latency,
                "{}",
                request.uri()
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::stages::FormParser;
    use http::StatusCode;
    use logcollector_core::{full_body, BufferedResponse, Handler};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn subscriber(capture: &Capture) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(capture.clone())
            .with_ansi(false)
            .finish()
    }

    struct Created;

    impl Handler for Created {
        fn serve<'a>(
            &'a self,
            w: &'a mut dyn ResponseWriter,
            _request: &'a mut Request,
        ) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                w.write_header(StatusCode::CREATED);
                let _ = w.write(b"ok");
            })
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_logs_status_and_body_without_altering_response() {
        let capture = Capture::default();
        let _guard = tracing::subscriber::set_default(subscriber(&capture));

        let pipeline = Pipeline::builder().stage(RequestLogger::new()).build(Created);
        let mut w = BufferedResponse::new();
        let mut request = http::Request::builder()
            .uri("/items?page=2")
            .body(full_body(""))
            .unwrap();
        pipeline.serve(&mut w, &mut request).await;

        assert_eq!(w.status(), Some(StatusCode::CREATED));
        assert_eq!(w.body(), b"ok");

        let logged = capture.contents();
        assert!(logged.contains("/items?page=2"), "{logged}");
        assert!(logged.contains("status=201"), "{logged}");
        assert!(logged.contains("response=ok"), "{logged}");
        assert!(logged.contains("path=\"/items\""), "{logged}");
        assert!(logged.contains("latency="), "{logged}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_logs_parsed_post_form() {
        let capture = Capture::default();
        let _guard = tracing::subscriber::set_default(subscriber(&capture));

        let pipeline = Pipeline::builder()
            .stage(RequestLogger::new())
            .stage(FormParser::new())
            .build(Created);
        let mut w = BufferedResponse::new();
        let mut request = http::Request::builder()
            .method("POST")
            .uri("/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(full_body("b=2&a=1"))
            .unwrap();
        pipeline.serve(&mut w, &mut request).await;

        let logged = capture.contents();
        assert!(logged.contains("form=a=1&b=2"), "{logged}");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_silent_above_debug() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(capture.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let pipeline = Pipeline::builder().stage(RequestLogger::new()).build(Created);
        let mut w = BufferedResponse::new();
        let mut request = http::Request::new(full_body(""));
        pipeline.serve(&mut w, &mut request).await;

        assert!(capture.contents().is_empty());
        assert_eq!(w.status(), Some(StatusCode::CREATED));
    }
}
