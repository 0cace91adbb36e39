//! Response writing abstraction.
//!
//! Handlers and middleware never build `http::Response` values directly.
//! They write through a [`ResponseWriter`]: set headers, write a status
//! line once, then write body bytes. This lets decorators (such as the
//! status-capturing writer used for request logging) observe exactly what
//! is sent without altering it.

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;
use std::io;

/// The HTTP response type produced by the server.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// A sink for a single HTTP response.
///
/// Semantics follow the usual transport conventions:
///
/// - Headers may be modified until the status is written.
/// - Only the first [`write_header`](ResponseWriter::write_header) call takes
///   effect.
/// - Writing body bytes before any status implies `200 OK`.
pub trait ResponseWriter: Send {
    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the response headers for modification.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Writes the response status.
    fn write_header(&mut self, status: StatusCode);

    /// Writes body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// A [`ResponseWriter`] that buffers the whole response in memory.
///
/// This is the writer the server hands to the handler chain; once the chain
/// returns, [`into_response`](BufferedResponse::into_response) produces the
/// response sent over the connection.
///
/// # Example
///
/// ```
/// use logcollector_core::{BufferedResponse, ResponseWriter};
/// use http::StatusCode;
///
/// let mut w = BufferedResponse::new();
/// w.write(b"ok").unwrap();
/// assert_eq!(w.status(), Some(StatusCode::OK));
///
/// let response = w.into_response();
/// assert_eq!(response.status(), StatusCode::OK);
/// ```
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponse {
    /// Creates an empty response buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written status, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Converts the buffer into an HTTP response.
    ///
    /// A response that never wrote a status is sent as `200 OK`.
    #[must_use]
    pub fn into_response(self) -> HttpResponse {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedResponse {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if let Some(existing) = self.status {
            tracing::warn!(
                status = existing.as_u16(),
                ignored = status.as_u16(),
                "superfluous write_header call"
            );
            return;
        }
        self.status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_default_status_is_ok() {
        let w = BufferedResponse::new();
        assert_eq!(w.status(), None);
        assert_eq!(w.into_response().status(), StatusCode::OK);
    }

    #[test]
    fn test_write_implies_ok() {
        let mut w = BufferedResponse::new();
        assert_eq!(w.write(b"hello").unwrap(), 5);
        assert_eq!(w.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_first_write_header_wins() {
        let mut w = BufferedResponse::new();
        w.write_header(StatusCode::CREATED);
        w.write_header(StatusCode::BAD_REQUEST);
        assert_eq!(w.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_explicit_status_survives_write() {
        let mut w = BufferedResponse::new();
        w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
        w.write(b"{}").unwrap();
        assert_eq!(w.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_into_response_carries_headers_and_body() {
        let mut w = BufferedResponse::new();
        w.headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());
        w.write_header(StatusCode::ACCEPTED);
        w.write(b"a").unwrap();
        w.write(b"b").unwrap();
        assert_eq!(w.body(), b"ab");

        let response = w.into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
