//! Status-capturing response writer.
//!
//! [`StatusRecorder`] sits between a stage and the real writer. It forwards
//! every call unchanged and keeps a copy of the status and body so the
//! request logger can report them after the handler returns.

use bytes::BytesMut;
use http::{HeaderMap, StatusCode};
use logcollector_core::ResponseWriter;
use std::io;

/// A [`ResponseWriter`] decorator that records what passes through it.
///
/// The body copy doubles response memory, so it is only installed when
/// debug request logging is enabled.
///
/// # Example
///
/// ```
/// use logcollector_core::{BufferedResponse, ResponseWriter};
/// use logcollector_middleware::StatusRecorder;
/// use http::StatusCode;
///
/// let mut inner = BufferedResponse::new();
/// let mut recorder = StatusRecorder::new(&mut inner);
/// recorder.write_header(StatusCode::CREATED);
/// recorder.write(b"ok").unwrap();
///
/// assert_eq!(recorder.status_code(), 201);
/// assert_eq!(recorder.body(), b"ok");
/// ```
pub struct StatusRecorder<'w> {
    inner: &'w mut dyn ResponseWriter,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl<'w> StatusRecorder<'w> {
    /// Wraps `inner`.
    pub fn new(inner: &'w mut dyn ResponseWriter) -> Self {
        Self {
            inner,
            status: None,
            body: BytesMut::new(),
        }
    }

    /// Returns the recorded status, if one was written.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the recorded status as a number, `0` if none was written.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.map_or(0, |s| s.as_u16())
    }

    /// Returns every body byte written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseWriter for StatusRecorder<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self.inner.write_header(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        self.inner.write(buf)
    }
}

impl std::fmt::Debug for StatusRecorder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRecorder")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}
