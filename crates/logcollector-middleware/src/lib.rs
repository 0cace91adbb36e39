//! # Log Collector Middleware
//!
//! Middleware pipeline implementation for the log collector REST layer.
//!
//! Every route is served by a [`Pipeline`]: an ordered list of middleware
//! stages in front of a terminal [`Handler`](logcollector_core::Handler).
//! Ordering is onion-shaped; the first stage is the outermost one, runs
//! first on the way in and last on the way out.
//!
//! ```text
//! Request → Stage 1 → Stage 2 → … → Handler
//!                                      ↓
//! Response ← Stage 1 ← Stage 2 ← … ←───┘
//! ```
//!
//! Any stage may short-circuit by writing a response and not running
//! [`Next`].
//!
//! ## Stages
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`RequestLogger`](stages::RequestLogger) | Debug log line per request with status, body and latency |
//! | [`FormParser`](stages::FormParser) | Parse URL-encoded form data, 500 on malformed input |
//! | [`CorsMiddleware`](stages::CorsMiddleware) | Cross-origin preflight and response headers |
//!
//! ## Example
//!
//! ```
//! use logcollector_middleware::{Pipeline, stages::FormParser};
//! use logcollector_core::{BoxFuture, Handler, Request, ResponseWriter};
//!
//! struct Ok200;
//!
//! impl Handler for Ok200 {
//!     fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, _r: &'a mut Request) -> BoxFuture<'a, ()> {
//!         Box::pin(async move { let _ = w.write(b"ok"); })
//!     }
//! }
//!
//! let pipeline = Pipeline::builder().stage(FormParser::new()).build(Ok200);
//! assert_eq!(pipeline.stage_names(), vec!["parse_form"]);
//! ```

#![doc(html_root_url = "https://docs.rs/logcollector-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod recorder;
pub mod stages;

// Re-export main types at crate root
pub use middleware::{BoxedMiddleware, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use recorder::StatusRecorder;
