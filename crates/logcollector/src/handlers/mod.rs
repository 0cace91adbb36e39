//! Business handlers and their route tables.

mod log;

pub use log::{log_routes, LogPost, LOG_PATH};
