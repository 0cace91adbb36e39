//! Payloads accepted by the collector.

use serde::{Deserialize, Serialize};

/// A log message posted to `/v1/log`.
///
/// A missing `message` field is accepted as an empty message; unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// The text to log.
    #[serde(default)]
    pub message: String,
}
