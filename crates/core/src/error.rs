use std::path::PathBuf;

/// Failure kinds of a report run.
///
/// Everything except [`ReportError::Mail`] is fatal: the run aborts and no
/// report is written. A mail failure happens after the file exists, so the
/// caller treats it as a partial success.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Device registry query failed: {0}")]
    Registry(String),

    #[error("Query failed for device {udid}: {message}")]
    Query { udid: String, message: String },

    #[error("Batch timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Failed to write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Mail delivery failed: {0}")]
    Mail(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Device identifier the error is tagged with, if any.
    pub fn udid(&self) -> Option<&str> {
        match self {
            ReportError::Query { udid, .. } => Some(udid),
            _ => None,
        }
    }
}
