//! Error types for transports

use thiserror::Error;

/// Errors that can occur during transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to launch the transport process
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Transport process exited unsuccessfully
    #[error("'{command}' failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// The API answered with an error object
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Request did not complete in time
    #[error("'{method}' timed out after {secs}s")]
    Timeout { method: String, secs: u64 },

    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Download failed for a specific message
    #[error("download of message {message_id} failed: {reason}")]
    Download { message_id: u64, reason: String },

    /// Live subscription ended
    #[error("subscription to '{channel}' closed")]
    SubscriptionClosed { channel: String },

    /// Transport was already closed
    #[error("transport is closed")]
    Closed,
}

impl TransportError {
    /// Create an API error
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self::Api {
            code,
            message: message.into(),
        }
    }

    /// Create a download error
    pub fn download(message_id: u64, reason: impl Into<String>) -> Self {
        Self::Download {
            message_id,
            reason: reason.into(),
        }
    }
}
