//! Pipeline error types

use std::fmt;

use scribe_sinks::SinkError;
use scribe_transport::TransportError;
use thiserror::Error;

/// A single sink that failed during a fan-out call
#[derive(Debug)]
pub struct SinkFailure {
    /// Configured sink name
    pub sink: String,

    /// Error reported by the sink
    pub error: SinkError,
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.sink, self.error)
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport call failed (history read, listing, subscription)
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// One or more sinks failed; the call as a whole failed
    #[error("sink {operation} failed: {}", join_failures(.failures))]
    SinkFailed {
        operation: &'static str,
        failures: Vec<SinkFailure>,
    },

    /// A live stream closed without the watcher being cancelled
    #[error("live stream for {channel} ended")]
    StreamEnded { channel: String },

    /// The attachment fetcher no longer accepts jobs
    #[error("attachment queue is closed")]
    AttachmentsClosed,

    /// A background task panicked or was aborted
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Names of the sinks that failed, if this is a sink failure
    pub fn failed_sinks(&self) -> Vec<&str> {
        match self {
            Self::SinkFailed { failures, .. } => {
                failures.iter().map(|f| f.sink.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

fn join_failures(failures: &[SinkFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
