//! Protocol error types

use thiserror::Error;

/// Errors that can occur when parsing a channel query
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Query string is empty
    #[error("empty channel query")]
    Empty,

    /// Query uses the `$mode$value` form with a mode that is not supported
    #[error("unknown channel query mode '{mode}'")]
    UnknownMode { mode: String },
}

impl QueryError {
    /// Create an unknown mode error
    #[inline]
    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        Self::UnknownMode { mode: mode.into() }
    }
}
