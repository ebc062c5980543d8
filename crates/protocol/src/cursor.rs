//! Pagination cursor
//!
//! `Cursor` is the opaque resume token returned by a paginated history read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque pagination token scoped to one channel
///
/// Cursors advance backward in time across history pages. The pipeline never
/// inspects the contents, it only hands the token back to the transport.
///
/// # Example
///
/// ```
/// use scribe_protocol::Cursor;
///
/// let cursor = Cursor::new("a1b2c3");
/// assert_eq!(cursor.as_str(), "a1b2c3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Create a new cursor
    #[inline]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the cursor token as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}
