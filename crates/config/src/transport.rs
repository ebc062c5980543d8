//! Transport configuration

use std::time::Duration;

use serde::Deserialize;

/// Supported chat transports
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Keybase,
}

/// `[transport]` section
///
/// The Keybase transport talks to an already running, logged-in service.
///
/// ```toml
/// [transport]
/// type = "keybase"
/// binary = "/usr/local/bin/keybase"
/// home = "/home/alice"
/// timeout = "2m"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    #[serde(rename = "type")]
    pub kind: TransportKind,

    /// Keybase CLI binary
    /// Default: "keybase"
    pub binary: String,

    /// Alternate Keybase home directory
    pub home: Option<String>,

    /// Timeout for a single API call
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Keybase,
            binary: "keybase".to_string(),
            home: None,
            timeout: Duration::from_secs(60),
        }
    }
}
