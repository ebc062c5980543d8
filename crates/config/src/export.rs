//! Export behavior sections
//!
//! `[watcher]`, `[attachments]` and `[message_types]` shape what the pipeline
//! exports and when.

use std::time::Duration;

use serde::Deserialize;

/// `[watcher]` - live watching after backfill
///
/// ```toml
/// [watcher]
/// enabled = true
/// timeout = "20s"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    /// Keep watching channels for new messages
    /// Default: false
    pub enabled: bool,

    /// Quiescence window before a live message is exported
    /// Default: 20s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: Duration::from_secs(20),
        }
    }
}

/// `[attachments]` - attachment download and text stubs
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AttachmentsConfig {
    /// Download attachment files
    /// Default: false
    pub download: bool,

    /// Root directory for downloaded files
    /// Default: "attachments"
    pub directory: String,

    /// Prefix attachment text with `[Attachment <filename>]`
    /// Default: true
    pub stub: bool,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self {
            download: false,
            directory: "attachments".to_string(),
            stub: true,
        }
    }
}

/// `[message_types]` - which optional message kinds are exported
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MessageTypesConfig {
    /// Attach reaction maps to records
    pub reactions: bool,

    /// Export reaction events as records of their own
    pub reaction_messages: bool,

    /// Export team/channel system notices
    pub system_messages: bool,

    /// Export channel headline changes
    pub headline: bool,
}

impl Default for MessageTypesConfig {
    fn default() -> Self {
        Self {
            reactions: true,
            reaction_messages: true,
            system_messages: true,
            headline: true,
        }
    }
}
