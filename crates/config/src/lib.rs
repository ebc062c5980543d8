//! Scribe Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the sinks need to be spelled out; everything else has a default.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use scribe_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[sinks.out]\ntype = \"stdout\"").unwrap();
//! assert!(config.chats.is_empty());
//! ```
//!
//! # Example Config
//!
//! ```toml
//! # Channels to export: `you,them`, `team#topic` or `$id$<conversation id>`
//! chats = ["alice,bob", "family#general"]
//!
//! [watcher]
//! enabled = true
//! timeout = "20s"
//!
//! [attachments]
//! download = true
//! directory = "attachments"
//!
//! [sinks.archive]
//! type = "jsonl"
//! path = "export.jsonl"
//! ```

mod error;
mod export;
mod logging;
mod sinks;
mod transport;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use export::{AttachmentsConfig, MessageTypesConfig, WatcherConfig};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use sinks::{
    ElasticsearchSinkConfig, JsonlSinkConfig, SinkConfig, SinksConfig, StdoutSinkConfig,
};
pub use transport::{TransportConfig, TransportKind};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel queries, exported in order
    pub chats: Vec<String>,

    /// Logging configuration
    pub log: LogConfig,

    /// Live watching after backfill
    pub watcher: WatcherConfig,

    /// Attachment download and stubs
    pub attachments: AttachmentsConfig,

    /// Optional message kinds
    pub message_types: MessageTypesConfig,

    /// Chat transport
    pub transport: TransportConfig,

    /// Output sinks
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Get list of enabled sink names
    pub fn enabled_sinks(&self) -> Vec<String> {
        self.sinks.enabled().map(|(name, _)| name.clone()).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
