//! Sink configuration types
//!
//! Sinks are named instances, so several sinks of one type can coexist
//! (e.g. a full JSONL archive next to a second file on another disk).

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Container for all sink configurations
///
/// ```toml
/// [sinks.archive]
/// type = "jsonl"
/// path = "export.jsonl"
///
/// [sinks.search]
/// type = "elasticsearch"
/// url = "http://localhost:9200"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    /// Named sink instances, iterated in name order
    #[serde(flatten)]
    sinks: BTreeMap<String, SinkConfig>,
}

impl SinksConfig {
    /// Get a sink by name
    pub fn get(&self, name: &str) -> Option<&SinkConfig> {
        self.sinks.get(name)
    }

    /// Iterate over all sinks
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter()
    }

    /// Iterate over enabled sinks
    pub fn enabled(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter().filter(|(_, sink)| sink.is_enabled())
    }

    /// Get the number of configured sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if no sinks are configured
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

/// Configuration for a single sink instance
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Newline-delimited JSON file
    Jsonl(JsonlSinkConfig),

    /// Elasticsearch cluster
    Elasticsearch(ElasticsearchSinkConfig),

    /// Human-readable debug output
    Stdout(StdoutSinkConfig),
}

impl SinkConfig {
    /// Check if the sink is enabled
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Jsonl(c) => c.enabled,
            Self::Elasticsearch(c) => c.enabled,
            Self::Stdout(c) => c.enabled,
        }
    }

    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Jsonl(_) => "jsonl",
            Self::Elasticsearch(_) => "elasticsearch",
            Self::Stdout(_) => "stdout",
        }
    }
}

/// JSONL sink configuration
///
/// ```toml
/// [sinks.archive]
/// type = "jsonl"
/// path = "export.jsonl"
/// eol = "\r\n"
/// append = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JsonlSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// Output file
    /// Default: "export.jsonl"
    pub path: String,

    /// Line terminator
    /// Default: "\n"
    pub eol: String,

    /// Append instead of truncating on start
    /// Default: false
    pub append: bool,
}

impl Default for JsonlSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "export.jsonl".to_string(),
            eol: "\n".to_string(),
            append: false,
        }
    }
}

/// Elasticsearch sink configuration
///
/// `$channelname$` in `index_pattern` is replaced by the channel display name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ElasticsearchSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// Cluster URL
    /// Default: "http://localhost:9200"
    pub url: String,

    /// Default: "scribe_$channelname$"
    pub index_pattern: String,

    pub username: Option<String>,
    pub password: Option<String>,

    /// Per-request timeout
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ElasticsearchSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:9200".to_string(),
            index_pattern: "scribe_$channelname$".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Stdout sink configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StdoutSinkConfig {
    /// Default: true
    pub enabled: bool,

    /// Colored output
    /// Default: true
    pub color: bool,
}

impl Default for StdoutSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: true,
        }
    }
}
