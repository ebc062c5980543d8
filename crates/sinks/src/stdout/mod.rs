//! Stdout Sink - Human-readable debug output
//!
//! Prints one line per exported record. Not intended as an archive format.
//!
//! # Example Output
//!
//! ```text
//! 2020-09-13 12:26:40 family#general #42 alice hello there
//! 2020-09-13 12:27:02 family#general #43 bob [Attachment cat.png] my cat (edited)
//! 2020-09-13 12:30:00 family#general #44 - alice added bob to the team family [system]
//! ```

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use owo_colors::{OwoColorize, Style};
use scribe_protocol::{Channel, ExportRecord};

use crate::common::{MetricsSnapshot, SinkError, SinkMetrics};
use crate::traits::Sink;

/// Configuration for stdout sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdoutConfig {
    /// Enable colored output
    pub color: bool,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

impl StdoutConfig {
    /// Create config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self { color: false }
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for terminal output
struct Styles {
    timestamp: Style,
    label: Style,
    sender: Style,
    marker: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                label: Style::new().dimmed(),
                sender: Style::new().cyan(),
                marker: Style::new().yellow(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                label: Style::new(),
                sender: Style::new(),
                marker: Style::new(),
            }
        }
    }
}

/// Stdout sink for debug output
pub struct StdoutSink {
    name: String,
    styles: Styles,
    metrics: Arc<SinkMetrics>,
}

impl StdoutSink {
    /// Create a new stdout sink
    pub fn new(name: impl Into<String>, config: StdoutConfig) -> Self {
        Self {
            name: name.into(),
            styles: Styles::new(config.color),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    fn print(&self, lines: &str) -> Result<(), SinkError> {
        let mut out = std::io::stdout().lock();
        out.write_all(lines.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Sink for StdoutSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "stdout"
    }

    async fn init(&self) -> Result<(), SinkError> {
        tracing::info!(sink = %self.name, "stdout sink starting");
        Ok(())
    }

    async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<(), SinkError> {
        let mut line = format_record(&channel.display_name(), record, &self.styles);
        line.push('\n');
        self.print(&line)?;
        self.metrics.record_written(line.len() as u64);
        Ok(())
    }

    async fn write_batch(
        &self,
        channel: &Channel,
        records: &[ExportRecord],
    ) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        let channel_name = channel.display_name();
        let mut out = String::new();
        for record in records {
            out.push_str(&format_record(&channel_name, record, &self.styles));
            out.push('\n');
        }

        self.print(&out)?;
        self.metrics
            .batch_written(records.len() as u64, out.len() as u64);
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            records = snapshot.records_written,
            bytes = snapshot.bytes_written,
            "stdout sink shutting down"
        );
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Render one record as a single line (without the trailing newline)
fn format_record(channel: &str, record: &ExportRecord, styles: &Styles) -> String {
    let ts = format_timestamp(record.sent_at);
    let id = format!("#{}", record.id);
    let sender = record.sender_username.as_deref().unwrap_or("-");
    let text = record.text.as_deref().unwrap_or("").replace('\n', " ");

    let mut line = format!(
        "{} {} {} {} {}",
        ts.style(styles.timestamp),
        channel.style(styles.label),
        id.style(styles.label),
        sender.style(styles.sender),
        text
    );

    if let Some(target) = record.reply_to {
        line.push_str(&format!(" {}", format!("(reply to #{target})").style(styles.marker)));
    }
    if record.edited {
        line.push_str(&format!(" {}", "(edited)".style(styles.marker)));
    }
    if record.system {
        line.push_str(&format!(" {}", "[system]".style(styles.marker)));
    } else if record.special {
        line.push_str(&format!(" {}", "[special]".style(styles.marker)));
    }
    if let Some(reactions) = &record.reactions {
        for (emoji, users) in reactions {
            line.push_str(&format!(" {emoji}x{}", users.len()));
        }
    }

    line
}

/// Format send time as `YYYY-MM-DD HH:MM:SS` (UTC)
fn format_timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}
