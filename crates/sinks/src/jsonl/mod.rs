//! JSONL Sink - newline-delimited JSON export file
//!
//! Writes one JSON object per record with the channel display name injected
//! as `channel_name`. Each line ends with the configured end-of-line sequence.
//!
//! # Output Format
//!
//! ```text
//! {"id":42,"text":"hello","sent_at":1600000000,"sender_uid":"u1","device_id":"d1","channel_name":"family#general"}
//! ```
//!
//! The file is opened once in `init` and held until `close`. A batch is a
//! single buffered write followed by a flush, so a chunk reaches the file as
//! one contiguous block.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use scribe_protocol::{Channel, ExportRecord};
use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::common::{MetricsSnapshot, SinkError, SinkMetrics};
use crate::traits::Sink;

/// Configuration for the JSONL sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlConfig {
    /// Output file
    pub path: PathBuf,

    /// Line terminator
    pub eol: String,

    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("export.jsonl"),
            eol: "\n".to_string(),
            append: false,
        }
    }
}

impl JsonlConfig {
    /// Create config writing to `path`
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Use a custom line terminator
    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Append instead of truncating
    pub fn appending(mut self) -> Self {
        self.append = true;
        self
    }
}

/// One output line: the record plus the channel it came from
#[derive(Serialize)]
struct JsonlLine<'a> {
    #[serde(flatten)]
    record: &'a ExportRecord,
    channel_name: &'a str,
}

/// JSONL file sink
pub struct JsonlSink {
    name: String,
    config: JsonlConfig,
    writer: Mutex<Option<BufWriter<File>>>,
    metrics: Arc<SinkMetrics>,
}

impl JsonlSink {
    /// Create a new JSONL sink; the file is opened by `init`
    pub fn new(name: impl Into<String>, config: JsonlConfig) -> Self {
        Self {
            name: name.into(),
            config,
            writer: Mutex::new(None),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Output file path
    #[inline]
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    /// Encode one record as a terminated line
    fn encode_line(
        &self,
        channel_name: &str,
        record: &ExportRecord,
        out: &mut Vec<u8>,
    ) -> Result<(), SinkError> {
        serde_json::to_writer(
            &mut *out,
            &JsonlLine {
                record,
                channel_name,
            },
        )?;
        out.extend_from_slice(self.config.eol.as_bytes());
        Ok(())
    }

    async fn write_bytes(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| SinkError::NotOpen(self.name.clone()))?;

        let result = match writer.write_all(bytes).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.metrics.flush();
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl Sink for JsonlSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "jsonl"
    }

    async fn init(&self) -> Result<(), SinkError> {
        if let Some(parent) = self.config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if self.config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options.open(&self.config.path).await.map_err(|e| {
            SinkError::init(format!("cannot open '{}': {e}", self.config.path.display()))
        })?;

        *self.writer.lock().await = Some(BufWriter::new(file));

        tracing::info!(
            sink = %self.name,
            path = %self.config.path.display(),
            append = self.config.append,
            "jsonl sink opened"
        );
        Ok(())
    }

    async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<(), SinkError> {
        let mut line = Vec::with_capacity(256);
        self.encode_line(&channel.display_name(), record, &mut line)?;
        self.write_bytes(&line).await?;
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
        let mut buf = Vec::with_capacity(records.len() * 256);
        for record in records {
            self.encode_line(&channel_name, record, &mut buf)?;
        }

        self.write_bytes(&buf).await?;
        self.metrics
            .batch_written(records.len() as u64, buf.len() as u64);
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        let Some(mut writer) = self.writer.lock().await.take() else {
            return Ok(());
        };
        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            records = snapshot.records_written,
            bytes = snapshot.bytes_written,
            "jsonl sink closed"
        );
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
#[path = "jsonl_test.rs"]
mod jsonl_test;
