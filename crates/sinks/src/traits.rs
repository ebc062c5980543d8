//! Sink trait definition

use async_trait::async_trait;
use scribe_protocol::{Channel, ExportRecord};

use crate::common::{MetricsSnapshot, SinkError};

/// A persistent destination for exported records
///
/// Sinks are collected into a fixed list at startup and driven concurrently by
/// the fan-out writer, so every method takes `&self`.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Configured instance name (the `[sinks.<name>]` key)
    fn name(&self) -> &str;

    /// Sink type (e.g., "jsonl")
    fn kind(&self) -> &'static str;

    /// Open files or connections
    async fn init(&self) -> Result<(), SinkError>;

    /// Write one committed live record
    async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<(), SinkError>;

    /// Write one backfill chunk
    async fn write_batch(
        &self,
        channel: &Channel,
        records: &[ExportRecord],
    ) -> Result<(), SinkError>;

    /// Flush and release resources
    async fn close(&self) -> Result<(), SinkError>;

    /// Current counters
    fn metrics(&self) -> MetricsSnapshot;
}
