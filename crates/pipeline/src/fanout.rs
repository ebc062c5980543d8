//! Fan-out writer
//!
//! Replicates every write to all configured sinks concurrently. A call
//! succeeds only when every sink succeeds; any failure fails the whole call
//! and names the sinks that failed. There is no partial success and no retry.

use futures::future::join_all;
use scribe_protocol::{Channel, ExportRecord};
use scribe_sinks::{Sink, SinkError};

use crate::error::{PipelineError, Result, SinkFailure};

/// Fixed set of sinks driven as one
pub struct FanOutWriter {
    sinks: Vec<Box<dyn Sink>>,
}

impl FanOutWriter {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Open every sink
    pub async fn init(&self) -> Result<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.init())).await;
        self.collect("init", results)?;
        tracing::info!(sinks = ?self.sink_names(), "sinks initialized");
        Ok(())
    }

    /// Write one committed live record to every sink
    pub async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.write(channel, record))).await;
        self.collect("write", results)
    }

    /// Write one backfill chunk to every sink
    ///
    /// An empty chunk is a no-op.
    pub async fn write_batch(&self, channel: &Channel, records: &[ExportRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let results = join_all(
            self.sinks
                .iter()
                .map(|sink| sink.write_batch(channel, records)),
        )
        .await;
        self.collect("write_batch", results)
    }

    /// Close every sink and log its counters
    ///
    /// Every sink is closed even if some fail.
    pub async fn close(&self) -> Result<()> {
        let results = join_all(self.sinks.iter().map(|sink| sink.close())).await;
        for sink in &self.sinks {
            let m = sink.metrics();
            tracing::info!(
                sink = sink.name(),
                kind = sink.kind(),
                records = m.records_written,
                batches = m.batches_written,
                bytes = m.bytes_written,
                errors = m.write_errors,
                "sink closed"
            );
        }
        self.collect("close", results)
    }

    /// Configured sink names, in dispatch order
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn collect(
        &self,
        operation: &'static str,
        results: Vec<std::result::Result<(), SinkError>>,
    ) -> Result<()> {
        let failures: Vec<SinkFailure> = self
            .sinks
            .iter()
            .zip(results)
            .filter_map(|(sink, result)| {
                let error = result.err()?;
                tracing::error!(sink = sink.name(), operation, error = %error, "sink failed");
                Some(SinkFailure {
                    sink: sink.name().to_string(),
                    error,
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::SinkFailed {
                operation,
                failures,
            })
        }
    }
}

impl std::fmt::Debug for FanOutWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanOutWriter")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
