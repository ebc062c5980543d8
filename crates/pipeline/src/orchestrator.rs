//! Pipeline orchestrator
//!
//! Resolves the configured channel queries and processes the matching
//! channels one after another. For each channel the live watcher (when
//! enabled) is started before the backfill, so nothing sent during the
//! backfill is missed.

use std::sync::Arc;
use std::time::Duration;

use scribe_protocol::{Channel, ChannelQuery, ExportRecord};
use scribe_transport::Transport;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::alteration::AlterationResolver;
use crate::attachments::AttachmentQueue;
use crate::backfill::HistoryReader;
use crate::error::Result;
use crate::fanout::FanOutWriter;
use crate::normalize::{NormalizeOptions, Normalizer};
use crate::watcher::{LiveWatcher, WatchSummary};

/// Pipeline behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Keep watching each channel after its backfill
    pub watch: bool,

    /// Quiescence window for live messages
    pub watch_timeout: Duration,

    pub normalize: NormalizeOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            watch: false,
            watch_timeout: Duration::from_secs(20),
            normalize: NormalizeOptions::default(),
        }
    }
}

/// Backfill counters for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelSummary {
    pub events: usize,
    pub records: usize,
    pub chunks: usize,
}

/// Counters for a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Channels backfilled
    pub channels: usize,

    /// Records written during backfill
    pub records: usize,

    /// Queries that matched no channel or could not be parsed
    pub unmatched: usize,
}

/// Drives backfill and live watching for a set of channels
pub struct Pipeline<T> {
    transport: Arc<T>,
    writer: Arc<FanOutWriter>,
    attachments: Option<AttachmentQueue>,
    options: PipelineOptions,
    normalizer: Normalizer,
    watchers: JoinSet<Result<WatchSummary>>,
    cancel: CancellationToken,
}

impl<T: Transport> Pipeline<T> {
    /// Create a pipeline
    ///
    /// `attachments` is `None` when downloads are disabled.
    pub fn new(
        transport: Arc<T>,
        writer: Arc<FanOutWriter>,
        attachments: Option<AttachmentQueue>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            transport,
            writer,
            attachments,
            normalizer: Normalizer::new(options.normalize),
            options,
            watchers: JoinSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Export every channel matched by `queries`, in query order
    ///
    /// Queries that fail to parse or match no channel are logged and skipped.
    /// Transport and sink errors abort the run.
    pub async fn run(&mut self, queries: &[String]) -> Result<RunSummary> {
        let channels = self.transport.list().await?;
        tracing::info!(total = channels.len(), "listed channels");

        let mut summary = RunSummary::default();
        for raw in queries {
            let query = match raw.parse::<ChannelQuery>() {
                Ok(query) => query,
                Err(e) => {
                    tracing::warn!(query = %raw, error = %e, "invalid channel query");
                    summary.unmatched += 1;
                    continue;
                }
            };
            let Some(channel) = query.find(&channels).cloned() else {
                tracing::warn!(query = %raw, "channel not found");
                summary.unmatched += 1;
                continue;
            };

            let processed = self.process_channel(&channel).await?;
            summary.channels += 1;
            summary.records += processed.records;
        }

        tracing::info!(
            channels = summary.channels,
            records = summary.records,
            unmatched = summary.unmatched,
            watchers = self.active_watchers(),
            "backfill complete"
        );
        Ok(summary)
    }

    /// Export one channel: start its watcher if enabled, then backfill
    pub async fn process_channel(&mut self, channel: &Channel) -> Result<ChannelSummary> {
        if self.options.watch {
            let watcher = LiveWatcher::subscribe(
                self.transport.as_ref(),
                channel,
                self.options.watch_timeout,
                self.normalizer,
                Arc::clone(&self.writer),
                self.attachments.clone(),
            )
            .await?;
            self.watchers.spawn(watcher.run(self.cancel.child_token()));
        }

        let mut reader = HistoryReader::new(Arc::clone(&self.transport), channel.clone());
        let mut resolver = AlterationResolver::new(self.normalizer);
        let mut summary = ChannelSummary::default();

        while let Some(chunk) = reader.next_chunk().await? {
            let records: Vec<ExportRecord> =
                chunk.iter().filter_map(|event| resolver.observe(event)).collect();
            tracing::info!(
                channel = %channel,
                events = chunk.len(),
                records = records.len(),
                "new chunk"
            );

            self.writer.write_batch(channel, &records).await?;
            self.queue_attachments(channel, &records);

            summary.events += chunk.len();
            summary.records += records.len();
            summary.chunks += 1;
        }

        Ok(summary)
    }

    fn queue_attachments(&self, channel: &Channel, records: &[ExportRecord]) {
        let Some(queue) = &self.attachments else {
            return;
        };
        for record in records.iter().filter(|r| r.has_attachment()) {
            if let Err(e) = queue.submit(channel, record) {
                tracing::warn!(channel = %channel, id = record.id, error = %e, "attachment not queued");
            }
        }
    }

    /// Number of live watchers still running
    pub fn active_watchers(&self) -> usize {
        self.watchers.len()
    }

    /// Wait until every watcher has stopped
    ///
    /// Watchers only stop on their own by failing, so this returns early with
    /// the first watcher error (a sink failure or a closed live stream).
    pub async fn wait_watchers(&mut self) -> Result<()> {
        while let Some(joined) = self.watchers.join_next().await {
            joined??;
        }
        Ok(())
    }

    /// Cancel the watchers and wait for them to stop
    ///
    /// Pending live records are discarded. Returns the first watcher error,
    /// after every watcher has stopped.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancel.cancel();
        let mut first_error = None;
        while let Some(joined) = self.watchers.join_next().await {
            let error = match joined {
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => e,
                Err(e) => e.into(),
            };
            if first_error.is_none() {
                first_error = Some(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Token cancelled by `shutdown`
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
