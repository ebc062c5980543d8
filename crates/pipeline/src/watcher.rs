//! Live watcher
//!
//! Follows one channel's live stream after subscription. Edits and deletes
//! mutate the watch buffer; every other event is normalized and held for the
//! quiescence window. Records whose window elapsed are written to the sinks
//! one at a time.
//!
//! Subscription errors are logged and the watcher keeps going. A sink failure
//! ends the watcher with an error, and so does the stream closing on its own
//! (after pending records are flushed). On cancellation, pending records are
//! discarded.

use std::sync::Arc;
use std::time::Duration;

use scribe_protocol::{Channel, EventContent, ExportRecord, RawEvent};
use scribe_transport::{LiveItem, Subscription, Transport};
use tokio_util::sync::CancellationToken;

use crate::attachments::AttachmentQueue;
use crate::error::{PipelineError, Result};
use crate::fanout::FanOutWriter;
use crate::normalize::Normalizer;
use crate::watch_buffer::WatchBuffer;

/// Counters reported when a watcher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Live events received
    pub received: u64,

    /// Records written to the sinks
    pub committed: u64,

    /// Pending records dropped on shutdown
    pub discarded: u64,
}

/// Watcher for one channel, subscribed and ready to run
pub struct LiveWatcher {
    channel: Channel,
    subscription: Subscription,
    buffer: WatchBuffer,
    normalizer: Normalizer,
    writer: Arc<FanOutWriter>,
    attachments: Option<AttachmentQueue>,
    summary: WatchSummary,
}

impl LiveWatcher {
    /// Register a live subscription for `channel`
    ///
    /// Returns once the transport has registered the subscription; events
    /// sent after this point are observed by `run`.
    pub async fn subscribe<T: Transport>(
        transport: &T,
        channel: &Channel,
        timeout: Duration,
        normalizer: Normalizer,
        writer: Arc<FanOutWriter>,
        attachments: Option<AttachmentQueue>,
    ) -> Result<Self> {
        let subscription = transport.subscribe(channel).await?;
        tracing::info!(channel = %channel, "watching for new messages");

        Ok(Self {
            channel: channel.clone(),
            subscription,
            buffer: WatchBuffer::new(timeout),
            normalizer,
            writer,
            attachments,
            summary: WatchSummary::default(),
        })
    }

    /// Process live events until cancelled
    ///
    /// When the stream ends, records still pending are committed once their
    /// window elapses, then `PipelineError::StreamEnded` is returned.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<WatchSummary> {
        let mut live = true;

        loop {
            if !live && self.buffer.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    let discarded = self.buffer.clear();
                    if discarded > 0 {
                        tracing::warn!(
                            channel = %self.channel,
                            discarded,
                            "discarding pending live messages"
                        );
                    }
                    self.summary.discarded += discarded as u64;
                    break;
                }

                Some(record) = self.buffer.next_commit(), if !self.buffer.is_empty() => {
                    self.commit(record).await?;
                }

                item = self.subscription.next(), if live => match item {
                    Some(LiveItem::Event(event)) => self.observe(event),
                    Some(LiveItem::Error(e)) => {
                        tracing::error!(channel = %self.channel, error = %e, "live stream error");
                    }
                    None => {
                        tracing::error!(channel = %self.channel, "live stream ended");
                        live = false;
                    }
                },
            }
        }

        tracing::info!(
            channel = %self.channel,
            received = self.summary.received,
            committed = self.summary.committed,
            "watcher stopped"
        );
        if live {
            Ok(self.summary)
        } else {
            Err(PipelineError::StreamEnded {
                channel: self.channel.to_string(),
            })
        }
    }

    fn observe(&mut self, event: RawEvent) {
        self.summary.received += 1;
        tracing::debug!(channel = %self.channel, id = event.id, kind = event.kind(), "live event");

        match event.content {
            EventContent::Edit(edit) => {
                self.buffer.apply_edit(
                    edit.target,
                    edit.body,
                    event.sender.device_id,
                    event.sender.device_name,
                );
            }
            EventContent::Delete(delete) => {
                self.buffer.apply_delete(&delete.targets);
            }
            _ => {
                if let Some(record) = self.normalizer.normalize(&event) {
                    self.buffer.hold(record);
                }
            }
        }
    }

    async fn commit(&mut self, record: ExportRecord) -> Result<()> {
        self.writer.write(&self.channel, &record).await?;
        self.summary.committed += 1;
        tracing::debug!(channel = %self.channel, id = record.id, "live message exported");

        if let Some(queue) = &self.attachments
            && let Err(e) = queue.submit(&self.channel, &record)
        {
            tracing::warn!(channel = %self.channel, id = record.id, error = %e, "attachment not queued");
        }
        Ok(())
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}
