//! Attachment fetcher
//!
//! Downloads run on one background worker fed by an unbounded queue, so the
//! record stream never waits on file transfers. Jobs are processed one at a
//! time in enqueue order. A job whose destination already exists is skipped,
//! which makes re-running an export cheap.
//!
//! # Shutdown
//!
//! `drain` stops intake, lets the worker finish every queued job and returns
//! once it has stopped. Jobs enqueued after that are rejected.
//!
//! # Layout
//!
//! ```text
//! <directory>/<channel display name, '#' -> '__'>/<message id>_<filename>
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scribe_protocol::{Channel, ExportRecord, MessageId};
use scribe_transport::{Transport, TransportError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};

/// One file to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentJob {
    pub channel: Channel,
    pub message_id: MessageId,
    pub destination: PathBuf,
}

impl AttachmentJob {
    /// Job for an attachment-bearing record, `None` for any other record
    pub fn for_record(directory: &Path, channel: &Channel, record: &ExportRecord) -> Option<Self> {
        let attachment = record.attachment.as_ref()?;
        Some(Self {
            channel: channel.clone(),
            message_id: record.id,
            destination: destination(directory, channel, record.id, &attachment.filename),
        })
    }
}

/// Destination of an attachment file
///
/// Only the final component of `filename` is used.
pub fn destination(
    directory: &Path,
    channel: &Channel,
    message_id: MessageId,
    filename: &str,
) -> PathBuf {
    let filename = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("attachment");
    directory
        .join(channel.display_name().replace('#', "__"))
        .join(format!("{message_id}_{filename}"))
}

/// Outcome counters returned by `drain`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Cloneable handle for submitting jobs
#[derive(Debug, Clone)]
pub struct AttachmentQueue {
    directory: Arc<Path>,
    sender: mpsc::UnboundedSender<AttachmentJob>,
    remaining: Arc<AtomicUsize>,
}

impl AttachmentQueue {
    /// Queue a job
    pub fn enqueue(&self, job: AttachmentJob) -> Result<()> {
        self.remaining.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(job).is_err() {
            self.remaining.fetch_sub(1, Ordering::Relaxed);
            return Err(PipelineError::AttachmentsClosed);
        }
        Ok(())
    }

    /// Queue the attachment of `record`, if it has one
    ///
    /// Returns whether a job was queued.
    pub fn submit(&self, channel: &Channel, record: &ExportRecord) -> Result<bool> {
        match AttachmentJob::for_record(&self.directory, channel, record) {
            Some(job) => self.enqueue(job).map(|()| true),
            None => Ok(false),
        }
    }

    /// Jobs queued and not yet picked up by the worker
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Root directory for downloads
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Background attachment downloader
pub struct AttachmentFetcher {
    queue: AttachmentQueue,
    drain: CancellationToken,
    worker: JoinHandle<FetchSummary>,
}

impl AttachmentFetcher {
    /// Spawn the worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T: Transport>(transport: Arc<T>, directory: impl Into<PathBuf>) -> Self {
        let directory: PathBuf = directory.into();
        let (sender, receiver) = mpsc::unbounded_channel();
        let remaining = Arc::new(AtomicUsize::new(0));
        let drain = CancellationToken::new();

        let worker = tokio::spawn(run_worker(
            transport,
            receiver,
            Arc::clone(&remaining),
            drain.clone(),
        ));

        Self {
            queue: AttachmentQueue {
                directory: Arc::from(directory),
                sender,
                remaining,
            },
            drain,
            worker,
        }
    }

    /// Handle for submitting jobs
    pub fn queue(&self) -> AttachmentQueue {
        self.queue.clone()
    }

    /// Finish every queued job and stop the worker
    pub async fn drain(self) -> Result<FetchSummary> {
        let remaining = self.queue.remaining();
        if remaining > 0 {
            tracing::info!(remaining, "waiting for attachment downloads");
        }
        self.drain.cancel();
        let summary = self.worker.await?;
        tracing::info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "attachment fetcher stopped"
        );
        Ok(summary)
    }
}

enum Fetched {
    Downloaded,
    Skipped,
}

async fn run_worker<T: Transport>(
    transport: Arc<T>,
    mut receiver: mpsc::UnboundedReceiver<AttachmentJob>,
    remaining: Arc<AtomicUsize>,
    drain: CancellationToken,
) -> FetchSummary {
    let mut summary = FetchSummary::default();

    loop {
        let job = tokio::select! {
            biased;
            job = receiver.recv() => job,
            () = drain.cancelled() => {
                // stop intake; buffered jobs are still delivered
                receiver.close();
                receiver.recv().await
            }
        };
        let Some(job) = job else { break };
        let left = remaining.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);

        match fetch(transport.as_ref(), &job).await {
            Ok(Fetched::Downloaded) => {
                summary.downloaded += 1;
                tracing::info!(
                    channel = %job.channel,
                    message_id = job.message_id,
                    path = %job.destination.display(),
                    remaining = left,
                    "attachment downloaded"
                );
            }
            Ok(Fetched::Skipped) => {
                summary.skipped += 1;
                tracing::debug!(
                    path = %job.destination.display(),
                    remaining = left,
                    "attachment already present"
                );
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(
                    channel = %job.channel,
                    message_id = job.message_id,
                    error = %e,
                    remaining = left,
                    "attachment download failed"
                );
            }
        }
    }

    summary
}

async fn fetch<T: Transport>(
    transport: &T,
    job: &AttachmentJob,
) -> std::result::Result<Fetched, TransportError> {
    if tokio::fs::try_exists(&job.destination).await? {
        return Ok(Fetched::Skipped);
    }
    if let Some(parent) = job.destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    transport
        .download(&job.channel, job.message_id, &job.destination)
        .await?;
    Ok(Fetched::Downloaded)
}
