//! In-memory transport
//!
//! A scripted transport that serves pre-built history pages, lets callers push
//! live events, and writes placeholder bytes for downloads. It exercises the
//! real pipeline code paths without a chat service.
//!
//! # Example
//!
//! ```
//! use scribe_protocol::{Channel, RawEvent, Sender};
//! use scribe_transport::memory::MemoryTransport;
//! use scribe_transport::Page;
//!
//! let channel = Channel::new("c1", "alice,bob");
//! let transport = MemoryTransport::new().with_channel(
//!     channel,
//!     vec![Page {
//!         events: vec![RawEvent::text(1, Sender::default(), "hi")],
//!         next: None,
//!         last: true,
//!     }],
//! );
//! assert_eq!(transport.read_count(), 0);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use scribe_protocol::{Channel, Cursor, MessageId, RawEvent};
use tokio::sync::mpsc;

use crate::SUBSCRIPTION_BUFFER;
use crate::error::TransportError;
use crate::traits::{LiveItem, Page, PageRequest, Subscription, Transport};

/// A recorded download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub channel_id: String,
    pub message_id: MessageId,
    pub dest: PathBuf,
}

/// Scripted in-process transport
#[derive(Debug, Default)]
pub struct MemoryTransport {
    channels: Vec<Channel>,
    pages: Mutex<HashMap<String, VecDeque<Page>>>,
    read_cursors: Mutex<Vec<Option<Cursor>>>,
    reads: AtomicUsize,
    live: Mutex<HashMap<String, mpsc::Sender<LiveItem>>>,
    downloads: Mutex<Vec<DownloadRequest>>,
    failing_downloads: Mutex<HashSet<MessageId>>,
    failing_reads: Mutex<HashSet<String>>,
    closed: AtomicBool,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel with its scripted history pages (newest page first)
    #[must_use]
    pub fn with_channel(mut self, channel: Channel, pages: Vec<Page>) -> Self {
        self.pages
            .get_mut()
            .insert(channel.id.clone(), pages.into_iter().collect());
        self.channels.push(channel);
        self
    }

    /// Add a channel whose history is `events` (newest first) split into pages
    #[must_use]
    pub fn with_history(self, channel: Channel, events: Vec<RawEvent>, page_size: usize) -> Self {
        let pages = paginate(events, page_size);
        self.with_channel(channel, pages)
    }

    /// Make every read of `channel_id` fail
    pub fn fail_reads(&self, channel_id: impl Into<String>) {
        self.failing_reads.lock().insert(channel_id.into());
    }

    /// Make downloads of `message_id` fail
    pub fn fail_download(&self, message_id: MessageId) {
        self.failing_downloads.lock().insert(message_id);
    }

    /// Number of `read` calls served so far
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Cursors passed to `read`, in call order
    pub fn read_cursors(&self) -> Vec<Option<Cursor>> {
        self.read_cursors.lock().clone()
    }

    /// Download requests that reached the transport
    pub fn downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.lock().clone()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Whether a subscription is registered for `channel_id`
    pub fn is_subscribed(&self, channel_id: &str) -> bool {
        self.live.lock().contains_key(channel_id)
    }

    /// Push a live item to the subscriber of `channel_id`
    ///
    /// Returns `false` if nobody is subscribed or the subscriber is gone.
    pub async fn emit(&self, channel_id: &str, item: LiveItem) -> bool {
        let sender = self.live.lock().get(channel_id).cloned();
        match sender {
            Some(tx) => tx.send(item).await.is_ok(),
            None => false,
        }
    }

    /// End the live stream of `channel_id`
    pub fn hang_up(&self, channel_id: &str) {
        self.live.lock().remove(channel_id);
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Channel>, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(self.channels.clone())
    }

    async fn read(&self, channel: &Channel, request: PageRequest) -> Result<Page, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.read_cursors.lock().push(request.cursor.clone());

        if self.failing_reads.lock().contains(&channel.id) {
            return Err(TransportError::api(500, "scripted read failure"));
        }

        let page = self
            .pages
            .lock()
            .get_mut(&channel.id)
            .and_then(VecDeque::pop_front);

        Ok(page.unwrap_or(Page {
            events: Vec::new(),
            next: None,
            last: true,
        }))
    }

    async fn subscribe(&self, channel: &Channel) -> Result<Subscription, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.live.lock().insert(channel.id.clone(), tx);
        Ok(Subscription::new(channel.clone(), rx))
    }

    async fn download(
        &self,
        channel: &Channel,
        message_id: MessageId,
        dest: &Path,
    ) -> Result<(), TransportError> {
        self.downloads.lock().push(DownloadRequest {
            channel_id: channel.id.clone(),
            message_id,
            dest: dest.to_path_buf(),
        });

        if self.failing_downloads.lock().contains(&message_id) {
            return Err(TransportError::download(message_id, "scripted failure"));
        }

        tokio::fs::write(dest, format!("attachment of message {message_id}")).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Relaxed);
        self.live.lock().clear();
        Ok(())
    }
}

/// Split newest-first events into pages, chaining numeric cursors
fn paginate(events: Vec<RawEvent>, page_size: usize) -> Vec<Page> {
    let page_size = page_size.max(1);
    let chunks: Vec<Vec<RawEvent>> = events
        .chunks(page_size)
        .map(<[RawEvent]>::to_vec)
        .collect();
    let count = chunks.len();

    if count == 0 {
        return vec![Page {
            events: Vec::new(),
            next: None,
            last: true,
        }];
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, events)| {
            let last = i + 1 == count;
            Page {
                events,
                next: (!last).then(|| Cursor::new(format!("page-{}", i + 1))),
                last,
            }
        })
        .collect()
}
