//! Transport trait definition

use std::future::Future;
use std::path::Path;

use scribe_protocol::{Channel, Cursor, MessageId, RawEvent};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// One paginated history read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of events to return
    pub page_size: usize,

    /// Resume point; `None` starts from the most recent message
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    /// Request the newest page
    pub fn first(page_size: usize) -> Self {
        Self {
            page_size,
            cursor: None,
        }
    }

    /// Request the page after `cursor`
    pub fn after(page_size: usize, cursor: Cursor) -> Self {
        Self {
            page_size,
            cursor: Some(cursor),
        }
    }
}

/// One page of history, newest event first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Events in reverse chronological order
    pub events: Vec<RawEvent>,

    /// Cursor for the next (older) page
    pub next: Option<Cursor>,

    /// Whether the start of history was reached
    pub last: bool,
}

/// Item delivered by a live subscription
#[derive(Debug)]
pub enum LiveItem {
    /// A new event in arrival order
    Event(RawEvent),

    /// A non-fatal stream error
    Error(TransportError),
}

/// Registered live subscription for one channel
///
/// Items arrive in the order the transport observed them. `next` returns
/// `None` once the transport side is gone.
#[derive(Debug)]
pub struct Subscription {
    channel: Channel,
    receiver: mpsc::Receiver<LiveItem>,
}

impl Subscription {
    /// Wrap a receiver fed by the transport
    pub fn new(channel: Channel, receiver: mpsc::Receiver<LiveItem>) -> Self {
        Self { channel, receiver }
    }

    /// Channel this subscription watches
    #[inline]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Wait for the next live item
    pub async fn next(&mut self) -> Option<LiveItem> {
        self.receiver.recv().await
    }
}

/// Chat transport capability
///
/// Implementations own connection state and the wire format. The pipeline
/// relies on two ordering guarantees: `read` returns events newest-first, and
/// a `Subscription` yields events in arrival order.
pub trait Transport: Send + Sync + 'static {
    /// Returns the transport name (e.g., "keybase")
    fn name(&self) -> &'static str;

    /// List every channel visible to the transport
    fn list(&self) -> impl Future<Output = Result<Vec<Channel>, TransportError>> + Send;

    /// Read one page of history
    fn read(
        &self,
        channel: &Channel,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, TransportError>> + Send;

    /// Register a live subscription
    ///
    /// Returns once the subscription is registered, not when the stream ends.
    fn subscribe(
        &self,
        channel: &Channel,
    ) -> impl Future<Output = Result<Subscription, TransportError>> + Send;

    /// Download the attachment of `message_id` to `dest`
    fn download(
        &self,
        channel: &Channel,
        message_id: MessageId,
        dest: &Path,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Release transport resources (subscriptions, sessions)
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
