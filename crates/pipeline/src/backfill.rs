//! Backfill reader
//!
//! Walks a channel's history newest-first, one transport page per call. The
//! sequence is finite and cannot be restarted: once the transport reports the
//! last page, or a read fails, `next_chunk` keeps returning `None`.

use std::sync::Arc;

use scribe_protocol::{Channel, Cursor, RawEvent};
use scribe_transport::{PAGE_SIZE, PageRequest, Transport};

use crate::error::Result;

/// Lazy sequence of history chunks for one channel
pub struct HistoryReader<T> {
    transport: Arc<T>,
    channel: Channel,
    cursor: Option<Cursor>,
    started: bool,
    done: bool,
    total: usize,
    chunks: usize,
}

impl<T: Transport> HistoryReader<T> {
    /// Read from the most recent message
    pub fn new(transport: Arc<T>, channel: Channel) -> Self {
        Self {
            transport,
            channel,
            cursor: None,
            started: false,
            done: false,
            total: 0,
            chunks: 0,
        }
    }

    /// Start from `cursor` instead of the most recent message
    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Read pages until one has events or history ends
    ///
    /// Returns `Ok(None)` once history is exhausted. Transport errors end the
    /// sequence and are returned as-is, without retry.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<RawEvent>>> {
        if self.done {
            return Ok(None);
        }
        if !self.started {
            self.started = true;
            tracing::info!(channel = %self.channel, "history start");
        }

        loop {
            let request = PageRequest {
                page_size: PAGE_SIZE,
                cursor: self.cursor.take(),
            };
            let page = match self.transport.read(&self.channel, request).await {
                Ok(page) => page,
                Err(e) => {
                    self.done = true;
                    return Err(e.into());
                }
            };

            self.total += page.events.len();
            self.cursor = page.next;
            if !page.last && self.cursor.is_none() {
                tracing::warn!(
                    channel = %self.channel,
                    "page without cursor before end of history, stopping"
                );
            }
            self.done = page.last || self.cursor.is_none();
            if self.done {
                tracing::info!(channel = %self.channel, total = self.total, "history end");
            }

            if !page.events.is_empty() {
                self.chunks += 1;
                return Ok(Some(page.events));
            }
            if self.done {
                return Ok(None);
            }
        }
    }

    /// Events read so far
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Non-empty chunks yielded so far
    #[inline]
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}
