//! Watch buffer
//!
//! Live messages are held for a quiescence window before export so that an
//! edit or delete following shortly after creation is folded in. Every held
//! record owns one `DelayQueue` timer; an edit resets it, a delete cancels
//! it, expiry commits the record.
//!
//! A record is committed at most once: expiry removes it from the buffer.
//! Edits that arrive after commit find nothing to change and are ignored.

use std::collections::HashMap;
use std::future::poll_fn;
use std::time::Duration;

use scribe_protocol::{ExportRecord, MessageId};
use tokio_util::time::DelayQueue;
use tokio_util::time::delay_queue::Key;

struct Pending {
    record: ExportRecord,
    key: Key,
}

/// Quiescence buffer for one channel's live stream
pub struct WatchBuffer {
    timeout: Duration,
    pending: HashMap<MessageId, Pending>,
    timers: DelayQueue<MessageId>,
}

impl WatchBuffer {
    /// Create a buffer holding each record for `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: HashMap::new(),
            timers: DelayQueue::new(),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Hold a freshly observed record
    ///
    /// A record with an id already pending replaces it and restarts the timer.
    pub fn hold(&mut self, record: ExportRecord) {
        if let Some(previous) = self.pending.remove(&record.id) {
            self.timers.remove(&previous.key);
        }
        let key = self.timers.insert(record.id, self.timeout);
        self.pending.insert(record.id, Pending { record, key });
    }

    /// Fold an edit into a pending record and restart its window
    ///
    /// Returns `false` when the target is not pending (never seen, deleted or
    /// already committed).
    pub fn apply_edit(
        &mut self,
        target: MessageId,
        text: String,
        device_id: String,
        device_name: Option<String>,
    ) -> bool {
        let Some(pending) = self.pending.get_mut(&target) else {
            tracing::debug!(target_id = target, "edit: message not pending");
            return false;
        };
        pending.record.apply_edit(text, device_id, device_name);
        self.timers.reset(&pending.key, self.timeout);
        true
    }

    /// Discard pending records
    ///
    /// Returns how many of `targets` were pending.
    pub fn apply_delete(&mut self, targets: &[MessageId]) -> usize {
        let mut removed = 0;
        for target in targets {
            match self.pending.remove(target) {
                Some(pending) => {
                    self.timers.remove(&pending.key);
                    removed += 1;
                }
                None => tracing::debug!(target_id = target, "delete: message not pending"),
            }
        }
        removed
    }

    /// Wait for the next record whose window elapsed
    ///
    /// Resolves to `None` immediately when nothing is pending, so callers
    /// selecting on this should guard with `!is_empty()`.
    pub async fn next_commit(&mut self) -> Option<ExportRecord> {
        loop {
            let expired = poll_fn(|cx| self.timers.poll_expired(cx)).await?;
            if let Some(pending) = self.pending.remove(&expired.into_inner()) {
                return Some(pending.record);
            }
        }
    }

    /// Whether `id` is pending
    pub fn contains(&self, id: MessageId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending records
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending record, returning how many were discarded
    pub fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.timers.clear();
        discarded
    }
}

impl std::fmt::Debug for WatchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchBuffer")
            .field("timeout", &self.timeout)
            .field("pending", &self.pending.len())
            .finish()
    }
}
