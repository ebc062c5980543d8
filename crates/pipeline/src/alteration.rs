//! Alteration resolver
//!
//! History arrives newest-first, so an edit or delete is always seen before
//! the message it targets. The resolver remembers the first alteration seen
//! per target (which is the newest one) and applies it when the original
//! finally shows up.
//!
//! # Precedence
//!
//! - A delete is terminal regardless of recency: it replaces an edit already
//!   recorded for the target, later edits are ignored, and the original
//!   resolves to nothing.
//! - Among edits, the first seen wins. Among deletes, the first seen wins.
//! - An alteration whose target never shows up is simply never applied.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use scribe_protocol::{EventContent, ExportRecord, MessageId, RawEvent};

use crate::normalize::Normalizer;

/// Final alteration recorded for a message id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterationState {
    Edited {
        text: String,
        device_id: String,
        device_name: Option<String>,
    },
    Deleted {
        device_id: String,
        device_name: Option<String>,
    },
}

/// Reconciles edits and deletes during one backfill pass
///
/// One resolver per channel pass; the state is never shared.
#[derive(Debug, Default)]
pub struct AlterationResolver {
    alterations: HashMap<MessageId, AlterationState>,
    normalizer: Normalizer,
}

impl AlterationResolver {
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            alterations: HashMap::new(),
            normalizer,
        }
    }

    /// Feed one history event, newest-first
    ///
    /// Alterations are recorded and yield `None`; any other event is resolved.
    pub fn observe(&mut self, event: &RawEvent) -> Option<ExportRecord> {
        match &event.content {
            EventContent::Edit(_) => {
                self.record_edit(event);
                None
            }
            EventContent::Delete(_) => {
                self.record_delete(event);
                None
            }
            _ => self.resolve(event),
        }
    }

    /// Record an edit unless its target already has an alteration
    ///
    /// Returns whether the edit was recorded.
    pub fn record_edit(&mut self, event: &RawEvent) -> bool {
        let EventContent::Edit(edit) = &event.content else {
            return false;
        };

        match self.alterations.entry(edit.target) {
            Entry::Occupied(_) => {
                tracing::trace!(target_id = edit.target, "older edit superseded");
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(AlterationState::Edited {
                    text: edit.body.clone(),
                    device_id: event.sender.device_id.clone(),
                    device_name: event.sender.device_name.clone(),
                });
                true
            }
        }
    }

    /// Record a delete for every target not already deleted
    ///
    /// An edit recorded earlier for a target is replaced. Returns the number
    /// of targets recorded.
    pub fn record_delete(&mut self, event: &RawEvent) -> usize {
        let EventContent::Delete(delete) = &event.content else {
            return 0;
        };

        let mut recorded = 0;
        for &target in &delete.targets {
            let deleted = AlterationState::Deleted {
                device_id: event.sender.device_id.clone(),
                device_name: event.sender.device_name.clone(),
            };
            match self.alterations.entry(target) {
                Entry::Occupied(slot) if matches!(slot.get(), AlterationState::Deleted { .. }) => {}
                Entry::Occupied(mut slot) => {
                    tracing::trace!(target_id = target, "delete overrides edit");
                    slot.insert(deleted);
                    recorded += 1;
                }
                Entry::Vacant(slot) => {
                    slot.insert(deleted);
                    recorded += 1;
                }
            }
        }
        recorded
    }

    /// Produce the final record for an original message
    pub fn resolve(&self, event: &RawEvent) -> Option<ExportRecord> {
        if event.is_alteration() {
            return None;
        }

        match self.alterations.get(&event.id) {
            Some(AlterationState::Deleted { .. }) => {
                tracing::trace!(id = event.id, "message deleted, skipping");
                None
            }
            Some(AlterationState::Edited {
                text,
                device_id,
                device_name,
            }) => {
                let mut record = self.normalizer.normalize(event)?;
                record.apply_edit(text.clone(), device_id.clone(), device_name.clone());
                Some(record)
            }
            None => self.normalizer.normalize(event),
        }
    }

    /// Alteration recorded for `id`, if any
    pub fn state(&self, id: MessageId) -> Option<&AlterationState> {
        self.alterations.get(&id)
    }

    /// Number of targets with a recorded alteration
    pub fn len(&self) -> usize {
        self.alterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alterations.is_empty()
    }
}
