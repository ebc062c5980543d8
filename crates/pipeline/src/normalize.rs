//! Event normalization
//!
//! Turns one non-alteration `RawEvent` into the `ExportRecord` that sinks
//! receive. Which optional message kinds survive is decided here, from the
//! `[message_types]` and `[attachments]` configuration.

use scribe_protocol::{AttachmentContent, AttachmentInfo, EventContent, ExportRecord, RawEvent};

/// Which optional content is exported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Prefix attachment text with `[Attachment <filename>]`
    pub attachment_stub: bool,

    /// Copy reaction maps onto records
    pub reactions: bool,

    /// Export reaction events as records of their own
    pub reaction_messages: bool,

    /// Export rendered system notices
    pub system_messages: bool,

    /// Export headline changes
    pub headline: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            attachment_stub: true,
            reactions: true,
            reaction_messages: true,
            system_messages: true,
            headline: true,
        }
    }
}

/// Converts raw events into export records
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Normalize one event
    ///
    /// Returns `None` for edits and deletes (they never become records of
    /// their own), for disabled message kinds, and for content that cannot be
    /// exported.
    pub fn normalize(&self, event: &RawEvent) -> Option<ExportRecord> {
        let mut record = ExportRecord::from_event(event);
        if self.options.reactions {
            record.reactions.clone_from(&event.reactions);
        }

        match &event.content {
            EventContent::Text(text) => {
                record.text = Some(text.body.clone());
                record.reply_to = text.reply_to;
            }
            EventContent::Attachment(attachment) => {
                record.text = Some(attachment_text(attachment, self.options.attachment_stub));
                record.attachment = Some(AttachmentInfo {
                    path: attachment.path.clone(),
                    filename: attachment.filename.clone(),
                    asset_type: attachment.asset_type.clone(),
                });
            }
            EventContent::Reaction(reaction) => {
                if !self.options.reaction_messages {
                    return None;
                }
                record.text = Some(reaction.body.clone());
                record.reply_to = Some(reaction.target);
                record.special = true;
            }
            EventContent::SystemNotice(notice) => {
                if !self.options.system_messages {
                    return None;
                }
                record.text = Some(notice.render());
                record.system = true;
            }
            EventContent::Headline { headline } => {
                if !self.options.headline {
                    return None;
                }
                record.text = Some(headline.clone());
                record.special = true;
            }
            EventContent::Edit(_) | EventContent::Delete(_) => return None,
            EventContent::Malformed { kind } => {
                tracing::warn!(id = event.id, kind = %kind, "skipping malformed message");
                return None;
            }
            EventContent::Unsupported { kind } => {
                tracing::debug!(id = event.id, kind = %kind, "skipping unsupported message");
                return None;
            }
        }

        Some(record)
    }
}

/// Text shown for an attachment
///
/// With stubs on: `[Attachment <filename>] <title>`, without a trailing space
/// when the title is empty. With stubs off: the bare title.
pub fn attachment_text(attachment: &AttachmentContent, stub: bool) -> String {
    if !stub {
        return attachment.title.clone();
    }
    if attachment.title.is_empty() {
        format!("[Attachment {}]", attachment.filename)
    } else {
        format!("[Attachment {}] {}", attachment.filename, attachment.title)
    }
}
