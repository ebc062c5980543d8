//! Raw chat events
//!
//! A `RawEvent` is one entry of a channel's event log exactly as the transport
//! delivered it. Edits and deletes are events of their own that point at an
//! earlier message id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::system::SystemNotice;

/// Per-channel message identifier
///
/// Ids increase monotonically with send time inside one channel.
pub type MessageId = u64;

/// Reactions attached to a message: emoji -> usernames that reacted
pub type Reactions = BTreeMap<String, Vec<String>>;

/// Identity of the user and device that sent an event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Stable user id
    pub uid: String,

    /// Username at send time
    pub username: Option<String>,

    /// Device the event was sent from
    pub device_id: String,

    /// Human-readable device name
    pub device_name: Option<String>,
}

/// One event from a channel's history or live stream
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Message id (unique per channel, larger = later)
    pub id: MessageId,

    /// Send time, seconds since the Unix epoch
    pub sent_at: i64,

    /// Sender identity
    pub sender: Sender,

    /// Whether the sending device has since been revoked
    pub revoked_device: bool,

    /// Reactions currently attached to this message
    pub reactions: Option<Reactions>,

    /// Variant-specific payload
    pub content: EventContent,
}

impl RawEvent {
    /// Create a text event
    pub fn text(id: MessageId, sender: Sender, body: impl Into<String>) -> Self {
        Self::with_content(
            id,
            sender,
            EventContent::Text(TextContent {
                body: body.into(),
                reply_to: None,
            }),
        )
    }

    /// Create an edit event targeting `target`
    pub fn edit(id: MessageId, sender: Sender, target: MessageId, body: impl Into<String>) -> Self {
        Self::with_content(
            id,
            sender,
            EventContent::Edit(EditContent {
                target,
                body: body.into(),
            }),
        )
    }

    /// Create a delete event targeting `targets`
    pub fn delete(id: MessageId, sender: Sender, targets: Vec<MessageId>) -> Self {
        Self::with_content(id, sender, EventContent::Delete(DeleteContent { targets }))
    }

    /// Create an event with arbitrary content and no reactions
    pub fn with_content(id: MessageId, sender: Sender, content: EventContent) -> Self {
        Self {
            id,
            sent_at: 0,
            sender,
            revoked_device: false,
            reactions: None,
            content,
        }
    }

    /// Set the send time
    #[must_use]
    pub fn sent_at(mut self, sent_at: i64) -> Self {
        self.sent_at = sent_at;
        self
    }

    /// Whether this event alters an earlier message (edit or delete)
    #[inline]
    pub fn is_alteration(&self) -> bool {
        matches!(self.content, EventContent::Edit(_) | EventContent::Delete(_))
    }

    /// Content type name, as used in logs
    #[inline]
    pub fn kind(&self) -> &str {
        self.content.kind()
    }
}

/// Variant-specific event payload
#[derive(Debug, Clone, PartialEq)]
pub enum EventContent {
    /// Plain text message
    Text(TextContent),

    /// File attachment
    Attachment(AttachmentContent),

    /// Reaction event (someone reacted to `target`)
    Reaction(ReactionContent),

    /// Team/channel system notice
    SystemNotice(SystemNotice),

    /// Channel headline change
    Headline { headline: String },

    /// Edit of an earlier message
    Edit(EditContent),

    /// Deletion of one or more earlier messages
    Delete(DeleteContent),

    /// A declared content type whose expected payload is missing
    Malformed { kind: String },

    /// A content type the exporter does not handle
    Unsupported { kind: String },
}

impl EventContent {
    /// Content type name
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Attachment(_) => "attachment",
            Self::Reaction(_) => "reaction",
            Self::SystemNotice(_) => "system",
            Self::Headline { .. } => "headline",
            Self::Edit(_) => "edit",
            Self::Delete(_) => "delete",
            Self::Malformed { kind } | Self::Unsupported { kind } => kind,
        }
    }
}

/// Text message payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    pub body: String,
    pub reply_to: Option<MessageId>,
}

/// Attachment payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentContent {
    /// Original file name
    pub filename: String,

    /// User-supplied caption (may be empty)
    pub title: String,

    /// Path of the file on the sender's side
    pub path: String,

    /// Asset type reported by the transport (image, video, file, ...)
    pub asset_type: Option<String>,
}

/// Reaction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionContent {
    pub target: MessageId,
    pub body: String,
}

/// Edit payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContent {
    pub target: MessageId,
    pub body: String,
}

/// Delete payload (one delete event can remove several messages)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteContent {
    pub targets: Vec<MessageId>,
}
