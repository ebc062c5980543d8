//! Export records
//!
//! `ExportRecord` is the normalized, immutable unit written to sinks. The
//! serialized field names are the export format, so renaming a field here is a
//! breaking change for every consumer of an export file.

use serde::{Deserialize, Serialize};

use crate::event::{MessageId, RawEvent, Reactions, Sender};

/// Attachment descriptor carried by a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// Path of the file on the sender's side
    pub path: String,

    /// Original file name
    pub filename: String,

    /// Asset type reported by the transport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
}

/// One exported message
///
/// # JSON shape
///
/// ```text
/// {"id":42,"text":"hello","sent_at":1600000000,"sender_uid":"u1",
///  "sender_username":"alice","device_id":"d1","device_name":"laptop"}
/// ```
///
/// Optional fields are omitted when absent and the `edited`/`special`/`system`
/// markers are omitted when false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: MessageId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Id of the message this one replies or reacts to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,

    /// Send time, seconds since the Unix epoch
    pub sent_at: i64,

    pub sender_uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,

    pub device_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub revoked_device: bool,

    /// Text reflects an edit of the original message
    #[serde(default, skip_serializing_if = "is_false")]
    pub edited: bool,

    /// Reaction or headline record rather than a regular message
    #[serde(default, skip_serializing_if = "is_false")]
    pub special: bool,

    /// Rendered system notice
    #[serde(default, skip_serializing_if = "is_false")]
    pub system: bool,
}

impl ExportRecord {
    /// Create a record carrying the identity fields of `event` and no content
    pub fn from_event(event: &RawEvent) -> Self {
        let Sender {
            uid,
            username,
            device_id,
            device_name,
        } = event.sender.clone();

        Self {
            id: event.id,
            text: None,
            reply_to: None,
            attachment: None,
            reactions: None,
            sent_at: event.sent_at,
            sender_uid: uid,
            sender_username: username,
            device_id,
            device_name,
            revoked_device: event.revoked_device,
            edited: false,
            special: false,
            system: false,
        }
    }

    /// Replace the text and device identity with those of an edit
    ///
    /// The sender uid is kept: only the author can edit a message, but the
    /// edit may come from another of their devices.
    pub fn apply_edit(&mut self, text: String, device_id: String, device_name: Option<String>) {
        self.text = Some(text);
        self.device_id = device_id;
        self.device_name = device_name;
        self.edited = true;
    }

    /// Whether this record references an attachment
    #[inline]
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
