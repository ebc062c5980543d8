//! Keybase chat API wire format
//!
//! Request builders and decoders for the JSON exchanged with
//! `keybase chat api` and `keybase chat api-listen`. Message content is
//! decoded from a loose `serde_json::Value` because its shape depends on the
//! declared content type and older clients omit sub-fields freely.

use std::collections::BTreeMap;
use std::path::Path;

use scribe_protocol::{
    AttachmentContent, Channel, DeleteContent, EditContent, EventContent, GitRef, RawEvent,
    ReactionContent, Reactions, RetentionPolicy, Sender, SystemNotice, TeamRole, TextContent,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::TransportError;
use crate::traits::{Page, PageRequest};

// =============================================================================
// Requests
// =============================================================================

pub(crate) fn list_request() -> Value {
    json!({ "method": "list" })
}

pub(crate) fn read_request(channel: &Channel, request: &PageRequest) -> Value {
    let mut pagination = json!({ "num": request.page_size });
    if let Some(cursor) = &request.cursor {
        pagination["next"] = json!(cursor.as_str());
    }
    json!({
        "method": "read",
        "params": {
            "options": {
                "conversation_id": channel.id,
                "peek": true,
                "pagination": pagination,
            }
        }
    })
}

pub(crate) fn download_request(channel: &Channel, message_id: u64, dest: &Path) -> Value {
    json!({
        "method": "download",
        "params": {
            "options": {
                "conversation_id": channel.id,
                "message_id": message_id,
                "output": dest.to_string_lossy(),
            }
        }
    })
}

/// Channel filter passed to `api-listen --filter-channel`
pub(crate) fn listen_filter(channel: &Channel) -> String {
    let mut filter = json!({ "name": channel.name });
    if let Some(topic) = channel.topic_name.as_deref().filter(|t| !t.is_empty()) {
        filter["topic_name"] = json!(topic);
    }
    if let Some(members_type) = &channel.members_type {
        filter["members_type"] = json!(members_type);
    }
    filter.to_string()
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Parse a `chat api` reply, turning an error object into `TransportError::Api`
pub(crate) fn parse_response<T: DeserializeOwned>(raw: &[u8]) -> Result<T, TransportError> {
    let response: ApiResponse<T> = serde_json::from_slice(raw)?;
    if let Some(error) = response.error {
        return Err(TransportError::api(error.code, error.message));
    }
    response
        .result
        .ok_or_else(|| TransportError::api(0, "response has neither result nor error"))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResult {
    #[serde(default)]
    conversations: Option<Vec<WireConversation>>,
}

#[derive(Debug, Deserialize)]
struct WireConversation {
    id: String,
    channel: WireChannel,
}

#[derive(Debug, Deserialize)]
struct WireChannel {
    name: String,
    #[serde(default)]
    members_type: Option<String>,
    #[serde(default)]
    topic_name: Option<String>,
}

impl ListResult {
    pub(crate) fn into_channels(self) -> Vec<Channel> {
        self.conversations
            .unwrap_or_default()
            .into_iter()
            .map(|conv| Channel {
                id: conv.id,
                name: conv.channel.name,
                topic_name: conv.channel.topic_name,
                members_type: conv.channel.members_type,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadResult {
    #[serde(default)]
    messages: Option<Vec<MessageEntry>>,
    #[serde(default)]
    pagination: Option<WirePagination>,
}

#[derive(Debug, Deserialize)]
struct MessageEntry {
    #[serde(default)]
    msg: Option<WireMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WirePagination {
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    last: bool,
}

impl ReadResult {
    /// Convert into a page; entries the service failed to unbox are dropped
    pub(crate) fn into_page(self) -> (Page, Vec<String>) {
        let mut errors = Vec::new();
        let events = self
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match (entry.msg, entry.error) {
                (Some(msg), _) => Some(msg.into_event()),
                (None, Some(error)) => {
                    errors.push(error);
                    None
                }
                (None, None) => None,
            })
            .collect();

        let (next, last) = match self.pagination {
            Some(p) => {
                let next = p.next.filter(|n| !n.is_empty() && !p.last);
                let last = p.last || next.is_none();
                (next.map(Into::into), last)
            }
            None => (None, true),
        };

        (Page { events, next, last }, errors)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMessage {
    id: u64,
    #[serde(default)]
    sent_at: i64,
    sender: WireSender,
    #[serde(default)]
    revoked_device: bool,
    #[serde(default)]
    reactions: Option<WireReactions>,
    #[serde(default)]
    content: Value,
}

#[derive(Debug, Deserialize)]
struct WireSender {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    device_id: String,
    #[serde(default)]
    device_name: Option<String>,
}

/// `{"reactions": {emoji: {username: {"ctime": ..}}}}`
#[derive(Debug, Deserialize)]
struct WireReactions {
    #[serde(default)]
    reactions: Option<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl WireMessage {
    pub(crate) fn into_event(self) -> RawEvent {
        let reactions: Option<Reactions> = self
            .reactions
            .and_then(|r| r.reactions)
            .filter(|r| !r.is_empty())
            .map(|r| {
                r.into_iter()
                    .map(|(emoji, users)| (emoji, users.into_keys().collect()))
                    .collect()
            });

        RawEvent {
            id: self.id,
            sent_at: self.sent_at,
            sender: Sender {
                uid: self.sender.uid,
                username: self.sender.username,
                device_id: self.sender.device_id,
                device_name: self.sender.device_name,
            },
            revoked_device: self.revoked_device,
            reactions,
            content: decode_content(&self.content),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListenEnvelope {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    msg: Option<WireMessage>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one `api-listen` output line
///
/// Returns `Ok(None)` for notifications that are not chat messages.
pub(crate) fn decode_listen_line(line: &str) -> Result<Option<RawEvent>, TransportError> {
    let envelope: ListenEnvelope = serde_json::from_str(line)?;
    match envelope.kind.as_str() {
        "chat" => Ok(envelope.msg.map(WireMessage::into_event)),
        "error" => Err(TransportError::api(
            0,
            envelope.error.unwrap_or_else(|| "unknown listener error".into()),
        )),
        _ => Ok(None),
    }
}

// =============================================================================
// Content
// =============================================================================

/// Decode message content by its declared `type`
pub(crate) fn decode_content(content: &Value) -> EventContent {
    let kind = content
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let decoded = match kind {
        "text" => decode_text(content),
        "attachment" => decode_attachment(content),
        "reaction" => decode_reaction(content),
        "edit" => decode_edit(content),
        "delete" => decode_delete(content),
        "headline" => decode_headline(content),
        "system" => content.get("system").and_then(decode_system),
        _ => {
            return EventContent::Unsupported {
                kind: kind.to_string(),
            };
        }
    };

    decoded.unwrap_or_else(|| EventContent::Malformed {
        kind: kind.to_string(),
    })
}

fn decode_text(content: &Value) -> Option<EventContent> {
    let text = content.get("text")?;
    Some(EventContent::Text(TextContent {
        body: str_field(text, "body")?,
        reply_to: text.get("replyTo").and_then(Value::as_u64),
    }))
}

fn decode_attachment(content: &Value) -> Option<EventContent> {
    let object = content.get("attachment")?.get("object")?;
    let asset_type = object
        .get("metadata")
        .and_then(|m| m.get("assetType"))
        .and_then(asset_type_name);

    Some(EventContent::Attachment(AttachmentContent {
        filename: str_field(object, "filename")?,
        title: str_field(object, "title").unwrap_or_default(),
        path: str_field(object, "path").unwrap_or_default(),
        asset_type,
    }))
}

/// Asset types arrive as numbers from the service and as names from some clients
fn asset_type_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Number(n) => Some(
            match n.as_u64()? {
                0 => "none",
                1 => "image",
                2 => "video",
                3 => "audio",
                _ => "unknown",
            }
            .to_string(),
        ),
        _ => None,
    }
}

fn decode_reaction(content: &Value) -> Option<EventContent> {
    let reaction = content.get("reaction")?;
    Some(EventContent::Reaction(ReactionContent {
        target: reaction.get("m")?.as_u64()?,
        body: str_field(reaction, "b")?,
    }))
}

fn decode_edit(content: &Value) -> Option<EventContent> {
    let edit = content.get("edit")?;
    Some(EventContent::Edit(EditContent {
        target: edit.get("messageID")?.as_u64()?,
        body: str_field(edit, "body")?,
    }))
}

fn decode_delete(content: &Value) -> Option<EventContent> {
    let targets = content
        .get("delete")?
        .get("messageIDs")?
        .as_array()?
        .iter()
        .filter_map(Value::as_u64)
        .collect();
    Some(EventContent::Delete(DeleteContent { targets }))
}

fn decode_headline(content: &Value) -> Option<EventContent> {
    Some(EventContent::Headline {
        headline: str_field(content.get("headline")?, "headline")?,
    })
}

const SYSTEM_TYPES: &[&str] = &[
    "addedtoteam",
    "inviteaddedtoteam",
    "complexteam",
    "createteam",
    "gitpush",
    "changeavatar",
    "changeretention",
    "bulkaddtoconv",
    "sbsresolve",
    "newchannel",
];

fn decode_system(system: &Value) -> Option<EventContent> {
    let system_type = code_or_name(system.get("systemType")?, SYSTEM_TYPES)?;
    let body = |key: &str| system.get(key);

    let notice = match system_type {
        0 => {
            let b = body("addedtoteam")?;
            SystemNotice::AddedToTeam {
                team: str_field(b, "team")?,
                adder: str_field(b, "adder")?,
                addee: str_field(b, "addee")?,
                role: team_role(b.get("role")),
            }
        }
        1 => {
            let b = body("inviteaddedtoteam")?;
            SystemNotice::InviteAddedToTeam {
                team: str_field(b, "team")?,
                adder: str_field(b, "adder")?,
                inviter: str_field(b, "inviter")?,
                invitee: str_field(b, "invitee")?,
                role: team_role(b.get("role")),
            }
        }
        2 => SystemNotice::ComplexTeam {
            team: str_field(body("complexteam")?, "team")?,
        },
        3 => {
            let b = body("createteam")?;
            SystemNotice::CreateTeam {
                team: str_field(b, "team")?,
                creator: str_field(b, "creator")?,
            }
        }
        4 => {
            let b = body("gitpush")?;
            let push_type = b.get("pushType").and_then(Value::as_i64).unwrap_or(0);
            if push_type != 0 {
                SystemNotice::Other { system_type }
            } else {
                let refs = b
                    .get("refs")
                    .and_then(Value::as_array)
                    .map(|refs| {
                        refs.iter()
                            .map(|r| GitRef {
                                name: str_field(r, "refName").unwrap_or_default(),
                                commits: r
                                    .get("commits")
                                    .and_then(Value::as_array)
                                    .map_or(0, Vec::len),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                SystemNotice::GitPush {
                    team: str_field(b, "team")?,
                    pusher: str_field(b, "pusher")?,
                    repo: str_field(b, "repoName")?,
                    refs,
                }
            }
        }
        5 => {
            let b = body("changeavatar")?;
            SystemNotice::ChangeAvatar {
                team: str_field(b, "team")?,
                user: str_field(b, "user")?,
            }
        }
        6 => {
            let b = body("changeretention")?;
            SystemNotice::ChangeRetention {
                user: str_field(b, "user")?,
                is_team: b.get("isTeam").and_then(Value::as_bool).unwrap_or(false),
                is_inherit: b.get("isInherit").and_then(Value::as_bool).unwrap_or(false),
                policy: retention_policy(b.get("policy")?)?,
            }
        }
        7 => SystemNotice::BulkAddToConv {
            usernames: body("bulkaddtoconv")?
                .get("usernames")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        },
        9 => {
            let b = body("newchannel")?;
            // convIDs is a list on current clients and a count on older ones
            let count = match b.get("convIDs") {
                Some(Value::Array(ids)) => ids.len(),
                Some(Value::Number(n)) => n.as_u64().unwrap_or(1) as usize,
                _ => 1,
            };
            SystemNotice::NewChannel {
                creator: str_field(b, "creator")?,
                name: str_field(b, "nameAtCreation")?,
                count,
            }
        }
        other => SystemNotice::Other { system_type: other },
    };

    Some(EventContent::SystemNotice(notice))
}

const TEAM_ROLES: &[&str] = &[
    "none",
    "reader",
    "writer",
    "admin",
    "owner",
    "bot",
    "restrictedbot",
];

fn team_role(value: Option<&Value>) -> TeamRole {
    value
        .and_then(|v| code_or_name(v, TEAM_ROLES))
        .map_or(TeamRole::None, TeamRole::from_code)
}

const RETENTION_TYPES: &[&str] = &["none", "retain", "expire", "inherit", "ephemeral"];

fn retention_policy(policy: &Value) -> Option<RetentionPolicy> {
    let age = |key: &str| policy.get(key)?.get("age")?.as_u64();
    match code_or_name(policy.get("typ")?, RETENTION_TYPES)? {
        0 | 1 => Some(RetentionPolicy::Retain),
        2 => Some(RetentionPolicy::Expire {
            age_secs: age("expire")?,
        }),
        3 => Some(RetentionPolicy::Inherit),
        4 => Some(RetentionPolicy::Ephemeral {
            age_secs: age("ephemeral")?,
        }),
        _ => None,
    }
}

/// Enum values arrive either as numeric codes or as lowercase names
fn code_or_name(value: &Value, names: &[&str]) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let lower = s.to_ascii_lowercase();
            names
                .iter()
                .position(|name| *name == lower)
                .and_then(|i| i64::try_from(i).ok())
        }
        _ => None,
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}
