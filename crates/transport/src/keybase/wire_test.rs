//! Tests for Keybase wire decoding

use std::path::Path;

use scribe_protocol::{
    Channel, Cursor, EventContent, RetentionPolicy, SystemNotice, TeamRole,
};
use serde_json::{Value, json};

use super::wire::{self, ListResult, ReadResult};
use crate::error::TransportError;
use crate::traits::PageRequest;

fn message(id: u64, content: Value) -> Value {
    json!({
        "id": id,
        "sent_at": 1_600_000_000,
        "sender": {
            "uid": "u1",
            "username": "alice",
            "device_id": "d1",
            "device_name": "laptop"
        },
        "content": content
    })
}

fn content(value: Value) -> EventContent {
    wire::decode_content(&value)
}

// =============================================================================
// Requests
// =============================================================================

#[test]
fn test_read_request_carries_cursor_and_peek() {
    let channel = Channel::new("c1", "alice,bob");
    let request = wire::read_request(&channel, &PageRequest::after(300, Cursor::new("abc")));

    let options = &request["params"]["options"];
    assert_eq!(request["method"], "read");
    assert_eq!(options["conversation_id"], "c1");
    assert_eq!(options["peek"], true);
    assert_eq!(options["pagination"]["num"], 300);
    assert_eq!(options["pagination"]["next"], "abc");
}

#[test]
fn test_first_read_has_no_cursor() {
    let channel = Channel::new("c1", "alice,bob");
    let request = wire::read_request(&channel, &PageRequest::first(10));
    assert!(request["params"]["options"]["pagination"].get("next").is_none());
}

#[test]
fn test_download_request() {
    let channel = Channel::new("c1", "alice,bob");
    let request = wire::download_request(&channel, 42, Path::new("/tmp/out/42_cat.png"));
    let options = &request["params"]["options"];
    assert_eq!(options["message_id"], 42);
    assert_eq!(options["output"], "/tmp/out/42_cat.png");
}

#[test]
fn test_listen_filter_for_team_channel() {
    let mut channel = Channel::new("c2", "family").with_topic("general");
    channel.members_type = Some("team".into());

    let filter: Value = serde_json::from_str(&wire::listen_filter(&channel)).unwrap();
    assert_eq!(filter["name"], "family");
    assert_eq!(filter["topic_name"], "general");
    assert_eq!(filter["members_type"], "team");
}

// =============================================================================
// Responses
// =============================================================================

#[test]
fn test_parse_api_error() {
    let raw = br#"{"error":{"code":2,"message":"conversation not found"}}"#;
    let err = wire::parse_response::<ListResult>(raw).unwrap_err();
    assert!(matches!(err, TransportError::Api { code: 2, .. }));
}

#[test]
fn test_list_result_into_channels() {
    let raw = json!({
        "result": {
            "conversations": [
                {"id": "c1", "channel": {"name": "alice,bob", "members_type": "impteamnative"}},
                {"id": "c2", "channel": {"name": "family", "members_type": "team", "topic_name": "general"}}
            ]
        }
    });
    let result: ListResult = wire::parse_response(raw.to_string().as_bytes()).unwrap();
    let channels = result.into_channels();

    assert_eq!(channels.len(), 2);
    assert_eq!(channels[1].display_name(), "family#general");
    assert_eq!(channels[0].members_type.as_deref(), Some("impteamnative"));
}

#[test]
fn test_list_result_with_null_conversations() {
    let raw = br#"{"result":{"conversations":null}}"#;
    let result: ListResult = wire::parse_response(raw).unwrap();
    assert!(result.into_channels().is_empty());
}

#[test]
fn test_read_result_into_page() {
    let raw = json!({
        "result": {
            "messages": [
                {"msg": message(2, json!({"type": "text", "text": {"body": "second", "replyTo": 1}}))},
                {"error": "unable to decrypt"},
                {"msg": message(1, json!({"type": "text", "text": {"body": "first"}}))}
            ],
            "pagination": {"next": "cursor-2", "num": 3, "last": false}
        }
    });
    let result: ReadResult = wire::parse_response(raw.to_string().as_bytes()).unwrap();
    let (page, errors) = result.into_page();

    assert_eq!(page.events.len(), 2);
    assert_eq!(page.events[0].id, 2);
    assert_eq!(page.next, Some(Cursor::new("cursor-2")));
    assert!(!page.last);
    assert_eq!(errors, vec!["unable to decrypt".to_string()]);

    match &page.events[0].content {
        EventContent::Text(text) => {
            assert_eq!(text.body, "second");
            assert_eq!(text.reply_to, Some(1));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}

#[test]
fn test_last_page_drops_cursor() {
    let raw = json!({
        "result": {
            "messages": [],
            "pagination": {"next": "ignored", "last": true}
        }
    });
    let result: ReadResult = wire::parse_response(raw.to_string().as_bytes()).unwrap();
    let (page, _) = result.into_page();
    assert!(page.last);
    assert!(page.next.is_none());
}

#[test]
fn test_missing_pagination_is_last_page() {
    let raw = br#"{"result":{"messages":null}}"#;
    let result: ReadResult = wire::parse_response(raw).unwrap();
    let (page, _) = result.into_page();
    assert!(page.last);
    assert!(page.events.is_empty());
}

#[test]
fn test_reactions_become_sorted_usernames() {
    let mut msg = message(5, json!({"type": "text", "text": {"body": "hi"}}));
    msg["reactions"] = json!({
        "reactions": {
            ":+1:": {"bob": {"ctime": 1}, "alice": {"ctime": 2}}
        }
    });
    msg["revoked_device"] = json!(true);

    let line = json!({"type": "chat", "source": "remote", "msg": msg}).to_string();
    let event = wire::decode_listen_line(&line).unwrap().unwrap();

    let reactions = event.reactions.unwrap();
    assert_eq!(reactions[":+1:"], vec!["alice".to_string(), "bob".to_string()]);
    assert!(event.revoked_device);
}

#[test]
fn test_listen_line_kinds() {
    assert!(
        wire::decode_listen_line(r#"{"type":"wallet","notification":{}}"#)
            .unwrap()
            .is_none()
    );
    assert!(wire::decode_listen_line(r#"{"type":"error","error":"boom"}"#).is_err());
    assert!(matches!(
        wire::decode_listen_line("not json"),
        Err(TransportError::Json(_))
    ));
}

// =============================================================================
// Content
// =============================================================================

#[test]
fn test_decode_attachment() {
    let decoded = content(json!({
        "type": "attachment",
        "attachment": {
            "object": {
                "filename": "cat.png",
                "title": "my cat",
                "path": "/home/alice/cat.png",
                "metadata": {"assetType": 1}
            }
        }
    }));
    match decoded {
        EventContent::Attachment(a) => {
            assert_eq!(a.filename, "cat.png");
            assert_eq!(a.title, "my cat");
            assert_eq!(a.asset_type.as_deref(), Some("image"));
        }
        other => panic!("unexpected content: {other:?}"),
    }
}

#[test]
fn test_decode_edit_delete_reaction() {
    assert!(matches!(
        content(json!({"type": "edit", "edit": {"messageID": 3, "body": "fixed"}})),
        EventContent::Edit(e) if e.target == 3 && e.body == "fixed"
    ));
    assert!(matches!(
        content(json!({"type": "delete", "delete": {"messageIDs": [3, 4]}})),
        EventContent::Delete(d) if d.targets == vec![3, 4]
    ));
    assert!(matches!(
        content(json!({"type": "reaction", "reaction": {"m": 3, "b": ":tada:"}})),
        EventContent::Reaction(r) if r.target == 3 && r.body == ":tada:"
    ));
}

#[test]
fn test_decode_headline() {
    assert_eq!(
        content(json!({"type": "headline", "headline": {"headline": "welcome"}})),
        EventContent::Headline {
            headline: "welcome".into()
        }
    );
}

#[test]
fn test_missing_payload_is_malformed() {
    assert_eq!(
        content(json!({"type": "text"})),
        EventContent::Malformed {
            kind: "text".into()
        }
    );
    assert_eq!(
        content(json!({"type": "attachment", "attachment": {}})),
        EventContent::Malformed {
            kind: "attachment".into()
        }
    );
}

#[test]
fn test_unknown_type_is_unsupported() {
    assert_eq!(
        content(json!({"type": "sendpayment"})),
        EventContent::Unsupported {
            kind: "sendpayment".into()
        }
    );
}

// =============================================================================
// System notices
// =============================================================================

#[test]
fn test_system_type_as_number_or_name() {
    let numeric = content(json!({
        "type": "system",
        "system": {
            "systemType": 0,
            "addedtoteam": {"team": "family", "adder": "alice", "addee": "bob", "role": 2}
        }
    }));
    let named = content(json!({
        "type": "system",
        "system": {
            "systemType": "addedtoteam",
            "addedtoteam": {"team": "family", "adder": "alice", "addee": "bob", "role": "writer"}
        }
    }));

    let expected = EventContent::SystemNotice(SystemNotice::AddedToTeam {
        team: "family".into(),
        adder: "alice".into(),
        addee: "bob".into(),
        role: TeamRole::Writer,
    });
    assert_eq!(numeric, expected);
    assert_eq!(named, expected);
}

#[test]
fn test_system_retention_policy() {
    let decoded = content(json!({
        "type": "system",
        "system": {
            "systemType": 6,
            "changeretention": {
                "user": "alice",
                "isTeam": false,
                "isInherit": false,
                "policy": {"typ": 2, "expire": {"age": 86400}}
            }
        }
    }));
    assert!(matches!(
        decoded,
        EventContent::SystemNotice(SystemNotice::ChangeRetention {
            policy: RetentionPolicy::Expire { age_secs: 86400 },
            ..
        })
    ));
}

#[test]
fn test_system_git_push_counts_commits() {
    let decoded = content(json!({
        "type": "system",
        "system": {
            "systemType": 4,
            "gitpush": {
                "team": "family",
                "pusher": "alice",
                "repoName": "dotfiles",
                "pushType": 0,
                "refs": [{"refName": "refs/heads/main", "commits": [{}, {}]}]
            }
        }
    }));
    match decoded {
        EventContent::SystemNotice(notice) => assert_eq!(
            notice.render(),
            "git (dotfiles): alice pushed 2 commits to refs/heads/main"
        ),
        other => panic!("unexpected content: {other:?}"),
    }
}

#[test]
fn test_system_new_channel_counts_conversations() {
    let decoded = content(json!({
        "type": "system",
        "system": {
            "systemType": 9,
            "newchannel": {"creator": "alice", "nameAtCreation": "random", "convIDs": ["a", "b"]}
        }
    }));
    assert!(matches!(
        decoded,
        EventContent::SystemNotice(SystemNotice::NewChannel { count: 2, .. })
    ));
}

#[test]
fn test_unrendered_system_type_is_other() {
    let decoded = content(json!({
        "type": "system",
        "system": {"systemType": 8, "sbsresolve": {}}
    }));
    assert_eq!(
        decoded,
        EventContent::SystemNotice(SystemNotice::Other { system_type: 8 })
    );
}

#[test]
fn test_system_missing_body_is_malformed() {
    assert_eq!(
        content(json!({"type": "system", "system": {"systemType": 3}})),
        EventContent::Malformed {
            kind: "system".into()
        }
    );
}
