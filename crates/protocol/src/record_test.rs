//! Tests for export record construction and JSON shape

use crate::event::{RawEvent, Sender};
use crate::record::{AttachmentInfo, ExportRecord};

fn sender() -> Sender {
    Sender {
        uid: "u1".into(),
        username: Some("alice".into()),
        device_id: "d1".into(),
        device_name: Some("laptop".into()),
    }
}

#[test]
fn test_from_event_copies_identity() {
    let event = RawEvent::text(42, sender(), "hello").sent_at(1_600_000_000);
    let record = ExportRecord::from_event(&event);

    assert_eq!(record.id, 42);
    assert_eq!(record.sent_at, 1_600_000_000);
    assert_eq!(record.sender_uid, "u1");
    assert_eq!(record.sender_username.as_deref(), Some("alice"));
    assert_eq!(record.device_id, "d1");
    assert!(record.text.is_none());
    assert!(!record.edited);
}

#[test]
fn test_apply_edit_replaces_device_identity() {
    let event = RawEvent::text(1, sender(), "hello");
    let mut record = ExportRecord::from_event(&event);

    record.apply_edit("hello!".into(), "d2".into(), Some("phone".into()));

    assert_eq!(record.text.as_deref(), Some("hello!"));
    assert_eq!(record.device_id, "d2");
    assert_eq!(record.device_name.as_deref(), Some("phone"));
    assert_eq!(record.sender_uid, "u1");
    assert!(record.edited);
}

#[test]
fn test_json_omits_absent_fields_and_false_markers() {
    let event = RawEvent::text(7, sender(), "hi").sent_at(10);
    let mut record = ExportRecord::from_event(&event);
    record.text = Some("hi".into());

    let json: serde_json::Value = serde_json::to_value(&record).unwrap();
    let object = json.as_object().unwrap();

    assert_eq!(object["id"], 7);
    assert_eq!(object["text"], "hi");
    assert_eq!(object["sender_uid"], "u1");
    for absent in ["reply_to", "attachment", "reactions", "edited", "special", "system", "revoked_device"] {
        assert!(!object.contains_key(absent), "{absent} should be omitted");
    }
}

#[test]
fn test_json_includes_attachment_and_markers() {
    let event = RawEvent::text(8, sender(), "");
    let mut record = ExportRecord::from_event(&event);
    record.attachment = Some(AttachmentInfo {
        path: "/tmp/cat.png".into(),
        filename: "cat.png".into(),
        asset_type: Some("image".into()),
    });
    record.edited = true;

    let json: serde_json::Value = serde_json::to_value(&record).unwrap();
    assert_eq!(json["attachment"]["filename"], "cat.png");
    assert_eq!(json["attachment"]["asset_type"], "image");
    assert_eq!(json["edited"], true);
    assert!(record.has_attachment());
}
