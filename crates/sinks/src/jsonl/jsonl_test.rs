//! JSONL sink tests

use scribe_protocol::{Channel, ExportRecord, RawEvent, Sender};
use tempfile::TempDir;

use super::{JsonlConfig, JsonlSink};
use crate::{Sink, SinkError};

fn record(id: u64, text: &str) -> ExportRecord {
    let sender = Sender {
        uid: "u1".into(),
        username: Some("alice".into()),
        device_id: "d1".into(),
        device_name: None,
    };
    let mut record = ExportRecord::from_event(&RawEvent::text(id, sender, text).sent_at(100));
    record.text = Some(text.to_string());
    record
}

fn channel() -> Channel {
    Channel::new("c2", "family").with_topic("general")
}

// =============================================================================
// Config tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = JsonlConfig::default();
    assert_eq!(config.eol, "\n");
    assert!(!config.append);
}

#[test]
fn test_config_builders() {
    let config = JsonlConfig::default()
        .with_path("/data/out.jsonl")
        .with_eol("\r\n")
        .appending();
    assert_eq!(config.path, std::path::PathBuf::from("/data/out.jsonl"));
    assert_eq!(config.eol, "\r\n");
    assert!(config.append);
}

// =============================================================================
// Writing
// =============================================================================

#[tokio::test]
async fn test_write_batch_injects_channel_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.jsonl");
    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path));

    sink.init().await.unwrap();
    sink.write_batch(&channel(), &[record(2, "second"), record(1, "first")])
        .await
        .unwrap();
    sink.close().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["id"], 2);
    assert_eq!(first["text"], "second");
    assert_eq!(first["channel_name"], "family#general");
    assert!(first.get("edited").is_none());
    assert!(content.ends_with('\n'));
}

#[tokio::test]
async fn test_custom_eol_terminates_every_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.jsonl");
    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path).with_eol("\r\n"));

    sink.init().await.unwrap();
    sink.write_batch(&channel(), &[record(1, "a"), record(2, "b")])
        .await
        .unwrap();
    sink.write(&channel(), &record(3, "c")).await.unwrap();
    sink.close().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("\r\n").count(), 3);
    assert!(content.ends_with("\r\n"));
}

#[tokio::test]
async fn test_single_write_is_flushed_immediately() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("live.jsonl");
    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path));

    sink.init().await.unwrap();
    sink.write(&channel(), &record(9, "live")).await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"id\":9"));

    let metrics = sink.metrics();
    assert_eq!(metrics.records_written, 1);
    assert_eq!(metrics.batches_written, 0);
}

#[tokio::test]
async fn test_empty_batch_is_noop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.jsonl");
    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path));

    sink.init().await.unwrap();
    sink.write_batch(&channel(), &[]).await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    assert_eq!(sink.metrics().flush_count, 0);
}

#[tokio::test]
async fn test_truncates_by_default_and_appends_when_asked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("export.jsonl");
    std::fs::write(&path, "old line\n").unwrap();

    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path));
    sink.init().await.unwrap();
    sink.write(&channel(), &record(1, "a")).await.unwrap();
    sink.close().await.unwrap();
    assert!(!std::fs::read_to_string(&path).unwrap().contains("old line"));

    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path).appending());
    sink.init().await.unwrap();
    sink.write(&channel(), &record(2, "b")).await.unwrap();
    sink.close().await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[tokio::test]
async fn test_init_creates_parent_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/export.jsonl");
    let sink = JsonlSink::new("archive", JsonlConfig::default().with_path(&path));

    sink.init().await.unwrap();
    sink.close().await.unwrap();
    assert!(path.exists());
}

#[tokio::test]
async fn test_write_before_init_fails() {
    let dir = TempDir::new().unwrap();
    let sink = JsonlSink::new(
        "archive",
        JsonlConfig::default().with_path(dir.path().join("x.jsonl")),
    );

    let err = sink.write(&channel(), &record(1, "a")).await.unwrap_err();
    assert!(matches!(err, SinkError::NotOpen(name) if name == "archive"));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let sink = JsonlSink::new(
        "archive",
        JsonlConfig::default().with_path(dir.path().join("x.jsonl")),
    );
    sink.init().await.unwrap();
    sink.close().await.unwrap();
    sink.close().await.unwrap();
    assert_eq!(sink.kind(), "jsonl");
}
