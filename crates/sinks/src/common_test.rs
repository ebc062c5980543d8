//! Tests for common sink types and utilities

use crate::{SinkError, SinkMetrics};

#[test]
fn test_metrics_new() {
    let snapshot = SinkMetrics::new().snapshot();

    assert_eq!(snapshot.records_written, 0);
    assert_eq!(snapshot.batches_written, 0);
    assert_eq!(snapshot.bytes_written, 0);
    assert_eq!(snapshot.write_errors, 0);
    assert_eq!(snapshot.flush_count, 0);
}

#[test]
fn test_metrics_single_and_batch_writes() {
    let metrics = SinkMetrics::new();

    metrics.record_written(120);
    metrics.batch_written(300, 36_000);
    metrics.batch_written(2, 240);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.records_written, 303);
    assert_eq!(snapshot.batches_written, 2);
    assert_eq!(snapshot.bytes_written, 36_360);
}

#[test]
fn test_metrics_errors_and_flushes() {
    let metrics = SinkMetrics::new();

    metrics.write_error();
    metrics.flush();
    metrics.flush();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.write_errors, 1);
    assert_eq!(snapshot.flush_count, 2);
}

#[test]
fn test_error_display() {
    assert!(
        SinkError::connection("elasticsearch is down")
            .to_string()
            .contains("elasticsearch is down")
    );
    assert_eq!(
        SinkError::NotOpen("archive".into()).to_string(),
        "sink 'archive' is not open"
    );
}

#[test]
fn test_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: SinkError = io.into();
    assert!(matches!(err, SinkError::Io(_)));
}
