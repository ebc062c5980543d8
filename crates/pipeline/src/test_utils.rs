//! Shared test fixtures: events, a recording sink, a failing sink

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use scribe_protocol::{AttachmentContent, Channel, EventContent, ExportRecord, RawEvent, Sender};
use scribe_sinks::{MetricsSnapshot, Sink, SinkError, SinkMetrics};

pub fn alice() -> Sender {
    Sender {
        uid: "u-alice".into(),
        username: Some("alice".into()),
        device_id: "d-laptop".into(),
        device_name: Some("laptop".into()),
    }
}

pub fn alice_phone() -> Sender {
    Sender {
        device_id: "d-phone".into(),
        device_name: Some("phone".into()),
        ..alice()
    }
}

pub fn text(id: u64, body: &str) -> RawEvent {
    RawEvent::text(id, alice(), body).sent_at(1_600_000_000 + id as i64)
}

pub fn edit(id: u64, target: u64, body: &str) -> RawEvent {
    RawEvent::edit(id, alice_phone(), target, body)
}

pub fn delete(id: u64, targets: &[u64]) -> RawEvent {
    RawEvent::delete(id, alice(), targets.to_vec())
}

pub fn attachment(id: u64, filename: &str, title: &str) -> RawEvent {
    RawEvent::with_content(
        id,
        alice(),
        EventContent::Attachment(AttachmentContent {
            filename: filename.into(),
            title: title.into(),
            path: format!("/keybase/uploads/{filename}"),
            asset_type: Some("image".into()),
        }),
    )
}

pub fn channel() -> Channel {
    Channel::new("c-1", "alice,bob")
}

/// What a sink saw, shared with the test after the sink moves into a writer
#[derive(Debug, Default)]
pub struct Recorded {
    pub inits: usize,
    pub closes: usize,
    pub writes: Vec<(String, ExportRecord)>,
    pub batches: Vec<(String, Vec<ExportRecord>)>,
}

impl Recorded {
    pub fn written_ids(&self) -> Vec<u64> {
        self.writes.iter().map(|(_, r)| r.id).collect()
    }

    pub fn batch_ids(&self) -> Vec<Vec<u64>> {
        self.batches
            .iter()
            .map(|(_, records)| records.iter().map(|r| r.id).collect())
            .collect()
    }
}

/// Sink that keeps everything in memory and can be told to fail
pub struct RecordingSink {
    name: String,
    recorded: Arc<Mutex<Recorded>>,
    failing: Arc<AtomicBool>,
    metrics: SinkMetrics,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            recorded: Arc::new(Mutex::new(Recorded::default())),
            failing: Arc::new(AtomicBool::new(false)),
            metrics: SinkMetrics::new(),
        }
    }

    pub fn failing(name: &str) -> Self {
        let sink = Self::new(name);
        sink.failing.store(true, Ordering::Relaxed);
        sink
    }

    pub fn recorded(&self) -> Arc<Mutex<Recorded>> {
        Arc::clone(&self.recorded)
    }

    pub fn fail_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failing)
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.failing.load(Ordering::Relaxed) {
            self.metrics.write_error();
            return Err(SinkError::write(format!("{} is failing", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn init(&self) -> Result<(), SinkError> {
        self.check()?;
        self.recorded.lock().inits += 1;
        Ok(())
    }

    async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<(), SinkError> {
        self.check()?;
        self.metrics.record_written(0);
        self.recorded
            .lock()
            .writes
            .push((channel.display_name(), record.clone()));
        Ok(())
    }

    async fn write_batch(
        &self,
        channel: &Channel,
        records: &[ExportRecord],
    ) -> Result<(), SinkError> {
        self.check()?;
        self.metrics.batch_written(records.len() as u64, 0);
        self.recorded
            .lock()
            .batches
            .push((channel.display_name(), records.to_vec()));
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.recorded.lock().closes += 1;
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
