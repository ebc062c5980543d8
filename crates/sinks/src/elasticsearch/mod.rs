//! Elasticsearch Sink - one document per exported record
//!
//! Records are indexed with `_id` set to the message id, so re-running an
//! export overwrites documents instead of duplicating them. History chunks go
//! through the `_bulk` API; live records are indexed one at a time.
//!
//! # Index Naming
//!
//! The index name comes from `index_pattern` with `$channelname$` replaced by
//! the channel display name (`#` becomes `__`), lowercased since Elasticsearch
//! rejects uppercase index names:
//!
//! ```text
//! scribe_$channelname$  +  Family#General  ->  scribe_family__general
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use scribe_protocol::{Channel, ExportRecord};
use serde::Deserialize;
use serde_json::Value;

use crate::common::{MetricsSnapshot, SinkError, SinkMetrics};
use crate::traits::Sink;

/// Placeholder replaced by the channel name in `index_pattern`
pub const CHANNEL_PLACEHOLDER: &str = "$channelname$";

/// Configuration for the Elasticsearch sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticsearchConfig {
    /// Cluster base URL
    pub url: String,

    /// Index name pattern containing `$channelname$`
    pub index_pattern: String,

    /// Basic auth user
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_pattern: format!("scribe_{CHANNEL_PLACEHOLDER}"),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Elasticsearch sink
pub struct ElasticsearchSink {
    name: String,
    config: ElasticsearchConfig,
    client: Client,
    metrics: Arc<SinkMetrics>,
}

impl ElasticsearchSink {
    /// Create a new Elasticsearch sink
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (TLS backend failure)
    pub fn new(name: impl Into<String>, config: ElasticsearchConfig) -> Result<Self, SinkError> {
        let client = Client::builder()
            .user_agent(concat!("scribe/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::init(format!("elasticsearch HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            config,
            client,
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, SinkError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| SinkError::connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SinkError::connection(e.to_string()))?;

        if !status.is_success() {
            return Err(SinkError::write(format!(
                "elasticsearch returned {status}: {}",
                truncate(&body, 512)
            )));
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Sink for ElasticsearchSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "elasticsearch"
    }

    async fn init(&self) -> Result<(), SinkError> {
        let response = self
            .authorize(self.client.get(self.endpoint("")))
            .send()
            .await
            .map_err(|e| SinkError::connection(format!("elasticsearch is down: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(SinkError::connection(format!(
                "elasticsearch is down: ping returned {}",
                response.status()
            )));
        }

        tracing::info!(sink = %self.name, url = %self.config.url, "elasticsearch reachable");
        Ok(())
    }

    async fn write(&self, channel: &Channel, record: &ExportRecord) -> Result<(), SinkError> {
        let index = index_name(&self.config.index_pattern, &channel.display_name());
        let body = serde_json::to_vec(record)?;
        let bytes = body.len() as u64;

        let request = self
            .client
            .put(self.endpoint(&format!("{index}/_doc/{}", record.id)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        if let Err(e) = self.send(request).await {
            self.metrics.write_error();
            return Err(e);
        }
        self.metrics.record_written(bytes);
        Ok(())
    }

    async fn write_batch(
        &self,
        channel: &Channel,
        records: &[ExportRecord],
    ) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        let index = index_name(&self.config.index_pattern, &channel.display_name());
        let body = bulk_body(records)?;
        let bytes = body.len() as u64;

        let request = self
            .client
            .post(self.endpoint(&format!("{index}/_bulk")))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);

        let result = match self.send(request).await {
            Ok(response) => match bulk_failure(&response) {
                Some(reason) => Err(SinkError::write(format!("bulk index into {index}: {reason}"))),
                None => Ok(()),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.metrics.batch_written(records.len() as u64, bytes);
                tracing::debug!(sink = %self.name, index = %index, count = records.len(), "bulk indexed");
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(e)
            }
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            records = snapshot.records_written,
            batches = snapshot.batches_written,
            errors = snapshot.write_errors,
            "elasticsearch sink closed"
        );
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Index name for a channel
pub fn index_name(pattern: &str, channel_name: &str) -> String {
    pattern
        .replace(CHANNEL_PLACEHOLDER, &channel_name.replace('#', "__"))
        .to_lowercase()
}

/// NDJSON body for the `_bulk` API: an action line then the document, per record
pub fn bulk_body(records: &[ExportRecord]) -> Result<Vec<u8>, SinkError> {
    let mut body = Vec::with_capacity(records.len() * 300);
    for record in records {
        serde_json::to_writer(
            &mut body,
            &serde_json::json!({ "index": { "_id": record.id.to_string() } }),
        )?;
        body.push(b'\n');
        serde_json::to_writer(&mut body, record)?;
        body.push(b'\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

/// First item error of a `_bulk` response, if the response reports any
pub fn bulk_failure(response: &Value) -> Option<String> {
    let parsed = BulkResponse::deserialize(response).ok()?;
    if !parsed.errors {
        return None;
    }

    let mut failed = parsed.items.iter().filter_map(|item| {
        let action = item.as_object()?.values().next()?;
        action.get("error").map(|error| {
            let id = action.get("_id").and_then(Value::as_str).unwrap_or("?");
            let reason = error
                .get("reason")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), String::from);
            format!("document {id}: {reason}")
        })
    });

    let first = failed
        .next()
        .unwrap_or_else(|| "response reported errors".to_string());
    let rest = failed.count();
    if rest > 0 {
        Some(format!("{first} (and {rest} more)"))
    } else {
        Some(first)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
