//! Scribe - Sinks
//!
//! Persistent writers for exported records. Every committed `ExportRecord` is
//! replicated to each configured sink by the pipeline's fan-out writer.
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `jsonl` | One JSON object per line, `channel_name` injected |
//! | `elasticsearch` | One index per channel, bulk writes for history chunks |
//! | `stdout` | Human-readable debug output |
//!
//! # Example
//!
//! ```ignore
//! use scribe_sinks::{JsonlConfig, JsonlSink, Sink};
//!
//! let sink = JsonlSink::new("archive", JsonlConfig::default());
//! sink.init().await?;
//! sink.write_batch(&channel, &records).await?;
//! sink.close().await?;
//! ```

/// JSONL sink - newline-delimited JSON file
pub mod jsonl;

/// Elasticsearch sink - document per record
pub mod elasticsearch;

/// Stdout sink - human-readable debug output
pub mod stdout;

/// Common types shared by all sinks (errors, metrics)
mod common;

mod traits;

pub use common::{MetricsSnapshot, SinkError, SinkMetrics};
pub use traits::Sink;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchSink};
pub use jsonl::{JsonlConfig, JsonlSink};
pub use stdout::{StdoutConfig, StdoutSink};
