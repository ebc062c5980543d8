//! Scribe - Pipeline
//!
//! Turns a mutable chat log (messages plus later edit and delete events) into
//! an ordered stream of final records, replicated to every configured sink.
//!
//! # Architecture
//!
//! ```text
//!                  ┌─→ HistoryReader ──→ AlterationResolver ──┐
//! [Transport] ─────┤   (newest-first)     (first seen wins)   ├──→ FanOutWriter ──→ Sinks
//!                  └─→ LiveWatcher ─────→ WatchBuffer ────────┘     (join_all)
//!                      (arrival order)    (quiescence timers)
//!                                                 │
//!                              attachment records └──→ AttachmentFetcher (background)
//! ```
//!
//! # Key Design
//!
//! - **Reverse-order reconciliation**: history arrives newest-first, so
//!   alterations are recorded before the message they target
//! - **Quiescence window**: live messages wait in a `DelayQueue` so edits and
//!   deletes that follow shortly after are folded in before export
//! - **All-or-nothing fan-out**: a write succeeds only if every sink accepts it
//! - **Decoupled downloads**: attachments never block the record stream, but
//!   are drained before shutdown
//! - **Sequential channels**: channels are backfilled one after another, live
//!   watchers run as tasks alongside
//!
//! # Example
//!
//! ```ignore
//! use scribe_pipeline::{FanOutWriter, Pipeline, PipelineOptions};
//!
//! let writer = Arc::new(FanOutWriter::new(sinks));
//! writer.init().await?;
//!
//! let mut pipeline = Pipeline::new(transport, Arc::clone(&writer), None, PipelineOptions::default());
//! pipeline.run(&config.chats).await?;
//! pipeline.shutdown().await?;
//! writer.close().await?;
//! ```

mod alteration;
mod attachments;
mod backfill;
mod error;
mod fanout;
mod normalize;
mod orchestrator;
mod watch_buffer;
mod watcher;

pub use alteration::{AlterationResolver, AlterationState};
pub use attachments::{AttachmentFetcher, AttachmentJob, AttachmentQueue, FetchSummary, destination};
pub use backfill::HistoryReader;
pub use error::{PipelineError, Result, SinkFailure};
pub use fanout::FanOutWriter;
pub use normalize::{NormalizeOptions, Normalizer, attachment_text};
pub use orchestrator::{ChannelSummary, Pipeline, PipelineOptions, RunSummary};
pub use watch_buffer::WatchBuffer;
pub use watcher::{LiveWatcher, WatchSummary};

// Test modules - only compiled during testing
#[cfg(test)]
mod test_utils;
