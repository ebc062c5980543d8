//! Scribe Protocol - Core types flowing through the export pipeline
//!
//! This crate provides the data model shared by the transport, the pipeline
//! and the sinks:
//! - `RawEvent` - One event as delivered by the chat transport
//! - `EventContent` - Tagged union over text, attachment, reaction, edit, delete, ...
//! - `ExportRecord` - The immutable output unit handed to sinks
//! - `Channel` / `ChannelQuery` - Channel identity and query matching
//! - `Cursor` - Opaque pagination token
//!
//! # Design Principles
//!
//! - **Transport agnostic**: No wire format lives here, adapters decode into these types
//! - **Immutable output**: `ExportRecord` is never mutated once handed to a sink
//! - **Stable JSON**: Record field names are the on-disk export format

mod channel;
mod cursor;
mod error;
mod event;
mod record;
mod system;

pub use channel::{Channel, ChannelQuery};
pub use cursor::Cursor;
pub use error::QueryError;
pub use event::{
    AttachmentContent, DeleteContent, EditContent, EventContent, MessageId, RawEvent,
    ReactionContent, Reactions, Sender, TextContent,
};
pub use record::{AttachmentInfo, ExportRecord};
pub use system::{GitRef, RetentionPolicy, SystemNotice, TeamRole};

#[cfg(test)]
mod record_test;
#[cfg(test)]
mod system_test;
