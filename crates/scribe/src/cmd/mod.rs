//! Command implementations for the Scribe CLI

pub mod channels;
pub mod export;
