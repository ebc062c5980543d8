//! Scribe - Transport
//!
//! The chat transport capability consumed by the export pipeline. A transport
//! lists channels, reads history pages newest-first, delivers live events and
//! downloads attachment bytes. Authentication and the wire format belong to
//! the adapter, never to the pipeline.
//!
//! # Available Transports
//!
//! - **Keybase** - Drives the `keybase chat api` JSON API of a running service
//! - **Memory** - Scripted in-process transport for tests and dry runs
//!
//! # Feature Flags
//!
//! ```toml
//! [dependencies]
//! scribe-transport = { version = "0.1", default-features = false }
//! ```
//!
//! Available features:
//! - `keybase` (default) - Keybase CLI adapter
//!
//! # Example
//!
//! ```ignore
//! use scribe_transport::{PageRequest, Transport, PAGE_SIZE};
//!
//! let channels = transport.list().await?;
//! let page = transport
//!     .read(&channels[0], PageRequest::first(PAGE_SIZE))
//!     .await?;
//! ```

mod error;
pub mod memory;
mod traits;

#[cfg(feature = "keybase")]
mod keybase;

pub use error::TransportError;
pub use traits::{LiveItem, Page, PageRequest, Subscription, Transport};

#[cfg(feature = "keybase")]
pub use keybase::{KeybaseConfig, KeybaseTransport};

/// Page size ceiling for history reads
///
/// Kept well below the size at which large history reads start failing on the
/// Keybase service.
pub const PAGE_SIZE: usize = 300;

/// Buffer size for live subscription channels
pub const SUBSCRIPTION_BUFFER: usize = 1024;
