//! This crate provides common types for working with the tianniu monitoring
//! protocol.  It is used by the monitoring SDK and can be used by ingestion
//! services to share the payload definitions.
//!
//! ## Contents
//!
//! The crate provides the destination type ([`Dsn`]) and the report
//! payloads in the [`protocol`] module.  All payloads serialize to flat JSON
//! objects keyed by `event_type`:
//!
//! ```rust
//! use tianniu_types::protocol::{Payload, WhiteScreenPayload};
//!
//! let payload = Payload::WhiteScreen(WhiteScreenPayload {
//!     path: "/".into(),
//! });
//! assert_eq!(payload.event_type(), "whiteScreen");
//! ```
#![warn(missing_docs)]

mod dsn;
pub mod protocol;

pub use crate::dsn::*;

// Re-export external types for convenience
pub use url::Url;
