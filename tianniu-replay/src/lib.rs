//! The tianniu session-replay integration.
//!
//! The `SessionReplayIntegration` records what the user did on the page and,
//! when an error happens, reports the last few seconds leading up to it.
//!
//! Recorded events are kept in an [`EventSegments`] buffer.  The recorder
//! periodically emits *checkpoints*, full snapshots of the page, and every
//! checkpoint opens a new segment.  The buffer is capped; the oldest events
//! are evicted first.
//!
//! # Configuration
//!
//! ```
//! use std::time::Duration;
//!
//! let integration = tianniu_replay::SessionReplayIntegration::new()
//!     .with_window(Duration::from_secs(5))
//!     .with_max_events(500);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod buffer;
mod integration;

pub use crate::buffer::EventSegments;
pub use crate::integration::{Phase, SessionReplayIntegration};
