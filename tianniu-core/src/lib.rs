//! This crate provides the core of the tianniu monitoring SDK.
//!
//! `tianniu-core` is meant for integration authors and host authors that
//! want to observe a page and report on it.  Regular users should use the
//! [`tianniu`] crate instead, which comes with the default transport and
//! the built-in integrations.
//!
//! # Core Concepts
//!
//! Everything the SDK observes is reached through a [`Host`], which stands
//! in for the monitored page.  A [`Monitor`] owns the [`MonitoringOptions`]
//! and initializes the configured [`Integration`]s, handing each of them
//! the shared [`Transport`].  Integrations attach listeners to the host and
//! build [`Payload`](protocol::Payload)s when they trigger.
//!
//! The [`BrowserTransport`] delivers payloads through the best mechanism
//! the host offers, see the [`delivery`] module.
//!
//! # Features
//!
//! - `feature = "test"`: Activates the [`test`] module, which can be used to
//!   write integration tests.  It comes with a test transport capturing all
//!   payloads and a scriptable test page.
//! - `feature = "debug-logs"`: Uses the `log` crate for debug output, instead
//!   of printing to `stderr`.
//!
//! [`tianniu`]: https://crates.io/crates/tianniu
//! [`test`]: test/index.html

#![warn(missing_docs)]

// macros; these need to be first to be used by other modules
#[macro_use]
mod macros;

mod api;
mod constants;
pub mod delivery;
mod error;
mod host;
mod integration;
mod intodsn;
mod monitor;
mod options;
pub mod record;
mod transport;

// public api or exports from this crate
pub use crate::api::*;
pub use crate::constants::*;
pub use crate::delivery::{Capabilities, MechanismKind};
pub use crate::error::{
    ConfigError, DeliveryError, IntegrationError, RecordError, TransportError,
};
pub use crate::host::{
    guard_listener, is_page_ready, ElementInfo, ErrorEvent, Host, HostEvent, HostEventKind,
    Listener, ListenerOptions, MetricCallback, MetricSample, NavigationTiming, ReadyState,
    Reason, RejectionEvent, ScriptError, Viewport, WebVitalsSource,
};
pub use crate::integration::Integration;
pub use crate::intodsn::IntoDsn;
pub use crate::macros::debug_enabled;
pub use crate::monitor::Monitor;
pub use crate::options::{MonitorConfig, MonitoringOptions};
pub use crate::record::Recorder;
pub use crate::transport::{BrowserTransport, Transport, TransportFactory};


#[cfg(feature = "debug-logs")]
#[doc(hidden)]
pub use log as __log;

// public api from other crates
#[doc(inline)]
pub use tianniu_types as types;
pub use tianniu_types::protocol;
