//! This crate provides support for monitoring web pages: uncaught errors,
//! performance metrics, white screens and replays of the user session that
//! led to an error.
//!
//! # Quickstart
//!
//! The most convenient way to use this library is via the [`init`]
//! function, which starts a monitor for a page and binds it as the current
//! one.  The page is described by a [`Host`]; in the browser this is the
//! `WebHost` of the `tianniu-web` crate, which is re-exported as
//! [`WebHost`] when compiling for `wasm32`.
//!
//! ```ignore
//! let _guard = tianniu::init(
//!     std::sync::Arc::new(tianniu::WebHost::new()),
//!     ("http://localhost:3000/tracing/fewjonqks", tianniu::MonitoringOptions {
//!         watch_white_screen: true,
//!         record_user_error: true,
//!         ..Default::default()
//!     }),
//! );
//!
//! tianniu::report_message("checkout page loaded");
//! ```
//!
//! The guard must be kept alive for as long as the page should be
//! observed.  Once it is dropped the monitor is unbound and its transport
//! shuts down.
//!
//! # Integrations
//!
//! What is observed is decided by integrations.  Custom integrations are
//! added with [`MonitoringOptions::add_integration`]; the built-in ones are
//! appended by [`apply_defaults`] depending on the options.  See
//! [`integrations`] for the list.
//!
//! # Features
//!
//! Additional functionality can be turned on using feature flags.
//!
//! **Default features:**
//! - `errors`: Captures uncaught errors and unhandled rejections.
//! - `performance`: Reports Web Vitals and the page load time.
//! - `white-screen`: Detects pages that stay blank after loading.
//! - `replay`: Sends the user session leading up to an error.
//! - `transport`: Native delivery mechanisms backed by `reqwest`.
//!
//! **Additional features:**
//! - `debug-logs`: Sends SDK-internal diagnostics to the `log` crate.
//! - `test`: Exposes the test helpers of `tianniu-core`.
//! - `rustls`: Uses `rustls` instead of `native-tls` for `reqwest`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

mod boundary;
mod defaults;
mod init;
pub mod transports;

// re-export from core
#[doc(inline)]
pub use tianniu_core::*;

// added public API
pub use crate::boundary::{ComponentError, ErrorBoundary};
pub use crate::defaults::apply_defaults;
pub use crate::init::{init, MonitorInitGuard};

#[cfg(target_arch = "wasm32")]
#[doc(inline)]
pub use tianniu_web::WebHost;

/// Available integrations.
///
/// Each built-in integration lives in its own crate and is behind a crate
/// feature of the same name.  [`apply_defaults`](crate::apply_defaults)
/// appends them after the custom integrations:
///
/// - `performance` and `errors` when `default_integrations` is set,
/// - `white_screen` when `watch_white_screen` is set,
/// - `replay` when `record_user_error` is set.
///
/// They can also be added by hand, for instance to tune the replay buffer:
///
/// ```
/// # #[cfg(feature = "replay")] {
/// use std::time::Duration;
/// use tianniu::integrations::replay::SessionReplayIntegration;
///
/// let options = tianniu::MonitoringOptions::default()
///     .add_integration(SessionReplayIntegration::new().with_window(Duration::from_secs(30)));
/// # }
/// ```
pub mod integrations {
    #[cfg(feature = "errors")]
    #[doc(inline)]
    pub use tianniu_errors as errors;
    #[cfg(feature = "performance")]
    #[doc(inline)]
    pub use tianniu_vitals as performance;
    #[cfg(feature = "replay")]
    #[doc(inline)]
    pub use tianniu_replay as replay;
    #[cfg(feature = "white-screen")]
    #[doc(inline)]
    pub use tianniu_white_screen as white_screen;
}
