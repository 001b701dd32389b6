//! The browser host of the tianniu SDK.
//!
//! This crate implements [`Host`](tianniu_core::Host) on top of the DOM for
//! `wasm32` targets: hit-testing, global event listeners, the beacon, fetch
//! and image delivery mechanisms, a `PerformanceObserver` based Web Vitals
//! source and a bridge to the rrweb recorder.
//!
//! On every other target this crate is empty.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! let host = tianniu_web::WebHost::new().with_recorder(record_fn);
//! let _guard = tianniu::init(Arc::new(host), "https://monitor.example.com/tracing/app");
//! ```

#![warn(missing_docs)]

#[cfg(target_arch = "wasm32")]
mod delivery;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod recorder;
#[cfg(target_arch = "wasm32")]
mod vitals;

#[cfg(target_arch = "wasm32")]
pub use crate::delivery::{WebBeacon, WebFetch, WebImage};
#[cfg(target_arch = "wasm32")]
pub use crate::host::WebHost;
#[cfg(target_arch = "wasm32")]
pub use crate::recorder::RrwebRecorder;
#[cfg(target_arch = "wasm32")]
pub use crate::vitals::ObserverVitals;
