//! Delivery mechanisms a host can expose.
//!
//! The [`BrowserTransport`](crate::BrowserTransport) probes these in a fixed
//! order: beacon, then fetch, then the image request fallback.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::DeliveryError;
use crate::types::Url;

/// An unload-safe send: the host promises to attempt delivery even while
/// the page is torn down.
pub trait Beacon: Send + Sync {
    /// Queues `body` for delivery to `url`.
    ///
    /// Returns `false` if the host refused to queue the data.
    fn send_beacon(&self, url: &Url, body: String) -> bool;

    /// Waits until queued beacons were handed off.
    fn flush(&self, timeout: Duration) -> bool {
        let _ = timeout;
        true
    }
}

/// A request issued through a [`Fetch`] mechanism.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// The destination.
    pub url: Url,
    /// The value of the `Content-Type` header.
    pub content_type: &'static str,
    /// The request body.
    pub body: String,
    /// Whether the request may outlive the page.
    pub keepalive: bool,
}

impl FetchRequest {
    /// A keepalive `POST` of a JSON body.
    pub fn json(url: Url, body: String) -> Self {
        FetchRequest {
            url,
            content_type: "application/json",
            body,
            keepalive: true,
        }
    }
}

/// A fetch-style request API.
///
/// Only synchronous failures are returned; network failures of the
/// in-flight request are caught and discarded by the implementation.
pub trait Fetch: Send + Sync {
    /// Issues a `POST` request without waiting for its completion.
    fn fetch(&self, request: FetchRequest) -> Result<(), DeliveryError>;

    /// Waits until in-flight requests completed.
    fn flush(&self, timeout: Duration) -> bool {
        let _ = timeout;
        true
    }
}

/// The legacy fallback: loading an image from a URL carrying the data.
pub trait ImagePixel: Send + Sync {
    /// Starts a `GET` request for `src`.
    fn load_image(&self, src: Url) -> Result<(), DeliveryError>;

    /// Waits until in-flight requests completed.
    fn flush(&self, timeout: Duration) -> bool {
        let _ = timeout;
        true
    }
}

/// Identifies a delivery mechanism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MechanismKind {
    /// [`Beacon`]
    Beacon,
    /// [`Fetch`]
    Fetch,
    /// [`ImagePixel`]
    Image,
}

/// The set of delivery mechanisms a host supports.
#[derive(Clone, Default)]
pub struct Capabilities {
    /// The unload-safe beacon API.
    pub beacon: Option<Arc<dyn Beacon>>,
    /// The fetch API.
    pub fetch: Option<Arc<dyn Fetch>>,
    /// The image request fallback.
    pub image: Option<Arc<dyn ImagePixel>>,
}

impl Capabilities {
    /// Capabilities without any mechanism.
    pub fn none() -> Self {
        Capabilities::default()
    }

    /// Adds the beacon mechanism.
    #[must_use]
    pub fn with_beacon(mut self, beacon: Arc<dyn Beacon>) -> Self {
        self.beacon = Some(beacon);
        self
    }

    /// Adds the fetch mechanism.
    #[must_use]
    pub fn with_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Adds the image request mechanism.
    #[must_use]
    pub fn with_image(mut self, image: Arc<dyn ImagePixel>) -> Self {
        self.image = Some(image);
        self
    }

    /// The mechanism a send would use: the first available one.
    pub fn preferred(&self) -> Option<MechanismKind> {
        if self.beacon.is_some() {
            Some(MechanismKind::Beacon)
        } else if self.fetch.is_some() {
            Some(MechanismKind::Fetch)
        } else if self.image.is_some() {
            Some(MechanismKind::Image)
        } else {
            None
        }
    }

    /// Flushes all available mechanisms.
    ///
    /// The timeout is shared: each mechanism only gets the time the ones
    /// before it left over.  Returns `true` if every mechanism flushed
    /// within the timeout.
    pub fn flush(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let remaining = || deadline.saturating_duration_since(Instant::now());

        let mut flushed = true;
        if let Some(ref beacon) = self.beacon {
            flushed &= beacon.flush(remaining());
        }
        if let Some(ref fetch) = self.fetch {
            flushed &= fetch.flush(remaining());
        }
        if let Some(ref image) = self.image {
            flushed &= image.flush(remaining());
        }
        flushed
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("beacon", &self.beacon.is_some())
            .field("fetch", &self.fetch.is_some())
            .field("image", &self.image.is_some())
            .finish()
    }
}
