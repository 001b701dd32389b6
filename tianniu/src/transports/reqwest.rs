use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client as ReqwestClient};
use tianniu_core::delivery::{Beacon, Capabilities, Fetch, FetchRequest, ImagePixel};
use tianniu_core::types::Url;
use tianniu_core::{tianniu_debug, DeliveryError};

use super::thread::TransportThread;

/// Requests of the default client give up after this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

enum Request {
    Post {
        url: Url,
        content_type: &'static str,
        body: String,
    },
    Get {
        url: Url,
    },
}

/// Native delivery mechanisms backed by the [`reqwest`] library.
///
/// All requests are issued from one background thread.  The queue in
/// front of it is bounded: once it is full, beacons are rejected and
/// fetch or image requests fail synchronously.  Network failures are
/// logged and never retried.
///
/// Hosts that do not run inside a browser can expose these mechanisms
/// through [`capabilities`](ReqwestNetwork::capabilities).
///
/// [`reqwest`]: https://crates.io/crates/reqwest
#[cfg_attr(doc_cfg, doc(cfg(feature = "reqwest")))]
pub struct ReqwestNetwork {
    thread: TransportThread<Request>,
}

#[cfg_attr(doc_cfg, doc(cfg(feature = "reqwest")))]
impl ReqwestNetwork {
    /// Creates the mechanisms with a default client.
    ///
    /// Requests of the default client time out after 30 seconds.
    pub fn new() -> Self {
        let client = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                tianniu_debug!("[ReqwestNetwork] falling back to a plain client: {}", err);
                ReqwestClient::new()
            });
        Self::with_client(client)
    }

    /// Creates the mechanisms using the specified [`ReqwestClient`].
    pub fn with_client(client: ReqwestClient) -> Self {
        let thread = TransportThread::new(move |request| {
            // NOTE: because of lifetime issues, building the request using the
            // `client` has to happen outside of this async block.
            let (method, url, request) = match request {
                Request::Post {
                    url,
                    content_type,
                    body,
                } => (
                    "POST",
                    url.to_string(),
                    client
                        .post(url)
                        .header(header::CONTENT_TYPE, content_type)
                        .body(body),
                ),
                Request::Get { url } => ("GET", url.to_string(), client.get(url)),
            };

            async move {
                match request.send().await {
                    Ok(response) => {
                        tianniu_debug!(
                            "[ReqwestNetwork] {} {} -> {}",
                            method,
                            url,
                            response.status()
                        );
                    }
                    Err(err) => {
                        tianniu_debug!("[ReqwestNetwork] {} {} failed: {}", method, url, err);
                    }
                }
            }
        });
        Self { thread }
    }

    /// Exposes beacon, fetch and image delivery through `network`.
    pub fn capabilities(network: &Arc<ReqwestNetwork>) -> Capabilities {
        Capabilities::none()
            .with_beacon(network.clone())
            .with_fetch(network.clone())
            .with_image(network.clone())
    }

    /// Waits until every request queued so far completed.
    pub fn flush(&self, timeout: Duration) -> bool {
        self.thread.flush(timeout)
    }

    /// Drains the queue and stops accepting requests.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.thread.shutdown(timeout)
    }
}

impl Default for ReqwestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Beacon for ReqwestNetwork {
    fn send_beacon(&self, url: &Url, body: String) -> bool {
        self.thread.try_send(Request::Post {
            url: url.clone(),
            content_type: "text/plain;charset=UTF-8",
            body,
        })
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.thread.flush(timeout)
    }
}

impl Fetch for ReqwestNetwork {
    fn fetch(&self, request: FetchRequest) -> Result<(), DeliveryError> {
        let queued = self.thread.try_send(Request::Post {
            url: request.url,
            content_type: request.content_type,
            body: request.body,
        });
        if queued {
            Ok(())
        } else {
            Err(DeliveryError::new("request queue is full"))
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.thread.flush(timeout)
    }
}

impl ImagePixel for ReqwestNetwork {
    fn load_image(&self, src: Url) -> Result<(), DeliveryError> {
        if self.thread.try_send(Request::Get { url: src }) {
            Ok(())
        } else {
            Err(DeliveryError::new("request queue is full"))
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.thread.flush(timeout)
    }
}
