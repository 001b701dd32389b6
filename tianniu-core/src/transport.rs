use std::sync::Arc;
use std::time::Duration;

use crate::delivery::{FetchRequest, MechanismKind};
use crate::error::TransportError;
use crate::protocol::{Payload, Report};
use crate::types::Dsn;
use crate::{tianniu_debug, Host, MonitoringOptions};

/// The trait for transports.
///
/// A transport is responsible for delivering payloads to the ingestion
/// endpoint.  Sending is fire-and-forget: implementations never report
/// failures back to the caller.
pub trait Transport: Send + Sync + 'static {
    /// Sends a [`Payload`].
    fn send(&self, payload: Payload);

    /// Flushes the transport queue.
    fn flush(&self, timeout: Duration) -> bool {
        let _ = timeout;
        true
    }

    /// Instructs the Transport to shut down.
    fn shutdown(&self, timeout: Duration) -> bool {
        self.flush(timeout)
    }
}

/// A factory creating transport instances.
///
/// Because options are potentially reused between different monitors the
/// options do not actually contain a transport but a factory object that
/// can create transports instead.
///
/// The factory has a single method that creates a new arced transport.
/// Because transports can be wrapped in `Arc`s and those are clonable
/// any `Arc<Transport>` is also a valid transport factory.  This for
/// instance lets you put a `Arc<TestTransport>` directly into the options.
///
/// This is automatically implemented for all closures optionally taking
/// options and the host and returning a boxed factory.
pub trait TransportFactory: Send + Sync {
    /// Given some options and the page, creates a transport.
    fn create_transport(
        &self,
        options: &MonitoringOptions,
        host: &Arc<dyn Host>,
    ) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&MonitoringOptions, &Arc<dyn Host>) -> Arc<dyn Transport> + Clone + Send + Sync + 'static,
{
    fn create_transport(
        &self,
        options: &MonitoringOptions,
        host: &Arc<dyn Host>,
    ) -> Arc<dyn Transport> {
        (*self)(options, host)
    }
}

impl<T: Transport> TransportFactory for Arc<T> {
    fn create_transport(
        &self,
        options: &MonitoringOptions,
        host: &Arc<dyn Host>,
    ) -> Arc<dyn Transport> {
        let _ = (options, host);
        self.clone()
    }
}

/// Delivers payloads through the best mechanism the host offers.
///
/// The mechanisms are probed in a fixed order on every send: beacon, then
/// fetch, then the image request fallback.  The first available one is
/// used; a failing mechanism does not fall through to the next one.
pub struct BrowserTransport {
    dsn: Dsn,
    host: Arc<dyn Host>,
}

impl BrowserTransport {
    /// Creates a transport delivering to `dsn` through `host`.
    pub fn new(dsn: Dsn, host: Arc<dyn Host>) -> Self {
        BrowserTransport { dsn, host }
    }

    /// The destination of all reports.
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// Sends a payload, returning the mechanism it was handed to.
    ///
    /// The payload is enriched with the current browser info right before
    /// it is serialized.
    pub fn try_send(&self, payload: &Payload) -> Result<MechanismKind, TransportError> {
        let report = Report {
            payload,
            browser_info: self.host.browser_info(),
        };
        let body = serde_json::to_string(&report)?;
        let capabilities = self.host.capabilities();

        if let Some(beacon) = capabilities.beacon {
            if beacon.send_beacon(self.dsn.report_url(), body) {
                Ok(MechanismKind::Beacon)
            } else {
                Err(TransportError::BeaconRejected)
            }
        } else if let Some(fetch) = capabilities.fetch {
            fetch.fetch(FetchRequest::json(self.dsn.report_url().clone(), body))?;
            Ok(MechanismKind::Fetch)
        } else if let Some(image) = capabilities.image {
            image.load_image(self.dsn.image_url(&body))?;
            Ok(MechanismKind::Image)
        } else {
            Err(TransportError::NoMechanism)
        }
    }
}

impl Transport for BrowserTransport {
    fn send(&self, payload: Payload) {
        match self.try_send(&payload) {
            Ok(mechanism) => tianniu_debug!(
                "[BrowserTransport] sent {} report via {:?}",
                payload.event_type(),
                mechanism
            ),
            Err(err) => tianniu_debug!(
                "[BrowserTransport] dropping {} report: {}",
                payload.event_type(),
                err
            ),
        }
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.host.capabilities().flush(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::{ErrorPayload, WhiteScreenPayload};
    use crate::test::{Delivery, TestHost};

    fn transport(host: &Arc<TestHost>) -> BrowserTransport {
        let host: Arc<dyn Host> = host.clone();
        BrowserTransport::new(
            "http://localhost:3000/tracing/fewjonqks".parse().unwrap(),
            host,
        )
    }

    fn error_payload() -> Payload {
        ErrorPayload {
            stack: "Error: boom".into(),
            message: "boom".into(),
            path: "/checkout".into(),
        }
        .into()
    }

    #[test]
    fn test_beacon_preferred() {
        let host = TestHost::new();
        let result = transport(&host).try_send(&error_payload());
        assert_eq!(result.unwrap(), MechanismKind::Beacon);

        let deliveries = host.network().fetch_and_clear();
        assert_eq!(deliveries.len(), 1);
        let Delivery { kind, url, body } = &deliveries[0];
        assert_eq!(*kind, MechanismKind::Beacon);
        assert_eq!(url.as_str(), "http://localhost:3000/tracing/fewjonqks");

        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["event_type"], "error");
        assert_eq!(body["message"], "boom");
        assert_eq!(
            body["browserInfo"],
            serde_json::json!({
                "userAgent": "tianniu-test",
                "platform": "test",
                "language": "en-US",
                "referrer": "",
                "path": "/",
            })
        );
    }

    #[test]
    fn test_fetch_without_beacon() {
        let host = TestHost::new();
        host.set_beacon_supported(false);
        let result = transport(&host).try_send(&error_payload());
        assert_eq!(result.unwrap(), MechanismKind::Fetch);

        let deliveries = host.network().fetch_and_clear();
        assert_eq!(deliveries[0].kind, MechanismKind::Fetch);
        assert!(host.network().all_keepalive());
    }

    #[test]
    fn test_image_fallback() {
        let host = TestHost::new();
        host.set_beacon_supported(false);
        host.set_fetch_supported(false);
        let payload: Payload = WhiteScreenPayload { path: "/".into() }.into();
        let result = transport(&host).try_send(&payload);
        assert_eq!(result.unwrap(), MechanismKind::Image);

        let deliveries = host.network().fetch_and_clear();
        let url = &deliveries[0].url;
        let (key, data) = url.query_pairs().next().unwrap();
        assert_eq!(key, "data");
        let body: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(body["event_type"], "whiteScreen");
    }

    #[test]
    fn test_no_mechanism() {
        let host = TestHost::new();
        host.set_beacon_supported(false);
        host.set_fetch_supported(false);
        host.set_image_supported(false);
        let result = transport(&host).try_send(&error_payload());
        assert!(matches!(result, Err(TransportError::NoMechanism)));

        // never surfaces to the caller
        transport(&host).send(error_payload());
    }

    #[test]
    fn test_rejected_beacon_is_not_retried() {
        let host = TestHost::new();
        host.network().reject_beacons(true);
        let result = transport(&host).try_send(&error_payload());
        assert!(matches!(result, Err(TransportError::BeaconRejected)));
        assert!(host.network().fetch_and_clear().is_empty());
    }

    #[test]
    fn test_failed_fetch_is_swallowed() {
        let host = TestHost::new();
        host.set_beacon_supported(false);
        host.network().fail_requests(true);
        let result = transport(&host).try_send(&error_payload());
        assert!(matches!(result, Err(TransportError::Delivery(_))));
        transport(&host).send(error_payload());
    }
}
