//! The provided transports.
//!
//! Reports always go through the tiered [`BrowserTransport`], which hands
//! them to the delivery mechanisms of the page.  Outside of a browser the
//! `reqwest` feature provides [`ReqwestNetwork`], a set of native delivery
//! mechanisms a host can expose instead.

use std::sync::Arc;
use std::time::Duration;

use tianniu_core::protocol::Payload;
use tianniu_core::{
    tianniu_debug, BrowserTransport, Host, MonitoringOptions, Transport, TransportFactory,
};

#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
mod thread;

#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
mod reqwest;
#[cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]
pub use self::reqwest::ReqwestNetwork;

/// Creates the default transport.
///
/// This is the default value for `transport` on the monitoring options.  It
/// creates a [`BrowserTransport`] delivering to the configured DSN through
/// the delivery mechanisms of the host.
#[derive(Clone, Debug, Default)]
pub struct DefaultTransportFactory;

impl TransportFactory for DefaultTransportFactory {
    fn create_transport(
        &self,
        options: &MonitoringOptions,
        host: &Arc<dyn Host>,
    ) -> Arc<dyn Transport> {
        match options.dsn {
            Some(ref dsn) => Arc::new(BrowserTransport::new(dsn.clone(), host.clone())),
            None => {
                tianniu_debug!("[DefaultTransportFactory] no DSN configured, reports are dropped");
                Arc::new(DisabledTransport)
            }
        }
    }
}

struct DisabledTransport;

impl Transport for DisabledTransport {
    fn send(&self, payload: Payload) {
        tianniu_debug!(
            "[DisabledTransport] dropping {} report",
            payload.event_type()
        );
    }

    fn flush(&self, _timeout: Duration) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tianniu_core::test::TestHost;

    #[test]
    fn test_default_factory_without_dsn() {
        let host: Arc<dyn Host> = TestHost::new();
        let transport =
            DefaultTransportFactory.create_transport(&MonitoringOptions::default(), &host);
        transport.send(tianniu_core::protocol::MessagePayload::default().into());
        assert!(transport.flush(Duration::from_millis(10)));
    }
}
