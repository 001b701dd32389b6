use std::any::TypeId;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::IntegrationError;
use crate::host::panic_message;
use crate::macros::set_debug_enabled;
use crate::protocol::{CustomPayload, Map, MessagePayload, Payload, Value};
use crate::types::Dsn;
use crate::{tianniu_debug, Host, Integration, MonitoringOptions, Transport};

lazy_static::lazy_static! {
    static ref CURRENT: RwLock<Option<Arc<Monitor>>> = RwLock::new(None);
}

/// The plugin host.
///
/// The monitor owns the configuration, holds the shared transport and
/// sequences the initialization of integrations.  It also exposes the
/// manual reporting API to host application code.
///
/// Monitors are usually created by `tianniu::init`, which also binds
/// them as the [current](Monitor::current) monitor.
pub struct Monitor {
    options: MonitoringOptions,
    host: Arc<dyn Host>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    initialized: RwLock<Vec<&'static str>>,
    integrations: Vec<(TypeId, Arc<dyn Integration>)>,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("dsn", &self.dsn())
            .field("options", &self.options)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Monitor {
    /// Creates a monitor for the page `host`.
    ///
    /// Nothing is observed and nothing is sent before [`init`](Monitor::init)
    /// has been called.
    pub fn new(options: MonitoringOptions, host: Arc<dyn Host>) -> Monitor {
        set_debug_enabled(options.debug);
        tianniu_debug!(
            "[Monitor] Creating new monitor with options: dsn={:?}",
            options.dsn.as_ref().map(|dsn| dsn.to_string())
        );

        // NOTE: We do not filter out duplicate integrations based on their
        // TypeId.
        let integrations = options
            .integrations
            .iter()
            .map(|integration| (integration.as_ref().type_id(), integration.clone()))
            .collect();

        Monitor {
            options,
            host,
            transport: RwLock::new(None),
            initialized: RwLock::new(Vec::new()),
            integrations,
        }
    }

    /// Stores the transport and initializes all configured integrations.
    ///
    /// Integrations are initialized in list order.  A failing integration,
    /// whether it returns an error or panics, is logged and skipped; the
    /// remaining integrations are initialized regardless.
    pub fn init(&self, transport: Arc<dyn Transport>) {
        *self.transport.write().unwrap() = Some(transport.clone());

        tianniu_debug!(
            "[Monitor] Initializing {} integrations",
            self.integrations.len()
        );
        for (_, integration) in self.integrations.iter() {
            let name = integration.name();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                integration.init(&transport, &self.host)
            }))
            .unwrap_or_else(|payload| Err(IntegrationError::Panicked(panic_message(&*payload))));

            match result {
                Ok(()) => {
                    tianniu_debug!("[Monitor] Initialized integration: {}", name);
                    self.initialized.write().unwrap().push(name);
                }
                Err(err) => {
                    tianniu_debug!("[Monitor] Integration {} failed to initialize: {}", name, err);
                }
            }
        }
    }

    /// Returns the options of this monitor.
    pub fn options(&self) -> &MonitoringOptions {
        &self.options
    }

    /// Returns the DSN that constructed this monitor.
    pub fn dsn(&self) -> Option<&Dsn> {
        self.options.dsn.as_ref()
    }

    /// Returns the page this monitor observes.
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Quick check to see if the monitor is enabled.
    ///
    /// The monitor is enabled once [`init`](Monitor::init) stored a
    /// transport, and until it is closed.
    pub fn is_enabled(&self) -> bool {
        self.transport.read().unwrap().is_some()
    }

    /// Returns the transport reports are sent through.
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.read().unwrap().clone()
    }

    /// The names of the integrations that initialized successfully.
    pub fn integrations(&self) -> Vec<&'static str> {
        self.initialized.read().unwrap().clone()
    }

    /// Looks up a configured integration by its type.
    pub fn get_integration<I>(&self) -> Option<&I>
    where
        I: Integration,
    {
        let id = TypeId::of::<I>();
        let integration = &self.integrations.iter().find(|(iid, _)| *iid == id)?.1;
        integration.as_ref().as_any().downcast_ref()
    }

    /// Sends a payload through the transport, if the monitor is enabled.
    pub fn capture(&self, payload: Payload) {
        match self.transport() {
            Some(transport) => transport.send(payload),
            None => tianniu_debug!(
                "[Monitor] Dropping {} report, monitor not initialized",
                payload.event_type()
            ),
        }
    }

    /// Reports a plain message.
    pub fn report_message(&self, message: &str) {
        self.capture(
            MessagePayload {
                message: message.to_owned(),
            }
            .into(),
        );
    }

    /// Reports an arbitrary value under `event_type: "event"`.
    pub fn report_event<V: Into<Value>>(&self, event: V) {
        let mut data = Map::new();
        data.insert("event".into(), event.into());
        self.capture(
            CustomPayload {
                event_type: "event".into(),
                data,
            }
            .into(),
        );
    }

    /// Drains all pending deliveries.
    ///
    /// If no timeout is provided the monitor waits for as long as the
    /// `shutdown_timeout` in the options.
    pub fn flush(&self, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or(self.options.shutdown_timeout);
        if let Some(ref transport) = *self.transport.read().unwrap() {
            transport.flush(timeout)
        } else {
            true
        }
    }

    /// Drains all pending deliveries and shuts down the transport.  After
    /// shutting down the transport is removed and the monitor is disabled.
    pub fn close(&self, timeout: Option<Duration>) -> bool {
        let timeout = timeout.unwrap_or(self.options.shutdown_timeout);
        tianniu_debug!("[Monitor] Closing monitor (timeout: {}ms)", timeout.as_millis());
        let transport_opt = self.transport.write().unwrap().take();
        if let Some(transport) = transport_opt {
            transport.shutdown(timeout)
        } else {
            true
        }
    }

    /// Returns the monitor bound as the current one, if any.
    pub fn current() -> Option<Arc<Monitor>> {
        CURRENT.read().unwrap().clone()
    }

    /// Binds a monitor as the current one, replacing the previous one.
    pub fn bind(monitor: Arc<Monitor>) {
        *CURRENT.write().unwrap() = Some(monitor);
    }

    /// Unbinds `monitor` if it is still the current one.
    ///
    /// Returns `true` if it was unbound.
    pub fn unbind(monitor: &Arc<Monitor>) -> bool {
        let mut current = CURRENT.write().unwrap();
        match *current {
            Some(ref bound) if Arc::ptr_eq(bound, monitor) => {
                *current = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::test::{TestHost, TestTransport};

    struct Counting(Arc<AtomicUsize>);

    impl Integration for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn init(
            &self,
            transport: &Arc<dyn Transport>,
            _host: &Arc<dyn Host>,
        ) -> Result<(), IntegrationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            transport.send(
                MessagePayload {
                    message: "counting".into(),
                }
                .into(),
            );
            Ok(())
        }
    }

    struct Failing;

    impl Integration for Failing {
        fn init(
            &self,
            _transport: &Arc<dyn Transport>,
            _host: &Arc<dyn Host>,
        ) -> Result<(), IntegrationError> {
            Err(IntegrationError::Unsupported("everything"))
        }
    }

    struct Panicking;

    impl Integration for Panicking {
        fn init(
            &self,
            _transport: &Arc<dyn Transport>,
            _host: &Arc<dyn Host>,
        ) -> Result<(), IntegrationError> {
            panic!("integration exploded");
        }
    }

    fn monitor(options: MonitoringOptions) -> Monitor {
        let host: Arc<dyn Host> = TestHost::new();
        Monitor::new(options, host)
    }

    #[test]
    fn test_failures_are_isolated() {
        let counter = Arc::new(AtomicUsize::new(0));
        let options = MonitoringOptions::default()
            .add_integration(Failing)
            .add_integration(Panicking)
            .add_integration(Counting(counter.clone()));
        let monitor = monitor(options);
        let transport = TestTransport::new();
        monitor.init(transport.clone());

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.integrations(), vec!["counting"]);
        assert_eq!(transport.fetch_and_clear_payloads().len(), 1);
    }

    #[test]
    fn test_integrations_run_in_order() {
        let order = Arc::new(std::sync::Mutex::new(vec![]));

        struct Named(&'static str, Arc<std::sync::Mutex<Vec<&'static str>>>);

        impl Integration for Named {
            fn name(&self) -> &'static str {
                self.0
            }

            fn init(
                &self,
                _transport: &Arc<dyn Transport>,
                _host: &Arc<dyn Host>,
            ) -> Result<(), IntegrationError> {
                self.1.lock().unwrap().push(self.0);
                Ok(())
            }
        }

        let options = MonitoringOptions::default()
            .add_integration(Named("first", order.clone()))
            .add_integration(Named("second", order.clone()))
            .add_integration(Named("third", order.clone()));
        monitor(options).init(TestTransport::new());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_reporting_requires_init() {
        let monitor = monitor(MonitoringOptions::default());
        let transport = TestTransport::new();
        monitor.report_message("too early");
        monitor.report_event("too early");
        assert!(!monitor.is_enabled());

        monitor.init(transport.clone());
        monitor.report_message("hello");
        monitor.report_event(serde_json::json!({"clicked": "buy"}));

        let payloads = transport.fetch_and_clear_payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].event_type(), "message");
        assert_eq!(payloads[1].event_type(), "event");
        let body = serde_json::to_value(&payloads[1]).unwrap();
        assert_eq!(body["event"]["clicked"], "buy");
    }

    #[test]
    fn test_close_disables() {
        let monitor = monitor(MonitoringOptions::default());
        let transport = TestTransport::new();
        monitor.init(transport.clone());
        assert!(monitor.close(None));
        monitor.report_message("after close");
        assert!(transport.fetch_and_clear_payloads().is_empty());
    }

    #[test]
    fn test_get_integration() {
        let counter = Arc::new(AtomicUsize::new(0));
        let monitor = monitor(MonitoringOptions::default().add_integration(Counting(counter)));
        assert!(monitor.get_integration::<Counting>().is_some());
        assert!(monitor.get_integration::<Failing>().is_none());
    }

    #[test]
    fn test_unbind_only_current() {
        let _guard = crate::test::lock_current();
        let first = Arc::new(monitor(MonitoringOptions::default()));
        let second = Arc::new(monitor(MonitoringOptions::default()));
        Monitor::bind(first.clone());
        Monitor::bind(second.clone());
        assert!(!Monitor::unbind(&first));
        assert!(Arc::ptr_eq(&Monitor::current().unwrap(), &second));
        assert!(Monitor::unbind(&second));
        assert!(Monitor::current().is_none());
    }
}
