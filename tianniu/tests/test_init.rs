use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tianniu::protocol::Payload;
use tianniu::test::{lock_current, TestHost, TestTransport};
use tianniu::types::Dsn;
use tianniu::{
    ErrorEvent, Host, HostEvent, Integration, IntegrationError, MechanismKind, Monitor,
    MonitoringOptions, ScriptError, Transport,
};

const DSN: &str = "http://localhost:3000/tracing/fewjonqks";

fn options_with(transport: &Arc<TestTransport>) -> MonitoringOptions {
    MonitoringOptions {
        dsn: Some(DSN.parse::<Dsn>().unwrap()),
        transport: Some(Arc::new(transport.clone())),
        ..Default::default()
    }
}

#[derive(Default)]
struct Custom(AtomicBool);

impl Integration for Custom {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn init(
        &self,
        _transport: &Arc<dyn Transport>,
        _host: &Arc<dyn Host>,
    ) -> Result<(), IntegrationError> {
        self.0.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_disabled_without_dsn() {
    let _lock = lock_current();
    let host = TestHost::new();
    let options = MonitoringOptions {
        dsn: None,
        ..Default::default()
    }
    .add_integration(Custom::default());

    let guard = tianniu::init(host.clone(), options);
    if guard.monitor().dsn().is_some() {
        // TIANNIU_DSN is set in the environment
        return;
    }
    assert!(!guard.is_enabled());
    assert!(guard.monitor().integrations().is_empty());
    assert!(!guard.monitor().get_integration::<Custom>().unwrap().0.load(Ordering::SeqCst));

    tianniu::report_message("nobody is listening");
    assert!(host.network().fetch_and_clear().is_empty());
}

#[test]
#[cfg(all(
    feature = "errors",
    feature = "performance",
    feature = "white-screen",
    feature = "replay"
))]
fn test_builtin_integrations_follow_custom_ones() {
    let _lock = lock_current();
    let transport = TestTransport::new();
    let options = MonitoringOptions {
        watch_white_screen: true,
        record_user_error: true,
        ..options_with(&transport)
    }
    .add_integration(Custom::default());

    let guard = tianniu::init(TestHost::new(), options);
    assert!(guard.is_enabled());
    assert_eq!(
        guard.monitor().integrations(),
        vec!["custom", "performance", "errors", "white-screen", "session-replay"]
    );
}

#[test]
fn test_apply_defaults_sets_transport() {
    let transport = TestTransport::new();
    let options = tianniu::apply_defaults(MonitoringOptions {
        default_integrations: false,
        ..options_with(&transport)
    });
    assert!(options.has_transport());
    assert!(options.integrations.is_empty());

    let options = tianniu::apply_defaults(MonitoringOptions {
        default_integrations: false,
        ..Default::default()
    });
    assert!(options.has_transport());
}

#[test]
fn test_no_default_integrations() {
    let _lock = lock_current();
    let transport = TestTransport::new();
    let options = MonitoringOptions {
        default_integrations: false,
        ..options_with(&transport)
    };

    let guard = tianniu::init(TestHost::new(), options);
    assert!(guard.is_enabled());
    assert!(guard.monitor().integrations().is_empty());
}

#[test]
fn test_guard_binds_and_unbinds() {
    let _lock = lock_current();
    let transport = TestTransport::new();

    let guard = tianniu::init(TestHost::new(), options_with(&transport));
    let current = Monitor::current().unwrap();
    assert!(Arc::ptr_eq(&current, guard.monitor()));

    tianniu::report_event(serde_json::json!({"action": "checkout"}));
    tianniu::report_message("hello");
    assert_eq!(transport.fetch_and_clear_payloads().len(), 2);

    drop(guard);
    assert!(Monitor::current().is_none());
    assert!(!current.is_enabled());

    tianniu::report_message("after teardown");
    assert!(transport.fetch_and_clear_payloads().is_empty());
}

#[test]
fn test_later_init_replaces_current() {
    let _lock = lock_current();
    let first = tianniu::init(TestHost::new(), options_with(&TestTransport::new()));
    let second = tianniu::init(TestHost::new(), options_with(&TestTransport::new()));

    drop(first);
    let current = Monitor::current().unwrap();
    assert!(Arc::ptr_eq(&current, second.monitor()));
}

#[test]
#[cfg(feature = "errors")]
fn test_uncaught_error_reaches_the_network() {
    let _lock = lock_current();
    let host = TestHost::new();
    host.set_path("/checkout");
    let options = MonitoringOptions {
        dsn: Some(DSN.parse::<Dsn>().unwrap()),
        ..Default::default()
    };

    let guard = tianniu::init(host.clone(), options);
    assert!(guard.is_enabled());
    host.dispatch(&HostEvent::Error(ErrorEvent {
        message: "Uncaught Error: boom".into(),
        error: Some(ScriptError {
            message: Some("boom".into()),
            stack: Some("Error: boom\n    at pay.js:3:9".into()),
        }),
    }));

    let deliveries = host.network().fetch_and_clear();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].kind, MechanismKind::Beacon);
    assert_eq!(deliveries[0].url.as_str(), DSN);

    let body: serde_json::Value = serde_json::from_str(&deliveries[0].body).unwrap();
    assert_eq!(body["event_type"], "error");
    assert_eq!(body["message"], "boom");
    assert_eq!(body["path"], "/checkout");
    assert_eq!(body["browserInfo"]["path"], "/checkout");
    assert_eq!(body["browserInfo"]["userAgent"], "tianniu-test");
}

#[test]
fn test_manual_capture_through_current_monitor() {
    let payloads = tianniu::test::with_captured_payloads(|| {
        tianniu::report_message("cart emptied");
    });
    assert!(matches!(&payloads[..], [Payload::Message(message)] if message.message == "cart emptied"));
}
