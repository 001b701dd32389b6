use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tianniu::protocol::{ComponentErrorPayload, Payload, Report};
use tianniu::test::{lock_current, TestHost, TestTransport};
use tianniu::{ComponentError, ErrorBoundary, Host, MonitoringOptions};

fn tags(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

#[test]
fn test_capture_reports_component_error() {
    let host = TestHost::new();
    host.set_path("/profile");
    let transport = TestTransport::new();
    let boundary = ErrorBoundary::new(transport.clone(), host.clone())
        .with_tags(tags(json!({"team": "growth"})));

    boundary.capture(
        &ComponentError::new("Cannot read properties of undefined")
            .with_stack("TypeError: Cannot read properties of undefined\n    at Avatar")
            .with_component_stack("\n    at Avatar\n    at Profile"),
    );

    let payloads = transport.fetch_and_clear_payloads();
    assert_eq!(
        payloads,
        vec![Payload::ComponentError(ComponentErrorPayload {
            ty: "react_error".into(),
            message: "Cannot read properties of undefined".into(),
            stack: Some("TypeError: Cannot read properties of undefined\n    at Avatar".into()),
            component_stack: Some("\n    at Avatar\n    at Profile".into()),
            path: "/profile".into(),
            tags: tags(json!({"team": "growth"})),
        })]
    );

    let wire = serde_json::to_value(&payloads[0]).unwrap();
    assert_eq!(wire["event_type"], "error");
    assert_eq!(wire["type"], "react_error");
    assert_eq!(wire["componentStack"], "\n    at Avatar\n    at Profile");
    assert_eq!(wire["team"], "growth");
}

#[test]
fn test_reserved_tags_are_dropped() {
    let boundary = ErrorBoundary::new(TestTransport::new(), TestHost::new()).with_tags(tags(
        json!({"type": "custom", "path": "/elsewhere", "message": "x", "release": "1.2.0"}),
    ));
    assert_eq!(boundary.tags(), &tags(json!({"release": "1.2.0"})));
}

#[test]
fn test_browser_info_tag_is_dropped() {
    let host = TestHost::new();
    let transport = TestTransport::new();
    let boundary = ErrorBoundary::new(transport.clone(), host.clone())
        .with_tags(tags(json!({"browserInfo": "spoofed", "team": "growth"})));
    assert_eq!(boundary.tags(), &tags(json!({"team": "growth"})));

    boundary.capture(&ComponentError::new("boom"));
    let payloads = transport.fetch_and_clear_payloads();
    let report = Report {
        payload: &payloads[0],
        browser_info: host.browser_info(),
    };
    let wire = serde_json::to_string(&report).unwrap();
    assert_eq!(wire.matches("\"browserInfo\"").count(), 1);
}

#[test]
fn test_on_error_runs_after_report() {
    let transport = TestTransport::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let boundary = ErrorBoundary::new(transport.clone(), TestHost::new()).on_error({
        let calls = calls.clone();
        let transport = transport.clone();
        move |error| {
            assert_eq!(error.message, "boom");
            assert_eq!(transport.fetch_and_clear_payloads().len(), 1);
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    boundary.capture(&ComponentError::new("boom"));
    boundary.capture(&ComponentError::new("boom"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_from_current() {
    let _lock = lock_current();
    assert!(ErrorBoundary::from_current().is_none());

    let transport = TestTransport::new();
    let options = MonitoringOptions {
        dsn: Some("http://localhost:3000/tracing/fewjonqks".parse().unwrap()),
        transport: Some(Arc::new(transport.clone())),
        default_integrations: false,
        ..Default::default()
    };
    let guard = tianniu::init(TestHost::new(), options);

    let boundary = ErrorBoundary::from_current().unwrap();
    boundary.capture(&ComponentError::new("render failed"));
    assert_eq!(transport.fetch_and_clear_payloads().len(), 1);

    drop(guard);
    assert!(ErrorBoundary::from_current().is_none());
}
