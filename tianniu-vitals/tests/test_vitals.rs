use std::sync::Arc;

use tianniu_core::protocol::{Payload, PerformanceKind, WebVital};
use tianniu_core::test::{TestHost, TestTransport};
use tianniu_core::{Host, HostEventKind, Integration, NavigationTiming, ReadyState, Transport};
use tianniu_vitals::PerformanceIntegration;

fn init(host: &Arc<TestHost>) -> Arc<TestTransport> {
    let transport = TestTransport::new();
    let dyn_host: Arc<dyn Host> = host.clone();
    let dyn_transport: Arc<dyn Transport> = transport.clone();
    PerformanceIntegration::new()
        .init(&dyn_transport, &dyn_host)
        .unwrap();
    transport
}

fn metrics(transport: &TestTransport) -> Vec<(WebVital, f64, String)> {
    transport
        .fetch_and_clear_payloads()
        .into_iter()
        .map(|payload| match payload {
            Payload::Performance(perf) => {
                assert_eq!(perf.ty, PerformanceKind::WebVital);
                (perf.name, perf.value, perf.path)
            }
            other => panic!("unexpected payload {:?}", other),
        })
        .collect()
}

#[test]
fn test_waits_for_load() {
    let host = TestHost::new();
    host.set_navigation_timing(Some(NavigationTiming {
        start_time: 0.0,
        dom_content_loaded_event_end: 300.0,
        load_event_end: 820.0,
    }));
    let transport = init(&host);
    assert_eq!(host.listener_count(HostEventKind::Load), 1);
    assert!(host.vitals_source().observed().is_empty());
    assert!(transport.fetch_and_clear_payloads().is_empty());

    host.finish_loading();
    assert_eq!(
        metrics(&transport),
        vec![(WebVital::Load, 820.0, "/".to_owned())]
    );
    assert_eq!(host.vitals_source().observed(), WebVital::OBSERVED.to_vec());
}

#[test]
fn test_metrics_arrive_independently() {
    let host = TestHost::new();
    host.set_ready_state(ReadyState::Complete);
    host.set_now(1500.0);
    let transport = init(&host);
    assert_eq!(host.listener_count(HostEventKind::Load), 0);
    assert_eq!(
        metrics(&transport),
        vec![(WebVital::Load, 1500.0, "/".to_owned())]
    );

    host.vitals_source().emit(WebVital::Ttfb, 87.0);
    host.set_path("/products");
    host.vitals_source().emit(WebVital::Lcp, 1320.0);
    host.vitals_source().emit(WebVital::Cls, 0.02);

    assert_eq!(
        metrics(&transport),
        vec![
            (WebVital::Ttfb, 87.0, "/".to_owned()),
            (WebVital::Lcp, 1320.0, "/products".to_owned()),
            (WebVital::Cls, 0.02, "/products".to_owned()),
        ]
    );
}

#[test]
fn test_wire_shape() {
    let host = TestHost::new();
    host.set_ready_state(ReadyState::Complete);
    let transport = init(&host);
    transport.fetch_and_clear_payloads();

    host.vitals_source().emit(WebVital::Fcp, 640.0);
    let payload = transport.fetch_and_clear_payloads().remove(0);
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "event_type": "performance",
            "type": "web_vital",
            "name": "FCP",
            "value": 640.0,
            "path": "/",
        })
    );
}

#[test]
fn test_without_vitals_source() {
    let host = TestHost::new();
    host.set_vitals_supported(false);
    host.set_ready_state(ReadyState::Complete);
    host.set_now(75.0);
    let transport = init(&host);
    assert_eq!(
        metrics(&transport),
        vec![(WebVital::Load, 75.0, "/".to_owned())]
    );
}
