#![cfg(all(feature = "reqwest", not(target_arch = "wasm32")))]

use std::sync::Arc;
use std::time::Duration;

use tianniu::delivery::FetchRequest;
use tianniu::transports::ReqwestNetwork;
use tianniu::types::{Dsn, Url};

fn unreachable_dsn() -> Dsn {
    // nothing listens on the discard port
    "http://127.0.0.1:1/tracing/fewjonqks".parse().unwrap()
}

#[test]
fn test_unreachable_endpoint_is_swallowed() {
    let network = Arc::new(ReqwestNetwork::new());
    let capabilities = ReqwestNetwork::capabilities(&network);
    let dsn = unreachable_dsn();

    let beacon = capabilities.beacon.clone().unwrap();
    assert!(beacon.send_beacon(dsn.report_url(), r#"{"event_type":"message"}"#.into()));

    let fetch = capabilities.fetch.clone().unwrap();
    fetch
        .fetch(FetchRequest::json(
            dsn.report_url().clone(),
            r#"{"event_type":"event"}"#.into(),
        ))
        .unwrap();

    let image = capabilities.image.clone().unwrap();
    image.load_image(dsn.image_url("{}")).unwrap();

    assert!(capabilities.flush(Duration::from_secs(10)));
}

#[test]
fn test_shutdown_rejects_further_deliveries() {
    let network = ReqwestNetwork::new();
    assert!(network.shutdown(Duration::from_secs(5)));

    let url: Url = "http://127.0.0.1:1/".parse().unwrap();
    assert!(!tianniu::delivery::Beacon::send_beacon(&network, &url, String::new()));
    assert!(tianniu::delivery::ImagePixel::load_image(&network, url).is_err());
}
