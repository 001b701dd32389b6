#![cfg(target_arch = "wasm32")]

use tianniu_core::{Host, ReadyState};
use tianniu_web::WebHost;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_browser_info() {
    let host = WebHost::new();
    let info = host.browser_info();
    assert!(!info.user_agent.is_empty());
    assert_eq!(info.path, host.location_path());
}

#[wasm_bindgen_test]
fn test_body_is_a_container() {
    let host = WebHost::new();
    if host.ready_state() == ReadyState::Loading {
        return;
    }
    let viewport = host.viewport();
    if let Some(element) = host.element_from_point(viewport.width / 2.0, viewport.height / 2.0) {
        assert!(!element.selector().is_empty());
    }
}

#[wasm_bindgen_test]
fn test_capabilities() {
    let host = WebHost::new();
    let capabilities = host.capabilities();
    assert!(capabilities.image.is_some());
    assert!(capabilities.preferred().is_some());
}
