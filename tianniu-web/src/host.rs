use std::sync::Arc;

use js_sys::{Function, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DocumentReadyState, PerformanceNavigationTiming};

use tianniu_core::protocol::BrowserInfo;
use tianniu_core::{
    Capabilities, ElementInfo, ErrorEvent, Host, HostEvent, HostEventKind, Listener,
    ListenerOptions, NavigationTiming, ReadyState, Reason, Recorder, RejectionEvent, ScriptError,
    Viewport, WebVitalsSource,
};

use crate::delivery::{WebBeacon, WebFetch, WebImage};
use crate::recorder::RrwebRecorder;
use crate::vitals::ObserverVitals;

/// The page the SDK is running in.
///
/// All browser objects are looked up when needed, the host itself only
/// holds the optional rrweb recorder.
#[derive(Default)]
pub struct WebHost {
    recorder: Option<Arc<RrwebRecorder>>,
}

impl WebHost {
    /// Creates a host for the current window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records sessions with rrweb's `record` function.
    #[must_use]
    pub fn with_recorder(mut self, record: Function) -> Self {
        self.recorder = Some(Arc::new(RrwebRecorder::new(record)));
        self
    }

    /// Records sessions with the given recorder.
    #[must_use]
    pub fn with_rrweb(mut self, recorder: RrwebRecorder) -> Self {
        self.recorder = Some(Arc::new(recorder));
        self
    }
}

fn event_name(kind: HostEventKind) -> &'static str {
    match kind {
        HostEventKind::Error => "error",
        HostEventKind::UnhandledRejection => "unhandledrejection",
        HostEventKind::Load => "load",
        HostEventKind::Unload => "unload",
        HostEventKind::PageHide => "pagehide",
    }
}

fn string_property(value: &JsValue, key: &str) -> Option<String> {
    Reflect::get(value, &key.into()).ok()?.as_string()
}

fn script_error(value: &JsValue) -> Option<ScriptError> {
    if !value.is_object() {
        return None;
    }
    Some(ScriptError {
        message: string_property(value, "message"),
        stack: string_property(value, "stack"),
    })
}

fn convert_event(kind: HostEventKind, event: &web_sys::Event) -> HostEvent {
    match kind {
        HostEventKind::Error => {
            let error = event
                .dyn_ref::<web_sys::ErrorEvent>()
                .map(|error| ErrorEvent {
                    message: error.message(),
                    error: script_error(&error.error()),
                })
                .unwrap_or_default();
            HostEvent::Error(error)
        }
        HostEventKind::UnhandledRejection => {
            let reason = event
                .dyn_ref::<web_sys::PromiseRejectionEvent>()
                .map(|rejection| rejection.reason())
                .filter(|reason| !reason.is_null() && !reason.is_undefined())
                .map(|reason| match script_error(&reason) {
                    Some(error) if error.message.is_some() || error.stack.is_some() => {
                        Reason::Error(error)
                    }
                    _ => Reason::Value(
                        reason
                            .as_string()
                            .or_else(|| reason.as_f64().map(|n| n.to_string()))
                            .unwrap_or_else(|| format!("{:?}", reason)),
                    ),
                });
            HostEvent::UnhandledRejection(RejectionEvent { reason })
        }
        HostEventKind::Load => HostEvent::Load,
        HostEventKind::Unload => HostEvent::Unload,
        HostEventKind::PageHide => HostEvent::PageHide,
    }
}

fn dimension(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
}

impl Host for WebHost {
    fn location_path(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().pathname().ok())
            .unwrap_or_default()
    }

    fn browser_info(&self) -> BrowserInfo {
        let window = match web_sys::window() {
            Some(window) => window,
            None => return BrowserInfo::default(),
        };
        let navigator = window.navigator();
        BrowserInfo {
            user_agent: navigator.user_agent().unwrap_or_default(),
            platform: navigator.platform().unwrap_or_default(),
            language: navigator.language().unwrap_or_default(),
            referrer: window
                .document()
                .map(|document| document.referrer())
                .unwrap_or_default(),
            path: self.location_path(),
        }
    }

    fn ready_state(&self) -> ReadyState {
        match web_sys::window()
            .and_then(|window| window.document())
            .map(|document| document.ready_state())
        {
            Some(DocumentReadyState::Complete) => ReadyState::Complete,
            Some(DocumentReadyState::Interactive) => ReadyState::Interactive,
            _ => ReadyState::Loading,
        }
    }

    fn navigation_timing(&self) -> Option<NavigationTiming> {
        let performance = web_sys::window()?.performance()?;
        let entry = performance
            .get_entries_by_type("navigation")
            .get(0)
            .dyn_into::<PerformanceNavigationTiming>()
            .ok()?;
        Some(NavigationTiming {
            start_time: entry.start_time(),
            dom_content_loaded_event_end: entry.dom_content_loaded_event_end(),
            load_event_end: entry.load_event_end(),
        })
    }

    fn now(&self) -> f64 {
        web_sys::window()
            .and_then(|window| window.performance())
            .map(|performance| performance.now())
            .unwrap_or_default()
    }

    fn date_now(&self) -> u64 {
        js_sys::Date::now() as u64
    }

    fn viewport(&self) -> Viewport {
        match web_sys::window() {
            Some(window) => Viewport {
                width: dimension(window.inner_width()),
                height: dimension(window.inner_height()),
            },
            None => Viewport::default(),
        }
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<ElementInfo> {
        let element = web_sys::window()?
            .document()?
            .element_from_point(x as f32, y as f32)?;
        Some(
            ElementInfo::new(element.tag_name())
                .with_id(element.id())
                .with_class(element.class_name()),
        )
    }

    fn add_event_listener(&self, kind: HostEventKind, options: ListenerOptions, listener: Listener) {
        let window = match web_sys::window() {
            Some(window) => window,
            None => return,
        };
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            listener(&convert_event(kind, &event));
        });
        let _ = window.add_event_listener_with_callback_and_bool(
            event_name(kind),
            closure.as_ref().unchecked_ref(),
            options.capture,
        );
        // listeners stay registered for the lifetime of the page
        closure.forget();
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::none();
        if WebBeacon::is_supported() {
            capabilities = capabilities.with_beacon(Arc::new(WebBeacon));
        }
        if WebFetch::is_supported() {
            capabilities = capabilities.with_fetch(Arc::new(WebFetch));
        }
        capabilities.with_image(Arc::new(WebImage))
    }

    fn web_vitals(&self) -> Option<Arc<dyn WebVitalsSource>> {
        if ObserverVitals::is_supported() {
            Some(Arc::new(ObserverVitals))
        } else {
            None
        }
    }

    fn recorder(&self) -> Option<Arc<dyn Recorder>> {
        self.recorder
            .clone()
            .map(|recorder| recorder as Arc<dyn Recorder>)
    }
}
