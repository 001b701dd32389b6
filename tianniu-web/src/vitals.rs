use std::cell::Cell;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    PerformanceEntry, PerformanceNavigationTiming, PerformanceObserver,
    PerformanceObserverEntryList,
};

use tianniu_core::protocol::WebVital;
use tianniu_core::{tianniu_debug, MetricCallback, MetricSample, WebVitalsSource};

/// Reports Web Vitals from `PerformanceObserver` entries.
///
/// `FCP`, `TTFB` and `INP` are reported as soon as they are known.  `INP`
/// carries the delay of the first input: `processingStart - startTime` of
/// the `first-input` entry.  `CLS` and `LCP` keep changing while the page
/// is used; they are reported once when the page is hidden.
#[derive(Debug, Default)]
pub struct ObserverVitals;

impl ObserverVitals {
    /// Whether the browser implements `PerformanceObserver`.
    pub fn is_supported() -> bool {
        web_sys::window()
            .map(|window| Reflect::has(&window, &"PerformanceObserver".into()).unwrap_or(false))
            .unwrap_or(false)
    }
}

fn number_property(entry: &PerformanceEntry, key: &str) -> Option<f64> {
    Reflect::get(entry, &key.into()).ok()?.as_f64()
}

fn observe_entries<F>(entry_type: &str, duration_threshold: Option<f64>, mut f: F) -> bool
where
    F: FnMut(PerformanceEntry) + 'static,
{
    let callback = Closure::<dyn FnMut(PerformanceObserverEntryList, PerformanceObserver)>::new(
        move |list: PerformanceObserverEntryList, _: PerformanceObserver| {
            for entry in list.get_entries().iter() {
                if let Ok(entry) = entry.dyn_into::<PerformanceEntry>() {
                    f(entry);
                }
            }
        },
    );
    let observer = match PerformanceObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => observer,
        Err(_) => return false,
    };

    let init = Object::new();
    let _ = Reflect::set(&init, &"type".into(), &entry_type.into());
    let _ = Reflect::set(&init, &"buffered".into(), &JsValue::TRUE);
    if let Some(threshold) = duration_threshold {
        let _ = Reflect::set(&init, &"durationThreshold".into(), &threshold.into());
    }
    let _ = observer.observe(init.unchecked_ref());
    callback.forget();
    true
}

/// Reports the accumulated value once, when the page is hidden.
fn report_on_hide(name: WebVital, value: Rc<Cell<Option<f64>>>, callback: MetricCallback) {
    let window = match web_sys::window() {
        Some(window) => window,
        None => return,
    };
    let reported = Cell::new(false);
    let closure = Closure::<dyn FnMut()>::new(move || {
        if let (false, Some(value)) = (reported.get(), value.get()) {
            reported.set(true);
            callback(MetricSample { name, value });
        }
    });
    let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn observe_ttfb(callback: MetricCallback) {
    let entry = web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.get_entries_by_type("navigation").get(0))
        .and_then(|entry| entry.dyn_into::<PerformanceNavigationTiming>().ok());
    if let Some(entry) = entry {
        let value = entry.response_start();
        if value > 0.0 {
            callback(MetricSample {
                name: WebVital::Ttfb,
                value,
            });
        }
    }
}

impl WebVitalsSource for ObserverVitals {
    fn observe(&self, metric: WebVital, callback: MetricCallback) {
        let observing = match metric {
            WebVital::Fcp => {
                let reported = Cell::new(false);
                observe_entries("paint", None, move |entry| {
                    if entry.name() == "first-contentful-paint" && !reported.replace(true) {
                        callback(MetricSample {
                            name: WebVital::Fcp,
                            value: entry.start_time(),
                        });
                    }
                })
            }
            WebVital::Ttfb => {
                observe_ttfb(callback);
                true
            }
            WebVital::Lcp => {
                let latest = Rc::new(Cell::new(None));
                let candidate = latest.clone();
                report_on_hide(WebVital::Lcp, latest, callback);
                observe_entries("largest-contentful-paint", None, move |entry| {
                    candidate.set(Some(entry.start_time()));
                })
            }
            WebVital::Cls => {
                let total = Rc::new(Cell::new(None));
                let shifts = total.clone();
                report_on_hide(WebVital::Cls, total, callback);
                observe_entries("layout-shift", None, move |entry| {
                    let recent_input = Reflect::get(&entry, &"hadRecentInput".into())
                        .ok()
                        .and_then(|value| value.as_bool())
                        .unwrap_or(false);
                    if !recent_input {
                        let value = number_property(&entry, "value").unwrap_or_default();
                        shifts.set(Some(shifts.get().unwrap_or_default() + value));
                    }
                })
            }
            WebVital::Inp => {
                let reported = Cell::new(false);
                observe_entries("first-input", None, move |entry| {
                    let processing_start = number_property(&entry, "processingStart");
                    let sample = MetricSample::input_delay(entry.start_time(), processing_start);
                    if let Some(sample) = sample {
                        if !reported.replace(true) {
                            callback(sample);
                        }
                    }
                })
            }
            WebVital::Load => false,
        };
        if !observing {
            tianniu_debug!("[ObserverVitals] Cannot observe {}", metric);
        }
    }
}
