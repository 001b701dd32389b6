use js_sys::{Function, Object, Reflect, JSON};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

use tianniu_core::protocol::{Map, ReplayEvent, Value};
use tianniu_core::record::{EmitFn, RecordOptions, Recorder, RecordingHandle};
use tianniu_core::RecordError;

/// Drives rrweb's `record` function.
///
/// The recorder is handed the JavaScript functions from the page, usually
/// `record` from `@rrweb/record` and optionally `pack` from `@rrweb/packer`.
pub struct RrwebRecorder {
    record: Function,
    pack: Option<Function>,
}

// wasm32 without atomics runs everything on one thread.
#[allow(unsafe_code)]
unsafe impl Send for RrwebRecorder {}
#[allow(unsafe_code)]
unsafe impl Sync for RrwebRecorder {}

impl RrwebRecorder {
    /// Creates a recorder calling `record`.
    pub fn new(record: Function) -> Self {
        RrwebRecorder { record, pack: None }
    }

    /// Compresses events with `pack`.
    #[must_use]
    pub fn with_pack(mut self, pack: Function) -> Self {
        self.pack = Some(pack);
        self
    }
}

/// Converts an emitted rrweb event.
///
/// Packed events are opaque strings; they are stamped with the time they
/// were emitted at.
fn convert_event(event: &JsValue) -> Option<ReplayEvent> {
    if let Some(packed) = event.as_string() {
        let mut data = Map::new();
        data.insert("packed".into(), Value::String(packed));
        return Some(ReplayEvent {
            timestamp: js_sys::Date::now() as u64,
            data,
        });
    }
    let json: String = JSON::stringify(event).ok()?.into();
    serde_json::from_str(&json).ok()
}

struct Running {
    stop: Option<Function>,
    _emit: Closure<dyn FnMut(JsValue, JsValue)>,
}

// wasm32 without atomics runs everything on one thread.
#[allow(unsafe_code)]
unsafe impl Send for Running {}

impl Recorder for RrwebRecorder {
    fn record(&self, options: RecordOptions, emit: EmitFn) -> Result<RecordingHandle, RecordError> {
        let callback = Closure::<dyn FnMut(JsValue, JsValue)>::new(
            move |event: JsValue, is_checkout: JsValue| {
                if let Some(event) = convert_event(&event) {
                    emit(event, is_checkout.as_bool().unwrap_or(false));
                }
            },
        );

        let js_options = Object::new();
        let set = |key: &str, value: &JsValue| {
            Reflect::set(&js_options, &key.into(), value)
                .map_err(|_| RecordError::Start(format!("cannot set {}", key)))
        };
        set("emit", callback.as_ref())?;
        set(
            "checkoutEveryNth",
            &JsValue::from(options.checkout_every_nth()),
        )?;
        set("maskAllInputs", &JsValue::from(options.mask_all_inputs()))?;
        if let (true, Some(pack)) = (options.pack(), &self.pack) {
            set("packFn", pack.as_ref())?;
        }

        let stop = self
            .record
            .call1(&JsValue::NULL, &js_options)
            .map_err(|err| RecordError::Start(format!("{:?}", err)))?;

        let running = Running {
            stop: stop.dyn_into::<Function>().ok(),
            _emit: callback,
        };
        Ok(RecordingHandle::new(move || {
            if let Some(ref stop) = running.stop {
                let _ = stop.call0(&JsValue::NULL);
            }
            drop(running);
        }))
    }
}
