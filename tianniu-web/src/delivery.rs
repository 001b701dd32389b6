use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;
use web_sys::{Headers, HtmlImageElement, RequestInit};

use tianniu_core::delivery::{Beacon, Fetch, FetchRequest, ImagePixel};
use tianniu_core::types::Url;
use tianniu_core::DeliveryError;

thread_local! {
    static IGNORE_REJECTION: Closure<dyn FnMut(JsValue)> = Closure::new(|_: JsValue| {});
}

fn js_error(err: JsValue) -> DeliveryError {
    DeliveryError::new(
        err.as_string()
            .unwrap_or_else(|| format!("{:?}", err)),
    )
}

fn no_window() -> DeliveryError {
    DeliveryError::new("no window")
}

/// `navigator.sendBeacon`.
#[derive(Debug, Default)]
pub struct WebBeacon;

impl WebBeacon {
    /// Whether the browser implements `navigator.sendBeacon`.
    pub fn is_supported() -> bool {
        web_sys::window()
            .map(|window| Reflect::has(&window.navigator(), &"sendBeacon".into()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Beacon for WebBeacon {
    fn send_beacon(&self, url: &Url, body: String) -> bool {
        match web_sys::window() {
            Some(window) => window
                .navigator()
                .send_beacon_with_opt_str(url.as_str(), Some(&body))
                .unwrap_or(false),
            None => false,
        }
    }
}

/// `fetch` with `keepalive`.
///
/// Rejected requests are caught and discarded.
#[derive(Debug, Default)]
pub struct WebFetch;

impl WebFetch {
    /// Whether the browser implements `fetch`.
    pub fn is_supported() -> bool {
        web_sys::window()
            .map(|window| Reflect::has(&window, &"fetch".into()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Fetch for WebFetch {
    fn fetch(&self, request: FetchRequest) -> Result<(), DeliveryError> {
        let window = web_sys::window().ok_or_else(no_window)?;
        let headers = Headers::new().map_err(js_error)?;
        headers
            .set("Content-Type", request.content_type)
            .map_err(js_error)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&request.body));
        init.set_keepalive(request.keepalive);

        let promise = window.fetch_with_str_and_init(request.url.as_str(), &init);
        IGNORE_REJECTION.with(|ignore| {
            let _ = promise.catch(ignore);
        });
        Ok(())
    }
}

/// The image request fallback.
#[derive(Debug, Default)]
pub struct WebImage;

impl ImagePixel for WebImage {
    fn load_image(&self, src: Url) -> Result<(), DeliveryError> {
        let image = HtmlImageElement::new().map_err(js_error)?;
        image.set_src(src.as_str());
        Ok(())
    }
}
