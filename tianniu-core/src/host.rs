//! The boundary to the monitored page.
//!
//! The SDK never reaches for a global window object.  Everything it observes
//! or uses is reached through the [`Host`] trait object passed to
//! [`init`](../tianniu/fn.init.html).

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::delivery::Capabilities;
use crate::protocol::{BrowserInfo, WebVital};
use crate::record::Recorder;
use crate::tianniu_debug;

/// A callback registered for a [`HostEventKind`].
pub type Listener = Arc<dyn Fn(&HostEvent) + Send + Sync>;

/// A callback receiving metric samples from a [`WebVitalsSource`].
pub type MetricCallback = Arc<dyn Fn(MetricSample) + Send + Sync>;

/// The global events the SDK listens for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostEventKind {
    /// An uncaught exception.
    Error,
    /// A promise rejection without handler.
    UnhandledRejection,
    /// The page finished loading.
    Load,
    /// The page is being unloaded.
    Unload,
    /// The page is being hidden, possibly for good.
    PageHide,
}

/// Options for [`Host::add_event_listener`].
///
/// Registration is always additive: hosts must never replace listeners
/// another integration installed for the same event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run the listener in the capture phase.
    pub capture: bool,
}

impl ListenerOptions {
    /// Options for a capture-phase listener.
    pub fn capture() -> Self {
        ListenerOptions { capture: true }
    }
}

/// A thrown value that looks like an error object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptError {
    /// The `message` property, if any.
    pub message: Option<String>,
    /// The `stack` property, if any.
    pub stack: Option<String>,
}

/// An uncaught exception.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorEvent {
    /// The message of the event itself.
    pub message: String,
    /// The thrown value, unavailable for instance for cross-origin scripts.
    pub error: Option<ScriptError>,
}

impl ErrorEvent {
    /// The message of the thrown error, falling back to the event message.
    pub fn error_message(&self) -> &str {
        self.error
            .as_ref()
            .and_then(|error| error.message.as_deref())
            .unwrap_or(&self.message)
    }

    /// The stack of the thrown error.
    pub fn error_stack(&self) -> Option<&str> {
        self.error.as_ref()?.stack.as_deref()
    }
}

/// The reason a promise was rejected with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reason {
    /// An error-like object.
    Error(ScriptError),
    /// Any other value, in its string form.
    Value(String),
}

/// A promise rejection nobody handled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RejectionEvent {
    /// The rejection reason, `None` for `undefined`.
    pub reason: Option<Reason>,
}

impl RejectionEvent {
    /// The `message` property of the reason.
    pub fn reason_message(&self) -> Option<&str> {
        match self.reason {
            Some(Reason::Error(ref error)) => error.message.as_deref(),
            _ => None,
        }
    }

    /// The `stack` property of the reason.
    pub fn reason_stack(&self) -> Option<&str> {
        match self.reason {
            Some(Reason::Error(ref error)) => error.stack.as_deref(),
            _ => None,
        }
    }

    /// A human readable description of the reason, empty if there is none.
    pub fn describe(&self) -> String {
        match self.reason {
            Some(Reason::Error(ref error)) => error.message.clone().unwrap_or_default(),
            Some(Reason::Value(ref value)) => value.clone(),
            None => String::new(),
        }
    }
}

/// An event delivered by the host to registered listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// An uncaught exception.
    Error(ErrorEvent),
    /// A promise rejection without handler.
    UnhandledRejection(RejectionEvent),
    /// The page finished loading.
    Load,
    /// The page is being unloaded.
    Unload,
    /// The page is being hidden.
    PageHide,
}

impl HostEvent {
    /// The kind listeners register for.
    pub fn kind(&self) -> HostEventKind {
        match self {
            HostEvent::Error(_) => HostEventKind::Error,
            HostEvent::UnhandledRejection(_) => HostEventKind::UnhandledRejection,
            HostEvent::Load => HostEventKind::Load,
            HostEvent::Unload => HostEventKind::Unload,
            HostEvent::PageHide => HostEventKind::PageHide,
        }
    }
}

/// The loading state of the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    /// The document is still loading.
    Loading,
    /// The document was parsed, subresources are still loading.
    Interactive,
    /// The document and all subresources finished loading.
    Complete,
}

/// The subset of navigation timing the SDK uses, in milliseconds relative to
/// the time origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NavigationTiming {
    /// When the navigation started.
    pub start_time: f64,
    /// When the `DOMContentLoaded` handlers finished, `0` if not yet.
    pub dom_content_loaded_event_end: f64,
    /// When the `load` handlers finished, `0` if not yet.
    pub load_event_end: f64,
}

/// The size of the layout viewport in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// The inner width of the window.
    pub width: f64,
    /// The inner height of the window.
    pub height: f64,
}

/// The element found by hit-testing a point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// The tag name, in any case.
    pub tag_name: String,
    /// The `id` attribute, empty if unset.
    pub id: String,
    /// The `class` attribute, empty if unset.
    pub class_name: String,
}

impl ElementInfo {
    /// Creates an element with the given tag name.
    pub fn new<S: Into<String>>(tag_name: S) -> Self {
        ElementInfo {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// Sets the `id` attribute.
    #[must_use]
    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the `class` attribute.
    #[must_use]
    pub fn with_class<S: Into<String>>(mut self, class_name: S) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// A short selector naming the element.
    ///
    /// This is `#id` if the element has an id, otherwise `.a.b` for its
    /// classes, otherwise the lower-cased tag name.
    pub fn selector(&self) -> String {
        if !self.id.is_empty() {
            format!("#{}", self.id)
        } else if !self.class_name.trim().is_empty() {
            let classes: Vec<&str> = self.class_name.split_whitespace().collect();
            format!(".{}", classes.join("."))
        } else {
            self.tag_name.to_lowercase()
        }
    }
}

/// A single metric value reported by a [`WebVitalsSource`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricSample {
    /// The metric.
    pub name: WebVital,
    /// The metric value.
    pub value: f64,
}

impl MetricSample {
    /// The `INP` sample of a first input entry: the delay until its event
    /// handlers started running.
    ///
    /// Returns `None` if the processing start is unknown or precedes the
    /// input.
    pub fn input_delay(start_time: f64, processing_start: Option<f64>) -> Option<MetricSample> {
        let value = processing_start? - start_time;
        if value >= 0.0 {
            Some(MetricSample {
                name: WebVital::Inp,
                value,
            })
        } else {
            None
        }
    }
}

/// Produces Web Vitals metrics as they become available.
///
/// Metrics arrive asynchronously and independently of each other; a
/// callback may never be invoked if the page never produces the metric.
pub trait WebVitalsSource: Send + Sync {
    /// Registers `callback` for samples of `metric`.
    fn observe(&self, metric: WebVital, callback: MetricCallback);
}

/// The monitored page.
pub trait Host: Send + Sync + 'static {
    /// The path of the current location.
    fn location_path(&self) -> String;

    /// Environment context attached to every report.
    fn browser_info(&self) -> BrowserInfo;

    /// The loading state of the document.
    fn ready_state(&self) -> ReadyState;

    /// The navigation timing entry of the document, if available.
    fn navigation_timing(&self) -> Option<NavigationTiming> {
        None
    }

    /// High resolution milliseconds since the time origin.
    fn now(&self) -> f64;

    /// Wall clock milliseconds since the unix epoch.
    fn date_now(&self) -> u64;

    /// The size of the viewport.
    fn viewport(&self) -> Viewport;

    /// Hit-tests the given viewport coordinates.
    fn element_from_point(&self, x: f64, y: f64) -> Option<ElementInfo>;

    /// Registers an additional listener for a global event.
    fn add_event_listener(&self, kind: HostEventKind, options: ListenerOptions, listener: Listener);

    /// The delivery mechanisms available for sending reports.
    fn capabilities(&self) -> Capabilities;

    /// The Web Vitals source, if the host provides one.
    fn web_vitals(&self) -> Option<Arc<dyn WebVitalsSource>> {
        None
    }

    /// The DOM recording mechanism, if the host provides one.
    fn recorder(&self) -> Option<Arc<dyn Recorder>> {
        None
    }
}

impl fmt::Debug for dyn Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("path", &self.location_path())
            .field("ready_state", &self.ready_state())
            .finish()
    }
}

/// Whether the document is far enough along to start observing it.
///
/// This is the case once `DOMContentLoaded` handlers ran or the document is
/// complete.
pub fn is_page_ready(host: &dyn Host) -> bool {
    let dom_ready = host
        .navigation_timing()
        .map_or(false, |timing| timing.dom_content_loaded_event_end > 0.0);
    dom_ready || host.ready_state() == ReadyState::Complete
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(s) => (*s).to_string(),
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "Box<Any>".to_string(),
        },
    }
}

/// Wraps a listener so a panic inside the SDK never unwinds into the host.
///
/// Reaching the host's global handlers would make the SDK report on itself.
pub fn guard_listener<F>(origin: &'static str, f: F) -> Listener
where
    F: Fn(&HostEvent) + Send + Sync + 'static,
{
    Arc::new(move |event: &HostEvent| {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(event))) {
            tianniu_debug!(
                "[{}] listener for {:?} panicked: {}",
                origin,
                event.kind(),
                panic_message(&*payload)
            );
        }
    })
}
