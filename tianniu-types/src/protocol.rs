//! The report payloads understood by the ingestion endpoint.
//!
//! Every report is a flat JSON object keyed by `event_type`.  The transport
//! adds a `browserInfo` object right before delivery, see [`Report`].

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

pub use serde_json::{Map, Value};

/// Environment context attached to every report.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    /// The user agent string of the host.
    pub user_agent: String,
    /// The platform the host runs on.
    pub platform: String,
    /// The preferred language of the user.
    pub language: String,
    /// The referrer of the current document.
    pub referrer: String,
    /// The path of the current location.
    pub path: String,
}

/// An uncaught exception or unhandled promise rejection.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    /// The stack of the thrown value, empty if unavailable.
    pub stack: String,
    /// The message of the thrown value, empty if unavailable.
    pub message: String,
    /// The location path at the time of the error.
    pub path: String,
}

/// The kind of a performance payload.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PerformanceKind {
    /// A Web Vitals family metric (including the derived page load time).
    #[default]
    #[serde(rename = "web_vital")]
    WebVital,
}

/// The names of the collected performance metrics.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebVital {
    /// Cumulative layout shift.
    Cls,
    /// Largest contentful paint.
    Lcp,
    /// First contentful paint.
    Fcp,
    /// Time to first byte.
    Ttfb,
    /// The input delay: time from the first user input until its event
    /// handlers started running, in milliseconds.
    Inp,
    /// Full page load duration derived from navigation timing.
    Load,
}

impl WebVital {
    /// The metrics reported by a Web Vitals source.
    ///
    /// [`WebVital::Load`] is not part of this list as it is computed from
    /// navigation timing by the performance integration itself.
    pub const OBSERVED: [WebVital; 5] = [
        WebVital::Cls,
        WebVital::Lcp,
        WebVital::Fcp,
        WebVital::Ttfb,
        WebVital::Inp,
    ];

    /// Returns the wire name of the metric.
    pub fn as_str(self) -> &'static str {
        match self {
            WebVital::Cls => "CLS",
            WebVital::Lcp => "LCP",
            WebVital::Fcp => "FCP",
            WebVital::Ttfb => "TTFB",
            WebVital::Inp => "INP",
            WebVital::Load => "LOAD",
        }
    }
}

impl fmt::Display for WebVital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single performance metric sample.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PerformancePayload {
    /// Always `web_vital`.
    #[serde(rename = "type")]
    pub ty: PerformanceKind,
    /// The metric name.
    pub name: WebVital,
    /// The metric value, milliseconds for timings and a unitless score for CLS.
    pub value: f64,
    /// The location path when the metric was reported.
    pub path: String,
}

impl PerformancePayload {
    /// Creates a `web_vital` payload.
    pub fn web_vital(name: WebVital, value: f64, path: String) -> Self {
        PerformancePayload {
            ty: PerformanceKind::WebVital,
            name,
            value,
            path,
        }
    }
}

/// Sent once when a page was detected to render blank.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct WhiteScreenPayload {
    /// The location path of the blank page.
    pub path: String,
}

/// The recent session activity leading up to an error.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPayload {
    /// The replay events of the trigger window, as a serialized JSON array.
    pub events: String,
    /// The message of the triggering error.
    pub message: String,
    /// The location path at the time of the error.
    pub path: String,
    /// The stack of the triggering error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// An error captured by a framework error boundary.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentErrorPayload {
    /// The framework specific error type, for instance `react_error`.
    #[serde(rename = "type")]
    pub ty: String,
    /// The error message.
    pub message: String,
    /// The error stack, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// The component stack reported by the framework, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_stack: Option<String>,
    /// The location path at the time of the error.
    pub path: String,
    /// Additional user supplied tags, flattened into the report.
    #[serde(flatten)]
    pub tags: Map<String, Value>,
}

/// A message reported manually by the host application.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MessagePayload {
    /// The message text.
    pub message: String,
}

/// A free-form payload with a custom `event_type`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CustomPayload {
    /// The custom event type.
    pub event_type: String,
    /// The payload fields.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// A report payload.
///
/// Payloads are created right when the triggering event happens, handed to
/// the transport and then discarded.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// `event_type: "error"`
    Error(ErrorPayload),
    /// `event_type: "performance"`
    Performance(PerformancePayload),
    /// `event_type: "whiteScreen"`
    WhiteScreen(WhiteScreenPayload),
    /// `event_type: "record"`
    Record(RecordPayload),
    /// `event_type: "error"` with a framework specific `type`.
    ComponentError(ComponentErrorPayload),
    /// `event_type: "message"`
    Message(MessagePayload),
    /// Any other `event_type`.
    Custom(CustomPayload),
}

impl Payload {
    /// Returns the `event_type` this payload is reported under.
    pub fn event_type(&self) -> &str {
        match self {
            Payload::Error(_) | Payload::ComponentError(_) => "error",
            Payload::Performance(_) => "performance",
            Payload::WhiteScreen(_) => "whiteScreen",
            Payload::Record(_) => "record",
            Payload::Message(_) => "message",
            Payload::Custom(custom) => &custom.event_type,
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    event_type: &'a str,
    #[serde(flatten)]
    inner: &'a T,
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let event_type = self.event_type();
        match self {
            Payload::Error(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::Performance(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::WhiteScreen(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::Record(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::ComponentError(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::Message(inner) => Tagged { event_type, inner }.serialize(serializer),
            Payload::Custom(custom) => custom.serialize(serializer),
        }
    }
}

macro_rules! impl_from_payload {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Payload {
            fn from(inner: $ty) -> Payload {
                Payload::$variant(inner)
            }
        }
    };
}

impl_from_payload!(ErrorPayload, Error);
impl_from_payload!(PerformancePayload, Performance);
impl_from_payload!(WhiteScreenPayload, WhiteScreen);
impl_from_payload!(RecordPayload, Record);
impl_from_payload!(ComponentErrorPayload, ComponentError);
impl_from_payload!(MessagePayload, Message);
impl_from_payload!(CustomPayload, Custom);

/// What actually goes over the wire: a payload enriched with [`BrowserInfo`].
#[derive(Serialize, Debug)]
pub struct Report<'a> {
    /// The payload fields, flattened into the report object.
    #[serde(flatten)]
    pub payload: &'a Payload,
    /// The environment context at the time of delivery.
    #[serde(rename = "browserInfo")]
    pub browser_info: BrowserInfo,
}

/// An opaque event emitted by the DOM recording mechanism.
///
/// Only the `timestamp` is interpreted, everything else is carried verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReplayEvent {
    /// Wall clock milliseconds since the unix epoch.
    pub timestamp: u64,
    /// The remaining event fields.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ReplayEvent {
    /// Creates an event without any further data.
    pub fn new(timestamp: u64) -> Self {
        ReplayEvent {
            timestamp,
            data: Map::new(),
        }
    }

    /// Creates an event with the given recorder specific type and data.
    pub fn with_data(timestamp: u64, ty: u64, data: Value) -> Self {
        let mut map = Map::new();
        map.insert("type".into(), ty.into());
        map.insert("data".into(), data);
        ReplayEvent {
            timestamp,
            data: map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn to_value(payload: &Payload) -> Value {
        serde_json::to_value(payload).unwrap()
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = Payload::Error(ErrorPayload {
            stack: "at foo".into(),
            message: "boom".into(),
            path: "/home".into(),
        });
        assert_eq!(
            to_value(&payload),
            json!({
                "event_type": "error",
                "stack": "at foo",
                "message": "boom",
                "path": "/home",
            })
        );
    }

    #[test]
    fn test_performance_payload_shape() {
        let payload: Payload =
            PerformancePayload::web_vital(WebVital::Ttfb, 12.5, "/".into()).into();
        assert_eq!(
            to_value(&payload),
            json!({
                "event_type": "performance",
                "type": "web_vital",
                "name": "TTFB",
                "value": 12.5,
                "path": "/",
            })
        );
    }

    #[test]
    fn test_record_payload_skips_missing_stack() {
        let payload = Payload::Record(RecordPayload {
            events: "[]".into(),
            message: "oops".into(),
            path: "/".into(),
            stack: None,
        });
        let value = to_value(&payload);
        assert_eq!(value["event_type"], "record");
        assert!(value.get("stack").is_none());
    }

    #[test]
    fn test_component_error_flattens_tags() {
        let mut tags = Map::new();
        tags.insert("section".into(), "checkout".into());
        let payload = Payload::ComponentError(ComponentErrorPayload {
            ty: "react_error".into(),
            message: "render failed".into(),
            stack: None,
            component_stack: Some("in Cart".into()),
            path: "/cart".into(),
            tags,
        });
        assert_eq!(
            to_value(&payload),
            json!({
                "event_type": "error",
                "type": "react_error",
                "message": "render failed",
                "componentStack": "in Cart",
                "path": "/cart",
                "section": "checkout",
            })
        );
    }

    #[test]
    fn test_custom_payload_keeps_event_type() {
        let mut data = Map::new();
        data.insert("event".into(), json!({"clicked": true}));
        let payload = Payload::Custom(CustomPayload {
            event_type: "event".into(),
            data,
        });
        assert_eq!(payload.event_type(), "event");
        assert_eq!(
            to_value(&payload),
            json!({"event_type": "event", "event": {"clicked": true}})
        );
    }

    #[test]
    fn test_report_adds_browser_info() {
        let payload = Payload::WhiteScreen(WhiteScreenPayload { path: "/".into() });
        let report = Report {
            payload: &payload,
            browser_info: BrowserInfo {
                user_agent: "Mozilla/5.0".into(),
                platform: "Linux x86_64".into(),
                language: "zh-CN".into(),
                referrer: "".into(),
                path: "/".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "event_type": "whiteScreen",
                "path": "/",
                "browserInfo": {
                    "userAgent": "Mozilla/5.0",
                    "platform": "Linux x86_64",
                    "language": "zh-CN",
                    "referrer": "",
                    "path": "/",
                }
            })
        );
    }

    #[test]
    fn test_replay_event_roundtrips_opaque_fields() {
        let raw = json!({"type": 2, "data": {"node": 1}, "timestamp": 1700000000000u64});
        let event: ReplayEvent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(event.timestamp, 1_700_000_000_000);
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn test_replay_event_with_data() {
        let event = ReplayEvent::with_data(1_700_000_000_000, 2, json!({"node": 1}));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": 2, "data": {"node": 1}, "timestamp": 1700000000000u64})
        );
    }
}
