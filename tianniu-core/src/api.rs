use std::sync::Arc;

use crate::protocol::{Payload, Value};
use crate::{Monitor, Transport};

/// Sends a payload through the current monitor if any.
///
/// The payload must already be assembled.  In case no monitor is bound or
/// it has not been initialized this does nothing.
///
/// # Example
///
/// ```
/// use tianniu_core::protocol::WhiteScreenPayload;
///
/// tianniu_core::capture_payload(WhiteScreenPayload { path: "/".into() }.into());
/// ```
pub fn capture_payload(payload: Payload) {
    if let Some(monitor) = Monitor::current() {
        monitor.capture(payload);
    }
}

/// Reports a plain message through the current monitor.
pub fn report_message(message: &str) {
    if let Some(monitor) = Monitor::current() {
        monitor.report_message(message);
    }
}

/// Reports an arbitrary value through the current monitor.
///
/// # Example
///
/// ```
/// tianniu_core::report_event(serde_json::json!({"action": "checkout"}));
/// ```
pub fn report_event<V: Into<Value>>(event: V) {
    if let Some(monitor) = Monitor::current() {
        monitor.report_event(event);
    }
}

/// Returns the transport of the current monitor.
///
/// This is meant for framework bindings that cannot have the transport
/// handed to them explicitly.
pub fn current_transport() -> Option<Arc<dyn Transport>> {
    Monitor::current()?.transport()
}
