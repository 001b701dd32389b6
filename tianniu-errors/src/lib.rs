//! The tianniu error capture integration.
//!
//! The `ErrorsIntegration`, which is enabled by default in `tianniu`, listens
//! for uncaught exceptions and unhandled promise rejections on the page and
//! reports each of them right away as an `error` payload.
//!
//! The listeners are registered additively, next to whatever the page or
//! other integrations installed for the same events.
//!
//! ```
//! let integration = tianniu_errors::ErrorsIntegration::new();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::sync::Arc;

use tianniu_core::protocol::ErrorPayload;
use tianniu_core::{
    guard_listener, tianniu_debug, Host, HostEvent, HostEventKind, Integration, IntegrationError,
    ListenerOptions, Transport,
};

/// The tianniu error capture Integration.
#[derive(Debug, Default)]
pub struct ErrorsIntegration;

impl ErrorsIntegration {
    /// Creates a new error capture integration.
    pub fn new() -> Self {
        Self
    }
}

impl Integration for ErrorsIntegration {
    fn name(&self) -> &'static str {
        "errors"
    }

    fn init(
        &self,
        transport: &Arc<dyn Transport>,
        host: &Arc<dyn Host>,
    ) -> Result<(), IntegrationError> {
        for kind in [HostEventKind::Error, HostEventKind::UnhandledRejection] {
            let transport = transport.clone();
            let page = host.clone();
            host.add_event_listener(
                kind,
                ListenerOptions::default(),
                guard_listener("ErrorsIntegration", move |event| {
                    if let Some(payload) = payload_from_event(event, page.location_path()) {
                        tianniu_debug!("[ErrorsIntegration] Captured {:?}", event.kind());
                        transport.send(payload.into());
                    }
                }),
            );
        }
        Ok(())
    }
}

/// Builds the `error` payload for an error or rejection event.
///
/// Missing stacks and messages are reported as empty strings.
pub fn payload_from_event(event: &HostEvent, path: String) -> Option<ErrorPayload> {
    match event {
        HostEvent::Error(error) => Some(ErrorPayload {
            stack: error.error_stack().unwrap_or_default().to_owned(),
            message: error.error_message().to_owned(),
            path,
        }),
        HostEvent::UnhandledRejection(rejection) => Some(ErrorPayload {
            stack: rejection.reason_stack().unwrap_or_default().to_owned(),
            message: rejection.describe(),
            path,
        }),
        _ => None,
    }
}
