//! Manual reporting for framework error boundaries.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tianniu_core::protocol::ComponentErrorPayload;
use tianniu_core::{tianniu_debug, Host, Monitor, Transport};

/// The keys of a component error report that tags may not override.
const RESERVED_KEYS: &[&str] = &[
    "event_type",
    "type",
    "message",
    "stack",
    "componentStack",
    "path",
    "browserInfo",
];

/// An error caught by a UI framework while rendering a component tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentError {
    /// The error message.
    pub message: String,
    /// The error stack, if any.
    pub stack: Option<String>,
    /// The component stack reported by the framework, if any.
    pub component_stack: Option<String>,
}

impl ComponentError {
    /// Creates an error with just a message.
    pub fn new<S: Into<String>>(message: S) -> Self {
        ComponentError {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Attaches the error stack.
    #[must_use]
    pub fn with_stack<S: Into<String>>(mut self, stack: S) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Attaches the component stack.
    #[must_use]
    pub fn with_component_stack<S: Into<String>>(mut self, component_stack: S) -> Self {
        self.component_stack = Some(component_stack.into());
        self
    }
}

type ErrorCallback = Arc<dyn Fn(&ComponentError) + Send + Sync>;

/// Reports errors caught by a framework error boundary.
///
/// The boundary is handed its transport and page explicitly.  Every
/// captured error is sent as an `error` report of type `react_error`,
/// enriched with the configured tags, and then passed to the `on_error`
/// callback.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test")] {
/// use tianniu::test::{TestHost, TestTransport};
/// use tianniu::{ComponentError, ErrorBoundary};
///
/// let transport = TestTransport::new();
/// let boundary = ErrorBoundary::new(transport.clone(), TestHost::new());
/// boundary.capture(&ComponentError::new("render failed"));
/// assert_eq!(transport.fetch_and_clear_payloads().len(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct ErrorBoundary {
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    tags: Map<String, Value>,
    on_error: Option<ErrorCallback>,
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("tags", &self.tags)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl ErrorBoundary {
    /// Creates a boundary reporting through `transport`.
    pub fn new(transport: Arc<dyn Transport>, host: Arc<dyn Host>) -> Self {
        ErrorBoundary {
            transport,
            host,
            tags: Map::new(),
            on_error: None,
        }
    }

    /// Creates a boundary reporting through the current monitor.
    ///
    /// Returns `None` if no enabled monitor is bound.
    pub fn from_current() -> Option<Self> {
        let monitor = Monitor::current()?;
        let transport = monitor.transport()?;
        Some(ErrorBoundary::new(transport, monitor.host().clone()))
    }

    /// Sets the tags added to every report.
    ///
    /// Tags named like one of the report fields are dropped.
    #[must_use]
    pub fn with_tags(mut self, tags: Map<String, Value>) -> Self {
        self.tags = tags
            .into_iter()
            .filter(|(key, _)| {
                let reserved = RESERVED_KEYS.contains(&key.as_str());
                if reserved {
                    tianniu_debug!("[ErrorBoundary] ignoring reserved tag {}", key);
                }
                !reserved
            })
            .collect();
        self
    }

    /// Sets a callback invoked after every captured error was reported.
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ComponentError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// The tags added to every report.
    pub fn tags(&self) -> &Map<String, Value> {
        &self.tags
    }

    /// Reports `error` and then invokes the `on_error` callback.
    pub fn capture(&self, error: &ComponentError) {
        let payload = ComponentErrorPayload {
            ty: "react_error".into(),
            message: error.message.clone(),
            stack: error.stack.clone(),
            component_stack: error.component_stack.clone(),
            path: self.host.location_path(),
            tags: self.tags.clone(),
        };
        self.transport.send(payload.into());

        if let Some(ref callback) = self.on_error {
            callback(error);
        }
    }
}
