use std::sync::Arc;

use tianniu_core::{tianniu_debug, Host, Monitor, MonitoringOptions};

use crate::defaults::apply_defaults;

/// Helper struct that is returned from `init`.
///
/// When this is dropped the monitor is unbound and pending deliveries are
/// drained for at most `shutdown_timeout`.
#[must_use = "when the init guard is dropped the transport will be shut down and no further \
              reports can be sent.  If you do want to ignore this use mem::forget on it."]
pub struct MonitorInitGuard(Arc<Monitor>);

impl MonitorInitGuard {
    /// Quick check if the monitor is enabled.
    pub fn is_enabled(&self) -> bool {
        self.0.is_enabled()
    }

    /// The monitor created by `init`.
    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.0
    }
}

impl Drop for MonitorInitGuard {
    fn drop(&mut self) {
        if self.is_enabled() {
            tianniu_debug!("[Monitor] dropping init guard -> disposing monitor");
        } else {
            tianniu_debug!("[Monitor] dropping init guard (no monitor to dispose)");
        }
        Monitor::unbind(&self.0);
        self.0.close(None);
    }
}

/// Creates the monitor for the page `host` and binds it as the current one.
///
/// Missing options are filled in by [`apply_defaults`](crate::apply_defaults),
/// which also appends the built-in integrations.  If a DSN is configured a
/// transport is created and every integration is initialized, custom ones
/// first.  Without a DSN the monitor stays disabled: nothing is observed
/// and all reporting calls are no-ops.
///
/// This returns an init guard that must be kept in scope.  When the guard
/// is dropped the transport shuts down and no further reports can be sent.
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test")] {
/// let host = tianniu::test::TestHost::new();
/// let guard = tianniu::init(host, tianniu::MonitoringOptions::default());
/// assert!(!guard.is_enabled());
/// # }
/// ```
pub fn init<O: Into<MonitoringOptions>>(host: Arc<dyn Host>, options: O) -> MonitorInitGuard {
    let options = apply_defaults(options.into());
    let factory = options.transport.clone();
    let monitor = Arc::new(Monitor::new(options, host));

    match (monitor.dsn(), factory) {
        (Some(dsn), Some(factory)) => {
            tianniu_debug!("[Monitor] enabled monitor for DSN {}", dsn);
            let transport = factory.create_transport(monitor.options(), monitor.host());
            monitor.init(transport);
        }
        (Some(_), None) => {
            tianniu_debug!("[Monitor] initialized disabled monitor: no transport configured");
        }
        (None, _) => {
            tianniu_debug!("[Monitor] initialized disabled monitor due to missing or invalid DSN");
        }
    }

    Monitor::bind(monitor.clone());
    MonitorInitGuard(monitor)
}
