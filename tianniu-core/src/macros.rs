use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Whether SDK-internal debug output is enabled.
#[doc(hidden)]
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

pub(crate) fn set_debug_enabled(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

/// Prints SDK-internal debug output.
///
/// Output goes to stderr when the monitor was configured with `debug`.  With
/// the `debug-logs` feature it is forwarded to the `log` crate instead.
#[cfg(not(feature = "debug-logs"))]
#[macro_export]
#[doc(hidden)]
macro_rules! tianniu_debug {
    ($($arg:tt)*) => {
        if $crate::debug_enabled() {
            eprint!("[tianniu] ");
            eprintln!($($arg)*);
        }
    }
}

/// Prints SDK-internal debug output.
///
/// Output goes to stderr when the monitor was configured with `debug`.  With
/// the `debug-logs` feature it is forwarded to the `log` crate instead.
#[cfg(feature = "debug-logs")]
#[macro_export]
#[doc(hidden)]
macro_rules! tianniu_debug {
    ($($arg:tt)*) => {
        $crate::__log::debug!(target: "tianniu", $($arg)*)
    }
}
