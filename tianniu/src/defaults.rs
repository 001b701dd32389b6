use std::env;
use std::sync::Arc;

use tianniu_core::types::Dsn;
use tianniu_core::MonitoringOptions;

use crate::transports::DefaultTransportFactory;

/// Apply default monitor options.
///
/// Extends the given `MonitoringOptions` with default options such as a
/// default transport, a DSN from the environment and the built-in
/// integrations.  This function is invoked by [`init`](crate::init), so
/// calling it directly is only needed when building a `Monitor` by hand.
///
/// The built-in integrations are appended after the custom ones, in this
/// order:
///
/// 1. [`PerformanceIntegration`] and [`ErrorsIntegration`], if
///    `default_integrations` is set (the default).
/// 2. [`WhiteScreenIntegration`], if `watch_white_screen` is set.
/// 3. [`SessionReplayIntegration`], if `record_user_error` is set.
///
/// Each is only available if the crate feature of the same name is on.
///
/// [`PerformanceIntegration`]: crate::integrations::performance::PerformanceIntegration
/// [`ErrorsIntegration`]: crate::integrations::errors::ErrorsIntegration
/// [`WhiteScreenIntegration`]: crate::integrations::white_screen::WhiteScreenIntegration
/// [`SessionReplayIntegration`]: crate::integrations::replay::SessionReplayIntegration
///
/// # Examples
///
/// ```
/// let options = tianniu::apply_defaults(tianniu::MonitoringOptions::default());
/// assert!(options.has_transport());
/// ```
pub fn apply_defaults(mut opts: MonitoringOptions) -> MonitoringOptions {
    if !opts.has_transport() {
        opts.transport = Some(Arc::new(DefaultTransportFactory));
    }
    if opts.dsn.is_none() {
        opts.dsn = env::var("TIANNIU_DSN")
            .ok()
            .and_then(|dsn| dsn.parse::<Dsn>().ok());
    }
    if !opts.debug {
        opts.debug = env::var("TIANNIU_DEBUG")
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
    }

    if opts.default_integrations {
        #[cfg(feature = "performance")]
        {
            opts.integrations
                .push(Arc::new(tianniu_vitals::PerformanceIntegration::new()));
        }
        #[cfg(feature = "errors")]
        {
            opts.integrations
                .push(Arc::new(tianniu_errors::ErrorsIntegration::new()));
        }
    }
    #[cfg(feature = "white-screen")]
    {
        if opts.watch_white_screen {
            let integration = tianniu_white_screen::WhiteScreenIntegration::new()
                .with_containers(opts.white_box_elements.clone());
            opts.integrations.push(Arc::new(integration));
        }
    }
    #[cfg(feature = "replay")]
    {
        if opts.record_user_error {
            let integration = tianniu_replay::SessionReplayIntegration::new()
                .with_window(opts.replay_window)
                .with_max_events(opts.replay_max_events)
                .with_checkout_every_nth(opts.replay_checkout_every_nth);
            opts.integrations.push(Arc::new(integration));
        }
    }
    opts
}
