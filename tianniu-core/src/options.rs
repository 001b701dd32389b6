use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_CHECKOUT_EVERY_NTH, DEFAULT_REPLAY_MAX_EVENTS, DEFAULT_REPLAY_WINDOW,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WHITE_BOX_ELEMENTS,
};
use crate::error::ConfigError;
use crate::types::Dsn;
use crate::{tianniu_debug, Integration, IntoDsn, TransportFactory};

/// Configuration settings for the monitor.
///
/// The options are captured once when the monitor initializes and never
/// change afterwards.
///
/// # Examples
///
/// ```
/// let _options = tianniu_core::MonitoringOptions {
///     watch_white_screen: true,
///     ..Default::default()
/// };
/// ```
#[derive(Clone)]
pub struct MonitoringOptions {
    /// The destination of all reports.  If not set the monitor is disabled.
    pub dsn: Option<Dsn>,
    /// Enables debug mode.
    ///
    /// In debug mode debug information is printed to stderr to help you
    /// understand what the SDK is doing.  With the `debug-logs` feature the
    /// output goes to the `tianniu` logger of the `log` crate instead.
    pub debug: bool,
    /// Custom integrations, initialized in list order before the built-in ones.
    pub integrations: Vec<Arc<dyn Integration>>,
    /// Whether the performance and error capture integrations are added.
    pub default_integrations: bool,
    /// Whether the white-screen sampler is added.
    pub watch_white_screen: bool,
    /// Selectors of the top-level containers a blank page consists of.
    pub white_box_elements: Vec<String>,
    /// Whether the session-replay recorder is added.
    pub record_user_error: bool,
    /// How far back a replay flush reaches.
    pub replay_window: Duration,
    /// The maximum number of replay events kept in memory.
    pub replay_max_events: usize,
    /// The recorder takes a checkpoint every this many events.
    pub replay_checkout_every_nth: u32,
    /// The transport to use.
    ///
    /// This is typically either a boxed function taking the options and host
    /// by reference and returning a `Transport`, an `Arc<Transport>` or the
    /// `DefaultTransportFactory` of the `tianniu` crate.
    pub transport: Option<Arc<dyn TransportFactory>>,
    /// The timeout on guard drop for draining pending deliveries.
    pub shutdown_timeout: Duration,
}

impl MonitoringOptions {
    /// Creates new Options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a configured integration to the options.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tianniu_core::{Host, Integration, IntegrationError, Transport};
    ///
    /// struct MyIntegration;
    ///
    /// impl Integration for MyIntegration {
    ///     fn init(
    ///         &self,
    ///         _transport: &Arc<dyn Transport>,
    ///         _host: &Arc<dyn Host>,
    ///     ) -> Result<(), IntegrationError> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let options = tianniu_core::MonitoringOptions::new().add_integration(MyIntegration);
    /// assert_eq!(options.integrations.len(), 1);
    /// ```
    #[must_use]
    pub fn add_integration<I: Integration>(mut self, integration: I) -> Self {
        self.integrations.push(Arc::new(integration));
        self
    }

    /// Whether a [`TransportFactory`] has been set on these options.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }
}

impl fmt::Debug for MonitoringOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Debug)]
        struct TransportFactory;

        let integrations: Vec<_> = self.integrations.iter().map(|i| i.name()).collect();
        f.debug_struct("MonitoringOptions")
            .field("dsn", &self.dsn)
            .field("debug", &self.debug)
            .field("integrations", &integrations)
            .field("default_integrations", &self.default_integrations)
            .field("watch_white_screen", &self.watch_white_screen)
            .field("white_box_elements", &self.white_box_elements)
            .field("record_user_error", &self.record_user_error)
            .field("replay_window", &self.replay_window)
            .field("replay_max_events", &self.replay_max_events)
            .field("replay_checkout_every_nth", &self.replay_checkout_every_nth)
            .field("transport", &TransportFactory)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

impl Default for MonitoringOptions {
    fn default() -> MonitoringOptions {
        MonitoringOptions {
            dsn: None,
            debug: false,
            integrations: vec![],
            default_integrations: true,
            watch_white_screen: false,
            white_box_elements: DEFAULT_WHITE_BOX_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            record_user_error: false,
            replay_window: DEFAULT_REPLAY_WINDOW,
            replay_max_events: DEFAULT_REPLAY_MAX_EVENTS,
            replay_checkout_every_nth: DEFAULT_CHECKOUT_EVERY_NTH,
            transport: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

/// An unparsable DSN disables the monitor instead of failing.
impl<T: IntoDsn> From<T> for MonitoringOptions {
    fn from(into_dsn: T) -> Self {
        let dsn = into_dsn.into_dsn().unwrap_or_else(|err| {
            tianniu_debug!("[MonitoringOptions] ignoring invalid DSN: {}", err);
            None
        });
        MonitoringOptions {
            dsn,
            ..MonitoringOptions::default()
        }
    }
}

impl<T: IntoDsn> From<(T, MonitoringOptions)> for MonitoringOptions {
    fn from((into_dsn, mut opts): (T, MonitoringOptions)) -> Self {
        opts.dsn = into_dsn.into_dsn().unwrap_or_else(|err| {
            tianniu_debug!("[MonitoringOptions] ignoring invalid DSN: {}", err);
            None
        });
        opts
    }
}

/// The declarative configuration surface, using the names of the browser
/// SDK (`dsn`, `watchWhiteScreen`, `whiteBoxElements`, `recordUserError`).
///
/// # Examples
///
/// ```
/// use std::convert::TryFrom;
/// use tianniu_core::{MonitorConfig, MonitoringOptions};
///
/// let config: MonitorConfig = serde_json::from_str(
///     r#"{"dsn": "http://localhost:3000/tracing/fewjonqks", "watchWhiteScreen": true}"#,
/// )
/// .unwrap();
/// let options = MonitoringOptions::try_from(config).unwrap();
/// assert!(options.watch_white_screen);
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// The destination URL.
    pub dsn: Option<String>,
    /// Enables the white-screen sampler.
    pub watch_white_screen: bool,
    /// Overrides the container selectors.
    pub white_box_elements: Option<Vec<String>>,
    /// Enables the session-replay recorder.
    pub record_user_error: bool,
    /// Enables debug output.
    pub debug: bool,
}

impl TryFrom<MonitorConfig> for MonitoringOptions {
    type Error = ConfigError;

    fn try_from(config: MonitorConfig) -> Result<Self, Self::Error> {
        let mut options = MonitoringOptions {
            dsn: config.dsn.into_dsn()?,
            watch_white_screen: config.watch_white_screen,
            record_user_error: config.record_user_error,
            debug: config.debug,
            ..MonitoringOptions::default()
        };
        if let Some(white_box_elements) = config.white_box_elements {
            options.white_box_elements = white_box_elements;
        }
        Ok(options)
    }
}
