//! The tianniu performance capture integration.
//!
//! The `PerformanceIntegration`, which is enabled by default in `tianniu`,
//! waits for the page to finish loading and then reports the Web Vitals
//! family of metrics plus the full page load duration.
//!
//! Every metric is sent as its own `performance` payload as soon as it is
//! available.  Metrics the page never produces are never reported.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::sync::Arc;

use tianniu_core::protocol::{PerformancePayload, WebVital};
use tianniu_core::{
    guard_listener, tianniu_debug, Host, HostEventKind, Integration, IntegrationError,
    ListenerOptions, MetricSample, NavigationTiming, ReadyState, Transport,
};

/// The tianniu performance capture Integration.
#[derive(Debug, Default)]
pub struct PerformanceIntegration;

impl PerformanceIntegration {
    /// Creates a new performance capture integration.
    pub fn new() -> Self {
        Self
    }
}

impl Integration for PerformanceIntegration {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn init(
        &self,
        transport: &Arc<dyn Transport>,
        host: &Arc<dyn Host>,
    ) -> Result<(), IntegrationError> {
        if host.ready_state() == ReadyState::Complete {
            sample(transport, host);
        } else {
            let transport = transport.clone();
            let page = host.clone();
            host.add_event_listener(
                HostEventKind::Load,
                ListenerOptions::default(),
                guard_listener("PerformanceIntegration", move |_| sample(&transport, &page)),
            );
        }
        Ok(())
    }
}

/// Computes the page load duration in milliseconds.
///
/// This is `load_event_end - start_time` of the navigation timing entry.
/// Without an entry, or if the difference is not positive because the load
/// handlers have not finished yet, the current high resolution time is used.
pub fn load_time(timing: Option<NavigationTiming>, now: f64) -> f64 {
    match timing {
        Some(timing) if timing.load_event_end - timing.start_time > 0.0 => {
            timing.load_event_end - timing.start_time
        }
        _ => now,
    }
}

fn report(transport: &Arc<dyn Transport>, host: &Arc<dyn Host>, name: WebVital, value: f64) {
    tianniu_debug!("[PerformanceIntegration] {} = {}", name, value);
    transport.send(PerformancePayload::web_vital(name, value, host.location_path()).into());
}

fn sample(transport: &Arc<dyn Transport>, host: &Arc<dyn Host>) {
    match host.web_vitals() {
        Some(source) => {
            for metric in WebVital::OBSERVED {
                let transport = transport.clone();
                let host = host.clone();
                source.observe(
                    metric,
                    Arc::new(move |sample: MetricSample| {
                        report(&transport, &host, sample.name, sample.value)
                    }),
                );
            }
        }
        None => tianniu_debug!("[PerformanceIntegration] Host provides no Web Vitals source"),
    }

    let value = load_time(host.navigation_timing(), host.now());
    report(transport, host, WebVital::Load, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn timing(start_time: f64, load_event_end: f64) -> Option<NavigationTiming> {
        Some(NavigationTiming {
            start_time,
            dom_content_loaded_event_end: 0.0,
            load_event_end,
        })
    }

    #[rstest]
    #[case(timing(0.0, 1234.5), 99.0, 1234.5)]
    #[case(timing(100.0, 600.0), 99.0, 500.0)]
    #[case(timing(0.0, 0.0), 99.0, 99.0)]
    #[case(timing(500.0, 100.0), 99.0, 99.0)]
    #[case(None, 42.0, 42.0)]
    fn test_load_time(
        #[case] timing: Option<NavigationTiming>,
        #[case] now: f64,
        #[case] expected: f64,
    ) {
        assert_eq!(load_time(timing, now), expected);
    }
}
