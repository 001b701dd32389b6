//! The tianniu white-screen integration.
//!
//! Once the page finished loading, the `WhiteScreenIntegration` hit-tests
//! 17 points along two lines crossing the viewport: 9 points on the
//! horizontal line at mid-height and 8 more on the vertical line at
//! mid-width (the center is only tested once).
//!
//! A point is *empty* if nothing is found there or if the element found is
//! one of the configured top-level containers.  If every point is empty the
//! page is reported as blank with a single `whiteScreen` payload.
//!
//! This is a heuristic: content anywhere on the two lines disproves a white
//! screen, so a page that is blank everywhere else goes unnoticed.
//!
//! # Configuration
//!
//! ```
//! let integration = tianniu_white_screen::WhiteScreenIntegration::new()
//!     .with_containers(vec!["html".into(), "body".into(), "#container".into()]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tianniu_core::protocol::WhiteScreenPayload;
use tianniu_core::{
    guard_listener, tianniu_debug, Host, HostEventKind, Integration, IntegrationError,
    ListenerOptions, ReadyState, Transport, Viewport, DEFAULT_WHITE_BOX_ELEMENTS,
};

/// The number of points tested per page.
pub const SAMPLE_POINTS: usize = 17;

/// The tianniu white-screen Integration.
#[derive(Debug)]
pub struct WhiteScreenIntegration {
    containers: Arc<Vec<String>>,
}

impl Default for WhiteScreenIntegration {
    fn default() -> Self {
        Self::new()
    }
}

impl WhiteScreenIntegration {
    /// Creates a new white-screen integration with the default containers
    /// `html`, `body`, `#app` and `#root`.
    pub fn new() -> Self {
        WhiteScreenIntegration {
            containers: Arc::new(
                DEFAULT_WHITE_BOX_ELEMENTS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
        }
    }

    /// Replaces the container selectors.
    ///
    /// Selectors are compared verbatim against `#id`, `.class.names` or the
    /// lower-cased tag name of the element found at a point.
    #[must_use]
    pub fn with_containers(mut self, containers: Vec<String>) -> Self {
        self.containers = Arc::new(containers);
        self
    }

    /// The container selectors.
    pub fn containers(&self) -> &[String] {
        &self.containers
    }
}

impl Integration for WhiteScreenIntegration {
    fn name(&self) -> &'static str {
        "white-screen"
    }

    fn init(
        &self,
        transport: &Arc<dyn Transport>,
        host: &Arc<dyn Host>,
    ) -> Result<(), IntegrationError> {
        if host.ready_state() == ReadyState::Complete {
            report_if_blank(transport, &**host, &self.containers);
        } else {
            let transport = transport.clone();
            let page = host.clone();
            let containers = self.containers.clone();
            let done = AtomicBool::new(false);
            host.add_event_listener(
                HostEventKind::Load,
                ListenerOptions::default(),
                guard_listener("WhiteScreenIntegration", move |_| {
                    if !done.swap(true, Ordering::SeqCst) {
                        report_if_blank(&transport, &*page, &containers);
                    }
                }),
            );
        }
        Ok(())
    }
}

/// The points hit-tested on a viewport, in test order.
pub fn sample_points(viewport: Viewport) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(SAMPLE_POINTS);
    for i in 1..=9 {
        let fraction = f64::from(i) / 10.0;
        points.push((viewport.width * fraction, viewport.height / 2.0));
        if i != 5 {
            points.push((viewport.width / 2.0, viewport.height * fraction));
        }
    }
    points
}

/// Whether every sample point of the page is empty.
///
/// Sampling stops at the first point showing content.
pub fn is_blank(host: &dyn Host, containers: &[String]) -> bool {
    sample_points(host.viewport()).into_iter().all(|(x, y)| {
        match host.element_from_point(x, y) {
            Some(element) => {
                let selector = element.selector();
                containers.iter().any(|container| *container == selector)
            }
            None => true,
        }
    })
}

fn report_if_blank(transport: &Arc<dyn Transport>, host: &dyn Host, containers: &[String]) {
    if is_blank(host, containers) {
        tianniu_debug!("[WhiteScreenIntegration] Page rendered blank");
        transport.send(
            WhiteScreenPayload {
                path: host.location_path(),
            }
            .into(),
        );
    }
}
