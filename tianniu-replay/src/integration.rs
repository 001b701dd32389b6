use std::sync::{Arc, Mutex};
use std::time::Duration;

use tianniu_core::protocol::{RecordPayload, ReplayEvent};
use tianniu_core::record::{EmitFn, RecordOptions, RecordingHandle};
use tianniu_core::{
    guard_listener, is_page_ready, tianniu_debug, Host, HostEvent, HostEventKind, Integration,
    IntegrationError, ListenerOptions, Recorder, Transport, DEFAULT_CHECKOUT_EVERY_NTH,
    DEFAULT_REPLAY_MAX_EVENTS, DEFAULT_REPLAY_WINDOW,
};

use crate::buffer::EventSegments;

/// The lifecycle of a recording session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the page to become ready.
    NotStarted,
    /// The recorder is running and events are buffered.
    Recording,
    /// A replay is being sent.
    Flushing,
    /// The page was unloaded or hidden; nothing happens anymore.
    Stopped,
}

#[derive(Debug)]
struct ReplayState {
    phase: Phase,
    segments: EventSegments,
    handle: Option<RecordingHandle>,
}

/// The tianniu session-replay Integration.
///
/// The integration records the user session with the host's [`Recorder`]
/// and keeps a bounded window of recent events.  When an uncaught error or
/// an unhandled rejection occurs, the events of the last
/// [`window`](Self::with_window) are sent as a `record` payload and the
/// buffer is reset.
///
/// Input contents are always masked by the recorder.
#[derive(Debug)]
pub struct SessionReplayIntegration {
    window: Duration,
    checkout_every_nth: u32,
    state: Arc<Mutex<ReplayState>>,
}

impl Default for SessionReplayIntegration {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionReplayIntegration {
    /// Creates a new session-replay integration.
    pub fn new() -> Self {
        SessionReplayIntegration {
            window: DEFAULT_REPLAY_WINDOW,
            checkout_every_nth: DEFAULT_CHECKOUT_EVERY_NTH,
            state: Arc::new(Mutex::new(ReplayState {
                phase: Phase::NotStarted,
                segments: EventSegments::new(DEFAULT_REPLAY_MAX_EVENTS),
                handle: None,
            })),
        }
    }

    /// Sets how far back a replay reaches.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Sets the maximum number of buffered events.
    #[must_use]
    pub fn with_max_events(self, max_events: usize) -> Self {
        self.state.lock().unwrap().segments = EventSegments::new(max_events);
        self
    }

    /// Sets after how many events the recorder takes a full snapshot.
    #[must_use]
    pub fn with_checkout_every_nth(mut self, checkout_every_nth: u32) -> Self {
        self.checkout_every_nth = checkout_every_nth;
        self
    }

    /// The current phase of the session.
    pub fn phase(&self) -> Phase {
        self.state.lock().unwrap().phase
    }

    /// The number of buffered events.
    pub fn buffered_events(&self) -> usize {
        self.state.lock().unwrap().segments.len()
    }
}

impl Integration for SessionReplayIntegration {
    fn name(&self) -> &'static str {
        "session-replay"
    }

    fn init(
        &self,
        transport: &Arc<dyn Transport>,
        host: &Arc<dyn Host>,
    ) -> Result<(), IntegrationError> {
        let recorder = host
            .recorder()
            .ok_or(IntegrationError::Unsupported("session recording"))?;
        let session = Arc::new(Session {
            window: self.window,
            checkout_every_nth: self.checkout_every_nth,
            state: self.state.clone(),
            transport: transport.clone(),
            host: host.clone(),
            recorder,
        });

        // error listeners go first so errors before the load event still flush
        let s = session.clone();
        host.add_event_listener(
            HostEventKind::Error,
            ListenerOptions::capture(),
            guard_listener("ReplayIntegration", move |event| {
                if let HostEvent::Error(error) = event {
                    s.flush(error.message.clone(), error.error_stack().map(str::to_owned));
                }
            }),
        );
        let s = session.clone();
        host.add_event_listener(
            HostEventKind::UnhandledRejection,
            ListenerOptions::default(),
            guard_listener("ReplayIntegration", move |event| {
                if let HostEvent::UnhandledRejection(rejection) = event {
                    s.flush(
                        rejection.describe(),
                        rejection.reason_stack().map(str::to_owned),
                    );
                }
            }),
        );

        // a failed start leaves the error listeners live, so init succeeds
        if is_page_ready(&**host) {
            if let Err(err) = session.start() {
                tianniu_debug!("[ReplayIntegration] {}", err);
            }
        } else {
            let s = session.clone();
            host.add_event_listener(
                HostEventKind::Load,
                ListenerOptions::default(),
                guard_listener("ReplayIntegration", move |_| {
                    if let Err(err) = s.start() {
                        tianniu_debug!("[ReplayIntegration] {}", err);
                    }
                }),
            );
        }

        for kind in [HostEventKind::Unload, HostEventKind::PageHide] {
            let s = session.clone();
            host.add_event_listener(
                kind,
                ListenerOptions::default(),
                guard_listener("ReplayIntegration", move |_| s.stop()),
            );
        }
        Ok(())
    }
}

struct Session {
    window: Duration,
    checkout_every_nth: u32,
    state: Arc<Mutex<ReplayState>>,
    transport: Arc<dyn Transport>,
    host: Arc<dyn Host>,
    recorder: Arc<dyn Recorder>,
}

impl Session {
    fn start(&self) -> Result<(), IntegrationError> {
        {
            let mut state = self.state.lock().unwrap();
            if state.phase != Phase::NotStarted {
                return Ok(());
            }
            state.phase = Phase::Recording;
        }

        let buffer = self.state.clone();
        let emit: EmitFn = Arc::new(move |event: ReplayEvent, checkpoint: bool| {
            let mut state = buffer.lock().unwrap();
            if matches!(state.phase, Phase::Recording | Phase::Flushing) {
                state.segments.push(event, checkpoint);
            }
        });

        // the recorder may emit the initial snapshot before returning
        match self
            .recorder
            .record(RecordOptions::new(self.checkout_every_nth), emit)
        {
            Ok(handle) => {
                let mut state = self.state.lock().unwrap();
                if state.phase == Phase::Stopped {
                    drop(state);
                    handle.stop();
                } else {
                    tianniu_debug!("[ReplayIntegration] Recording started");
                    state.handle = Some(handle);
                }
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.lock().unwrap();
                if state.phase == Phase::Recording {
                    state.phase = Phase::NotStarted;
                }
                Err(err.into())
            }
        }
    }

    fn flush(&self, message: String, stack: Option<String>) {
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        let cutoff = self.host.date_now().saturating_sub(window_ms);
        let events = {
            let mut state = self.state.lock().unwrap();
            if state.phase == Phase::Stopped {
                return;
            }
            if state.phase == Phase::Recording {
                state.phase = Phase::Flushing;
            }
            state.segments.drain_since(cutoff)
        };

        match serde_json::to_string(&events) {
            Ok(events) => {
                tianniu_debug!("[ReplayIntegration] Sending replay for: {}", message);
                self.transport.send(
                    RecordPayload {
                        events,
                        message,
                        path: self.host.location_path(),
                        stack,
                    }
                    .into(),
                );
            }
            Err(err) => tianniu_debug!("[ReplayIntegration] Failed to serialize replay: {}", err),
        }

        let mut state = self.state.lock().unwrap();
        if state.phase == Phase::Flushing {
            state.phase = Phase::Recording;
        }
    }

    fn stop(&self) {
        let handle = {
            let mut state = self.state.lock().unwrap();
            state.phase = Phase::Stopped;
            state.segments.reset();
            state.handle.take()
        };
        if let Some(handle) = handle {
            tianniu_debug!("[ReplayIntegration] Recording stopped");
            handle.stop();
        }
    }
}
