//! The boundary to the DOM recording mechanism.

use std::fmt;
use std::sync::Arc;

use crate::error::RecordError;
use crate::protocol::ReplayEvent;

/// Receives recorded events.  The flag marks full-state snapshots
/// (checkpoints) as opposed to incremental records.
pub type EmitFn = Arc<dyn Fn(ReplayEvent, bool) + Send + Sync>;

/// How the recorder is started.
///
/// Input contents are always masked; there is no way to turn that off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOptions {
    checkout_every_nth: u32,
    pack: bool,
}

impl RecordOptions {
    /// Options taking a checkpoint every `checkout_every_nth` events.
    pub fn new(checkout_every_nth: u32) -> Self {
        RecordOptions {
            checkout_every_nth,
            pack: true,
        }
    }

    /// A full snapshot is taken after this many events.
    pub fn checkout_every_nth(&self) -> u32 {
        self.checkout_every_nth
    }

    /// Whether input field contents are masked before capture.
    pub fn mask_all_inputs(&self) -> bool {
        true
    }

    /// Whether the recorder should compress emitted events.
    pub fn pack(&self) -> bool {
        self.pack
    }
}

/// Stops a running recording.
#[must_use = "dropping the handle does not stop the recording"]
pub struct RecordingHandle {
    stop: Box<dyn FnOnce() + Send>,
}

impl RecordingHandle {
    /// Creates a handle running `stop` when the recording is stopped.
    pub fn new<F: FnOnce() + Send + 'static>(stop: F) -> Self {
        RecordingHandle {
            stop: Box::new(stop),
        }
    }

    /// Stops the recording.
    pub fn stop(self) {
        (self.stop)()
    }
}

impl fmt::Debug for RecordingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHandle").finish()
    }
}

/// A DOM mutation and interaction recorder.
pub trait Recorder: Send + Sync {
    /// Starts recording, passing every event to `emit`.
    ///
    /// The initial full snapshot may be emitted before this returns.
    fn record(&self, options: RecordOptions, emit: EmitFn) -> Result<RecordingHandle, RecordError>;
}
