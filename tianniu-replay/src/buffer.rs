use std::collections::VecDeque;

use tianniu_core::protocol::ReplayEvent;

/// A bounded store of replay events, segmented at checkpoints.
///
/// Every checkpoint opens a new segment, so any suffix of segments starts
/// with a full snapshot (except for the very first segment, which collects
/// whatever arrives before the first checkpoint).  The total number of
/// events is capped; the oldest events are evicted first.
///
/// There is always at least one segment.
#[derive(Clone, Debug)]
pub struct EventSegments {
    segments: VecDeque<VecDeque<ReplayEvent>>,
    len: usize,
    max_events: usize,
}

impl EventSegments {
    /// Creates an empty buffer holding at most `max_events` events.
    pub fn new(max_events: usize) -> Self {
        let mut segments = VecDeque::new();
        segments.push_back(VecDeque::new());
        EventSegments {
            segments,
            len: 0,
            max_events,
        }
    }

    /// Appends an event, opening a new segment if it is a checkpoint.
    ///
    /// Returns the number of events evicted to stay within the cap.
    pub fn push(&mut self, event: ReplayEvent, checkpoint: bool) -> usize {
        if checkpoint || self.segments.is_empty() {
            self.segments.push_back(VecDeque::new());
        }
        if let Some(last) = self.segments.back_mut() {
            last.push_back(event);
            self.len += 1;
        }
        self.trim()
    }

    fn trim(&mut self) -> usize {
        let mut evicted = 0;
        while self.len > self.max_events {
            let first = match self.segments.front_mut() {
                Some(first) => first,
                None => break,
            };
            if first.pop_front().is_some() {
                self.len -= 1;
                evicted += 1;
            }
            if first.is_empty() {
                if self.segments.len() > 1 {
                    self.segments.pop_front();
                } else {
                    break;
                }
            }
        }
        evicted
    }

    /// Returns the events with `timestamp >= cutoff`, in arrival order.
    pub fn collect_since(&self, cutoff: u64) -> Vec<ReplayEvent> {
        self.segments
            .iter()
            .flatten()
            .filter(|event| event.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Like [`collect_since`](Self::collect_since), but resets the buffer to
    /// a single empty segment afterwards.
    pub fn drain_since(&mut self, cutoff: u64) -> Vec<ReplayEvent> {
        let segments = std::mem::take(&mut self.segments);
        self.reset();
        segments
            .into_iter()
            .flatten()
            .filter(|event| event.timestamp >= cutoff)
            .collect()
    }

    /// Drops all events, leaving a single empty segment.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.segments.push_back(VecDeque::new());
        self.len = 0;
    }

    /// The total number of retained events.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The number of events in each segment, oldest first.
    pub fn segment_lens(&self) -> Vec<usize> {
        self.segments.iter().map(VecDeque::len).collect()
    }

    /// The cap on retained events.
    pub fn max_events(&self) -> usize {
        self.max_events
    }
}
