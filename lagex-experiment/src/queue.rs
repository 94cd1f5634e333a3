use std::collections::VecDeque;

use lagex_core::PoseSample;
use tracing::warn;

/// FIFO of tracked poses waiting out the artificial latency.
///
/// Position, rotation, flags and timestamp travel together in one record so
/// they cannot drift apart.
#[derive(Debug, Default)]
pub struct DelayedPoseQueue {
    samples: VecDeque<PoseSample>,
}

impl DelayedPoseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the newest sample. Timestamps stay non-decreasing.
    pub fn push(&mut self, mut sample: PoseSample) {
        if let Some(tail) = self.samples.back() {
            if sample.timestamp < tail.timestamp {
                warn!(
                    sample = sample.timestamp,
                    tail = tail.timestamp,
                    "pose timestamp went backwards, clamping to queue tail"
                );
                sample.timestamp = tail.timestamp;
            }
        }
        self.samples.push_back(sample);
    }

    /// Releases the head if it has aged past `latency_ms`.
    ///
    /// Only the head is inspected and at most one sample leaves per call, even
    /// when several are overdue; the rest wait for the following ticks.
    pub fn try_release(&mut self, now: f64, latency_ms: u32) -> Option<PoseSample> {
        if self.samples.front()?.is_ready(now, latency_ms) {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn front(&self) -> Option<&PoseSample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
