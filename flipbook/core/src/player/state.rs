//! Per-connection loop bookkeeping

use std::time::Duration;

use tokio::time::Instant;

use crate::frames::FrameSet;

/// Mutable state owned by a single loop run
///
/// Uses tokio's clock so paused-time tests see the same elapsed values the
/// timer does.
#[derive(Clone, Debug)]
pub struct StreamState {
    frame_index: usize,
    started: Instant,
    budget: Option<Duration>,
    frames_written: u64,
}

impl StreamState {
    /// Start the clock with an optional elapsed-time budget
    #[must_use]
    pub fn new(budget: Option<Duration>) -> Self {
        Self {
            frame_index: 0,
            started: Instant::now(),
            budget,
            frames_written: 0,
        }
    }

    /// Index of the next frame to emit
    #[must_use]
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Frames emitted so far
    #[must_use]
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Time since the stream started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the elapsed time has gone past the budget
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.budget.is_some_and(|budget| self.elapsed() > budget)
    }

    /// Instant at which the budget runs out, if there is one
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.budget.map(|budget| self.started + budget)
    }

    /// Count an emitted frame and advance circularly through `frames`
    pub fn record_frame(&mut self, frames: &FrameSet) {
        self.frames_written += 1;
        self.frame_index = frames.next_index(self.frame_index);
    }
}
