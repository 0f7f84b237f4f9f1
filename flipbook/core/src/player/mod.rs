//! Streaming Animation Loop
//!
//! Drives a [`FrameSet`] into a [`FrameSink`] until something stops it.
//!
//! # State Machine
//!
//! ```text
//!            sink can flush?
//!   Idle ────────yes────────▶ Streaming ──budget spent──▶ Finished
//!     │                           │
//!     │                           └──peer closed / write failed──▶ Disconnected
//!     │
//!     └──────no──────▶ bounded replay ──▶ Unsupported
//! ```
//!
//! In streaming mode each tick clears the screen, writes the current frame and
//! a status line, flushes, and advances the index modulo the frame count. The
//! tick races the sink's disconnect signal and the disconnect always wins, so
//! nothing is written after the peer is gone.
//!
//! With a time budget every write must land before the budget runs out, and
//! the farewell gets [`FAREWELL_GRACE`] past that. A peer that stops reading
//! therefore cannot hold the loop open; the stalled write ends it as
//! `Disconnected`.
//!
//! When the sink cannot flush incrementally the whole body would be buffered
//! until the handler returns, so an endless loop would never deliver anything.
//! Instead the loop plays the sequence a fixed number of times and returns.

mod state;

pub use state::StreamState;

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

use crate::frames::FrameSet;
use crate::transport::{FrameSink, SinkError};

/// Escape sequence that clears the screen and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Default status line written under every streamed frame
pub const DEFAULT_STATUS_LINE: &str = "🦭 Wiggling seal! Press Ctrl+C to stop";

/// Default farewell written once the time budget runs out
pub const DEFAULT_FAREWELL: &str =
    "🦭 Thanks for watching! Run the command again for more seal wiggling!";

/// Time allowed for the farewell to reach a peer once the budget is spent
pub const FAREWELL_GRACE: Duration = Duration::from_secs(1);

/// Tuning for one run of the loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopConfig {
    /// Tick period; `None` uses the frame set's own interval
    pub tick_interval: Option<Duration>,
    /// Wall-clock budget for streaming mode; `None` streams until disconnect
    pub max_duration: Option<Duration>,
    /// Full passes over the frames in bounded replay mode
    pub replay_cycles: u32,
    /// Pause between frames in bounded replay mode
    pub replay_delay: Duration,
    /// Line written under every streamed frame
    pub status_line: String,
    /// Message written once when the budget is spent
    pub farewell: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: None,
            max_duration: None,
            replay_cycles: 3,
            replay_delay: Duration::from_millis(200),
            status_line: DEFAULT_STATUS_LINE.to_string(),
            farewell: DEFAULT_FAREWELL.to_string(),
        }
    }
}

impl LoopConfig {
    /// Override the tick period
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = Some(interval);
        self
    }

    /// Bound streaming mode to `budget` of wall-clock time
    #[must_use]
    pub fn with_max_duration(mut self, budget: Duration) -> Self {
        self.max_duration = Some(budget);
        self
    }

    /// Set the bounded replay cycle count
    #[must_use]
    pub fn with_replay_cycles(mut self, cycles: u32) -> Self {
        self.replay_cycles = cycles;
        self
    }

    /// Set the bounded replay inter-frame pause
    #[must_use]
    pub fn with_replay_delay(mut self, delay: Duration) -> Self {
        self.replay_delay = delay;
        self
    }

    /// Tick period to use for `frames`
    #[must_use]
    pub fn tick_for(&self, frames: &FrameSet) -> Duration {
        self.tick_interval.unwrap_or_else(|| frames.interval())
    }
}

/// Lifecycle of a single loop run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Created, not started
    Idle,
    /// Emitting frames on a timer
    Streaming,
    /// Time budget spent; farewell written
    Finished,
    /// Peer went away or a write failed
    Disconnected,
    /// Sink could not flush; bounded replay completed
    Unsupported,
}

impl LoopState {
    /// Whether the loop has stopped
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Disconnected | Self::Unsupported)
    }
}

/// Summary of a completed run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamReport {
    /// Terminal state the loop stopped in
    pub state: LoopState,
    /// Frames successfully handed to the sink
    pub frames_written: u64,
    /// Time from start to stop
    pub elapsed: Duration,
}

/// Render one streamed frame: clear, frame, newline, optional status line
#[must_use]
pub fn render_frame(frame: &str, status_line: Option<&str>) -> String {
    let status_len = status_line.map_or(0, |s| s.len() + 2);
    let mut out = String::with_capacity(CLEAR_SCREEN.len() + frame.len() + 2 + status_len);
    out.push_str(CLEAR_SCREEN);
    out.push_str(frame);
    out.push('\n');
    if let Some(status) = status_line {
        out.push('\n');
        out.push_str(status);
        out.push('\n');
    } else {
        out.push('\n');
    }
    out
}

/// The per-connection frame loop
#[derive(Debug)]
pub struct StreamingAnimationLoop<'a> {
    frames: &'a FrameSet,
    config: &'a LoopConfig,
    state: LoopState,
}

impl<'a> StreamingAnimationLoop<'a> {
    /// Create a loop over `frames` tuned by `config`
    #[must_use]
    pub fn new(frames: &'a FrameSet, config: &'a LoopConfig) -> Self {
        Self {
            frames,
            config,
            state: LoopState::Idle,
        }
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until a stop condition fires
    ///
    /// Never returns an error: every failure is a terminal state recorded in
    /// the report.
    pub async fn run<S>(&mut self, sink: &mut S) -> StreamReport
    where
        S: FrameSink + ?Sized,
    {
        let caps = sink.capabilities();
        let mut progress = StreamState::new(self.config.max_duration);

        self.state = if caps.incremental_flush {
            debug!(
                frames = self.frames.len(),
                tick_ms = self.config.tick_for(self.frames).as_millis() as u64,
                budget_ms = self.config.max_duration.map(|d| d.as_millis() as u64),
                "Streaming animation"
            );
            self.state = LoopState::Streaming;
            self.stream(sink, &mut progress, caps.disconnect_signal).await
        } else {
            debug!(
                frames = self.frames.len(),
                cycles = self.config.replay_cycles,
                "Sink cannot flush, falling back to bounded replay"
            );
            self.replay(sink, &mut progress).await
        };

        let report = StreamReport {
            state: self.state,
            frames_written: progress.frames_written(),
            elapsed: progress.elapsed(),
        };
        debug!(state = ?report.state, frames = report.frames_written, "Animation loop stopped");
        report
    }

    async fn stream<S>(
        &self,
        sink: &mut S,
        stream: &mut StreamState,
        watch_disconnect: bool,
    ) -> LoopState
    where
        S: FrameSink + ?Sized,
    {
        let mut ticker = tokio::time::interval(self.config.tick_for(self.frames));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = sink.closed(), if watch_disconnect => {
                    trace!("Peer closed connection");
                    return LoopState::Disconnected;
                }
                _ = ticker.tick() => {}
            }

            if stream.budget_exhausted() {
                let grace = Instant::now() + FAREWELL_GRACE;
                return match within(Some(grace), self.write_farewell(sink)).await {
                    Ok(()) => LoopState::Finished,
                    Err(e) => {
                        trace!(error = %e, "Farewell write failed");
                        LoopState::Disconnected
                    }
                };
            }

            let frame = render_frame(
                self.frames.frame_at(stream.frame_index()),
                Some(&self.config.status_line),
            );
            if let Err(e) = within(stream.deadline(), Self::emit(sink, &frame, true)).await {
                trace!(error = %e, "Frame write failed");
                return LoopState::Disconnected;
            }
            stream.record_frame(self.frames);
        }
    }

    async fn replay<S>(&self, sink: &mut S, stream: &mut StreamState) -> LoopState
    where
        S: FrameSink + ?Sized,
    {
        for _ in 0..self.config.replay_cycles {
            for frame in self.frames.iter() {
                if Self::emit(sink, &render_frame(frame, None), false)
                    .await
                    .is_err()
                {
                    return LoopState::Disconnected;
                }
                stream.record_frame(self.frames);
                tokio::time::sleep(self.config.replay_delay).await;
            }
        }

        match sink.finish().await {
            Ok(()) => LoopState::Unsupported,
            Err(_) => LoopState::Disconnected,
        }
    }

    async fn write_farewell<S>(&self, sink: &mut S) -> Result<(), SinkError>
    where
        S: FrameSink + ?Sized,
    {
        let farewell = format!("\n\n{}\n", self.config.farewell);
        sink.write(farewell.as_bytes()).await?;
        sink.finish().await
    }

    async fn emit<S>(sink: &mut S, frame: &str, flush: bool) -> Result<(), SinkError>
    where
        S: FrameSink + ?Sized,
    {
        sink.write(frame.as_bytes()).await?;
        if flush {
            sink.flush().await?;
        }
        Ok(())
    }
}

/// Run a sink operation, abandoning it once `deadline` passes
async fn within<F>(deadline: Option<Instant>, op: F) -> Result<(), SinkError>
where
    F: Future<Output = Result<(), SinkError>>,
{
    match deadline {
        Some(at) => tokio::time::timeout_at(at, op)
            .await
            .unwrap_or(Err(SinkError::TimedOut)),
        None => op.await,
    }
}
