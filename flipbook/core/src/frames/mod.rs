//! Frame Sets
//!
//! A [`FrameSet`] is the unit of animation: an ordered, immutable list of
//! pre-rendered text frames plus the delay between them. Frame sets are built
//! once at startup from static artwork and shared read-only afterwards.
//!
//! Indexed access never fails. Any index outside `0..len` resolves to the
//! first frame, so a stale or corrupted index still renders something.

mod seal;

use std::borrow::Cow;
use std::time::Duration;

use thiserror::Error;

pub use seal::SEAL_FRAMES;

/// Delay used when a frame set is built without an explicit interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(70);

/// Errors raised while constructing a [`FrameSet`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameSetError {
    /// No frames were supplied
    #[error("frame set must contain at least one frame")]
    Empty,

    /// The inter-frame delay was zero
    #[error("frame interval must be greater than zero")]
    ZeroInterval,
}

/// Immutable ordered sequence of frames with a fixed inter-frame delay
#[derive(Clone, Debug)]
pub struct FrameSet {
    frames: Box<[Cow<'static, str>]>,
    interval: Duration,
}

impl FrameSet {
    /// Build a frame set from owned or static frames
    ///
    /// # Errors
    ///
    /// Returns [`FrameSetError::Empty`] when `frames` yields nothing and
    /// [`FrameSetError::ZeroInterval`] when `interval` is zero.
    pub fn new<I, S>(frames: I, interval: Duration) -> Result<Self, FrameSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let frames: Box<[Cow<'static, str>]> = frames.into_iter().map(Into::into).collect();

        if frames.is_empty() {
            return Err(FrameSetError::Empty);
        }
        if interval.is_zero() {
            return Err(FrameSetError::ZeroInterval);
        }

        Ok(Self { frames, interval })
    }

    /// Build a frame set using [`DEFAULT_INTERVAL`]
    pub fn with_default_interval<I, S>(frames: I) -> Result<Self, FrameSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self::new(frames, DEFAULT_INTERVAL)
    }

    /// Build a frame set that borrows static artwork without copying it
    pub fn from_static(
        frames: &'static [&'static str],
        interval: Duration,
    ) -> Result<Self, FrameSetError> {
        Self::new(frames.iter().copied(), interval)
    }

    /// Frame at `index`, or the first frame when `index` is out of range
    ///
    /// Accepts any integer type. Negative values and values past the end both
    /// fall back to frame zero.
    pub fn frame_at<I: TryInto<usize>>(&self, index: I) -> &str {
        index
            .try_into()
            .ok()
            .and_then(|i| self.frames.get(i))
            .unwrap_or(&self.frames[0])
    }

    /// Number of frames (always at least one)
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false`; present for API symmetry with collections
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Delay between frame transitions
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index of the frame that follows `index`, wrapping to zero
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.frames.len()
    }

    /// Iterate frames in playback order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().map(AsRef::as_ref)
    }
}
