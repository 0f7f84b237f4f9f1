//! Transport Traits
//!
//! The [`FrameSink`] trait is the seam between the animation loop and whatever
//! carries bytes to the client. Sinks declare their abilities up front through
//! [`SinkCapabilities`]; the loop reads them once per connection and never
//! probes again.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Unique identifier for an accepted connection
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Generate a new random connection ID
    #[must_use]
    pub fn new() -> Self {
        use rand::Rng;
        let bytes: [u8; 8] = rand::thread_rng().gen();
        Self(format!("conn_{}", hex::encode(bytes)))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an output sink can do, fixed for the lifetime of the connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SinkCapabilities {
    /// Partial output can be pushed to the peer before the response ends
    pub incremental_flush: bool,
    /// The sink can report that the peer went away
    pub disconnect_signal: bool,
}

impl SinkCapabilities {
    /// A live socket: flushes and notices disconnects
    #[must_use]
    pub const fn streaming() -> Self {
        Self {
            incremental_flush: true,
            disconnect_signal: true,
        }
    }

    /// A body that is collected and sent in one piece
    #[must_use]
    pub const fn buffered() -> Self {
        Self {
            incremental_flush: false,
            disconnect_signal: false,
        }
    }
}

/// Errors surfaced by a sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// The peer closed the connection or the pipe broke
    #[error("peer disconnected")]
    Disconnected,

    /// The peer stopped reading and a write outlived its deadline
    #[error("write deadline passed")]
    TimedOut,

    /// Any other I/O failure on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// Classify an I/O error, folding closed-socket kinds into `Disconnected`
    #[must_use]
    pub fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::UnexpectedEof
            | ErrorKind::NotConnected => Self::Disconnected,
            _ => Self::Io(err),
        }
    }
}

/// Destination for animation output
#[async_trait]
pub trait FrameSink: Send {
    /// Capabilities of this sink; must not change once the sink exists
    fn capabilities(&self) -> SinkCapabilities;

    /// Queue bytes for the peer
    async fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Push queued bytes to the peer now
    ///
    /// Sinks without incremental flush treat this as a no-op.
    async fn flush(&mut self) -> Result<(), SinkError>;

    /// Resolve once the peer has gone away
    ///
    /// Must be cancel-safe: the loop races it against the frame timer and
    /// drops it whenever the timer wins. Sinks without a disconnect signal
    /// never resolve.
    async fn closed(&mut self);

    /// Terminate the response body cleanly
    async fn finish(&mut self) -> Result<(), SinkError> {
        self.flush().await
    }
}
