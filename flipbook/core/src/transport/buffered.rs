//! Buffered Sink
//!
//! Collects the whole body in memory. This is the shape of platform adapters
//! that hand the response to the host only once the handler returns, so it
//! advertises neither incremental flush nor a disconnect signal and the loop
//! falls back to bounded replay.

use async_trait::async_trait;

use super::traits::{FrameSink, SinkCapabilities, SinkError};

/// In-memory sink with no incremental delivery
#[derive(Debug, Default)]
pub struct BufferedSink {
    body: Vec<u8>,
    finished: bool,
}

impl BufferedSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the producer finished the body
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Body collected so far
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take the collected body
    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

#[async_trait]
impl FrameSink for BufferedSink {
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::buffered()
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn closed(&mut self) {
        std::future::pending::<()>().await;
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
