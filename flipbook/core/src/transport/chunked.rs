//! Chunked Streaming Sink
//!
//! Writes the response body with HTTP/1.1 chunked transfer framing over the
//! write half of a connection and watches the read half for the peer going
//! away.
//!
//! # Chunk Format
//!
//! ```text
//! <size in hex>\r\n<payload>\r\n      one per write
//! 0\r\n\r\n                           once, on finish
//! ```

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

use super::traits::{FrameSink, SinkCapabilities, SinkError};

/// Terminating zero-length chunk
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Encode `payload` as a single chunk
#[must_use]
pub fn encode_chunk(payload: &[u8]) -> Vec<u8> {
    let size = format!("{:X}\r\n", payload.len());
    let mut out = Vec::with_capacity(size.len() + payload.len() + 2);
    out.extend_from_slice(size.as_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\r\n");
    out
}

/// Live streaming sink over a split connection
pub struct ChunkedSink<R, W> {
    reader: R,
    writer: BufWriter<W>,
    peer_closed: bool,
    finished: bool,
}

impl<R, W> ChunkedSink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap the two halves of a connection whose response head is already sent
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: BufWriter::new(writer),
            peer_closed: false,
            finished: false,
        }
    }

    /// Whether the peer has been seen to close
    #[must_use]
    pub fn peer_closed(&self) -> bool {
        self.peer_closed
    }

    /// Give back the underlying halves
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer.into_inner())
    }
}

#[async_trait]
impl<R, W> FrameSink for ChunkedSink<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn capabilities(&self) -> SinkCapabilities {
        SinkCapabilities::streaming()
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        if self.peer_closed {
            return Err(SinkError::Disconnected);
        }
        // A zero-length chunk would terminate the body.
        if bytes.is_empty() {
            return Ok(());
        }
        self.writer
            .write_all(&encode_chunk(bytes))
            .await
            .map_err(SinkError::from_io)
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if self.peer_closed {
            return Err(SinkError::Disconnected);
        }
        self.writer.flush().await.map_err(SinkError::from_io)
    }

    async fn closed(&mut self) {
        let mut scratch = [0u8; 256];
        while !self.peer_closed {
            match self.reader.read(&mut scratch).await {
                // Clients never send a body; anything extra is discarded.
                Ok(n) if n > 0 => {}
                Ok(_) | Err(_) => self.peer_closed = true,
            }
        }
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        if self.finished {
            return Ok(());
        }
        self.writer
            .write_all(LAST_CHUNK)
            .await
            .map_err(SinkError::from_io)?;
        self.writer.flush().await.map_err(SinkError::from_io)?;
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn test_encode_chunk() {
        assert_eq!(encode_chunk(b"hello"), b"5\r\nhello\r\n");
        assert_eq!(encode_chunk(&[b'x'; 26])[..4], *b"1A\r\n");
    }

    #[tokio::test]
    async fn test_write_flush_finish() {
        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let mut sink = ChunkedSink::new(server_read, server_write);

        sink.write(b"frame").await.unwrap();
        sink.write(b"").await.unwrap();
        sink.flush().await.unwrap();
        sink.finish().await.unwrap();
        drop(sink);

        let mut received = Vec::new();
        let (mut client_read, _client_write) = tokio::io::split(client);
        client_read.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"5\r\nframe\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn test_closed_resolves_on_peer_eof() {
        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let mut sink = ChunkedSink::new(server_read, server_write);

        drop(client);
        sink.closed().await;

        assert!(sink.peer_closed());
        assert!(matches!(
            sink.write(b"late").await,
            Err(SinkError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_closed_ignores_stray_bytes() {
        let (client, server) = duplex(4096);
        let (server_read, server_write) = tokio::io::split(server);
        let mut sink = ChunkedSink::new(server_read, server_write);

        let (_client_read, mut client_write) = tokio::io::split(client);
        client_write.write_all(b"junk").await.unwrap();

        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(20), sink.closed()).await;
        assert!(pending.is_err());
        assert!(!sink.peer_closed());
    }

    #[test]
    fn test_capabilities() {
        let (_client, server) = duplex(64);
        let (r, w) = tokio::io::split(server);
        let sink = ChunkedSink::new(r, w);
        assert_eq!(sink.capabilities(), SinkCapabilities::streaming());
    }
}
