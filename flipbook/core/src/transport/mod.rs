//! HTTP Transport
//!
//! A deliberately small HTTP/1.1 layer over tokio byte streams:
//! - `request`: incremental request-head decoder
//! - `response`: status codes and response encoding
//! - `chunked`: live streaming sink with chunked transfer framing
//! - `buffered`: in-memory sink for hosts that cannot stream
//! - `connection`: one request, one response, then close
//!
//! # Design Philosophy
//!
//! The server only ever answers a single `GET` per connection and streams
//! its body until the peer leaves, so there is no keep-alive, no pipelining,
//! and no request bodies. Anything that needs more than this should sit
//! behind a reverse proxy.

pub mod buffered;
pub mod chunked;
pub mod connection;
pub mod request;
pub mod response;
pub mod traits;

// Re-exports for convenience
pub use buffered::BufferedSink;
pub use chunked::{encode_chunk, ChunkedSink};
pub use connection::{reject, serve, ServeOptions, ServeOutcome};
pub use request::{Request, RequestDecoder, RequestError};
pub use response::{Response, ResponseHead, StatusCode};
pub use traits::{ConnectionId, FrameSink, SinkCapabilities, SinkError};
