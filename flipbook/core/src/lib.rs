//! Flipbook Core - ASCII Animation Streaming over HTTP
//!
//! Plays terminal flipbook animations to HTTP clients. A `curl` pointed at
//! the server receives an endless, screen-clearing stream of frames; a
//! browser receives a landing page explaining how to do that.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      flipbook-daemon                          │
//! │   TcpListener ──accept──▶ per-connection task (tracing span)  │
//! └───────────────────────────────┬──────────────────────────────┘
//!                                 │ byte stream
//! ┌───────────────────────────────┼──────────────────────────────┐
//! │                        FLIPBOOK CORE                          │
//! │  ┌────────────────────────────┴───────────────────────────┐  │
//! │  │ transport::serve                                        │  │
//! │  │   RequestDecoder ──▶ Dispatcher::route ──▶ Response     │  │
//! │  │                          │                              │  │
//! │  │              classify(User-Agent)                       │  │
//! │  │              AnimationRegistry::lookup                  │  │
//! │  │                          │                              │  │
//! │  │                          ▼                              │  │
//! │  │   StreamingAnimationLoop ──▶ FrameSink                  │  │
//! │  │                                ├─ ChunkedSink (live)    │  │
//! │  │                                └─ BufferedSink (replay) │  │
//! │  └─────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`FrameSet`]: Ordered frames with a playback interval
//! - [`AnimationRegistry`]: Immutable name-to-frames map
//! - [`Dispatcher`]: Turns a request into a [`Route`]
//! - [`StreamingAnimationLoop`]: Drives frames into a [`FrameSink`]
//! - [`ServerConfig`]: Listening address, profile and limits
//!
//! # Module Overview
//!
//! - [`classifier`]: User-Agent based client classification
//! - [`config`]: Environment configuration and deployment profiles
//! - [`dispatch`]: Routing, listing payload, and landing page
//! - [`frames`]: Frame sets and the built-in seal
//! - [`player`]: The per-connection frame loop
//! - [`registry`]: Animation registry
//! - [`transport`]: HTTP request/response codec and output sinks

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod frames;
pub mod player;
pub mod registry;
pub mod transport;

// Re-exports for convenience
pub use classifier::{classify, ClientKind};
pub use config::{ConfigError, DeploymentProfile, ServerConfig};
pub use dispatch::{DispatchError, Dispatcher, Listing, Route};
pub use frames::{FrameSet, FrameSetError};
pub use player::{LoopConfig, LoopState, StreamReport, StreamingAnimationLoop};
pub use registry::{AnimationRegistry, RegistryError, DEFAULT_ANIMATION};

// Transport exports
pub use transport::{
    serve, BufferedSink, ChunkedSink, ConnectionId, FrameSink, ServeOptions, ServeOutcome,
    SinkCapabilities, SinkError, StatusCode,
};
