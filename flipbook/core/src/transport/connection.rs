//! Connection Handling
//!
//! Serves exactly one request on an accepted byte stream:
//!
//! ```text
//! read head ──timeout──▶ 408
//!    │ ──bad head──────▶ 400 / 431
//!    ▼
//! Dispatcher::route
//!    ├─ Listing   ──▶ 200 application/json
//!    ├─ Page      ──▶ 200 text/html
//!    ├─ NotFound  ──▶ 404 text/plain
//!    ├─ Method    ──▶ 405 + Allow
//!    └─ Stream    ──▶ 200 chunked ──▶ StreamingAnimationLoop ──▶ close
//! ```
//!
//! The stream is generic so tests can drive it over `tokio::io::duplex`.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::buffered::BufferedSink;
use super::chunked::ChunkedSink;
use super::request::{Request, RequestDecoder, RequestError};
use super::response::{Response, ResponseHead, StatusCode, TEXT_PLAIN};
use crate::config::DEFAULT_HEADER_TIMEOUT;
use crate::dispatch::{Dispatcher, Route};
use crate::frames::FrameSet;
use crate::player::{LoopConfig, StreamReport, StreamingAnimationLoop};

/// Read buffer size for the request head
const READ_CHUNK: usize = 1024;

/// Per-connection behavior
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServeOptions {
    /// Loop tuning for streamed animations
    pub loop_config: LoopConfig,
    /// Collect the animation into one body instead of streaming it
    pub buffered: bool,
    /// Time allowed for the request head to arrive
    pub header_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            loop_config: LoopConfig::default(),
            buffered: false,
            header_timeout: DEFAULT_HEADER_TIMEOUT,
        }
    }
}

/// What happened on a served connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The peer closed before sending a complete request
    NoRequest,
    /// A complete, non-streamed response was sent
    Responded(StatusCode),
    /// An animation ran to a terminal state
    Streamed {
        /// Animation name
        animation: String,
        /// How the loop ended
        report: StreamReport,
    },
}

/// Serve one request on `stream` and close it
///
/// # Errors
///
/// Returns I/O errors hit while writing a complete response. Failures during
/// streaming are not errors; they end up in the [`StreamReport`].
pub async fn serve<S>(
    stream: S,
    dispatcher: &Dispatcher,
    options: &ServeOptions,
) -> io::Result<ServeOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let request =
        match tokio::time::timeout(options.header_timeout, read_request(&mut reader)).await {
            Err(_) => {
                debug!(
                    timeout_ms = options.header_timeout.as_millis() as u64,
                    "Request head timed out"
                );
                return respond(
                    &mut writer,
                    &Response::text(StatusCode::RequestTimeout, "Request timeout\n"),
                    true,
                )
                .await;
            }
            Ok(Ok(Some(request))) => request,
            Ok(Ok(None)) => return Ok(ServeOutcome::NoRequest),
            Ok(Err(e)) => {
                debug!(error = %e, "Rejecting malformed request");
                let status = match e {
                    RequestError::HeadTooLarge => StatusCode::HeaderFieldsTooLarge,
                    _ => StatusCode::BadRequest,
                };
                return respond(&mut writer, &Response::text(status, format!("{e}\n")), true)
                    .await;
            }
        };

    debug!(
        method = request.method(),
        path = request.path(),
        user_agent = request.user_agent().unwrap_or("-"),
        "Request received"
    );
    let include_body = !request.is_head();

    match dispatcher.route(&request) {
        Route::Listing(listing) => {
            let response = match serde_json::to_vec(&listing) {
                Ok(body) => Response::json(body),
                Err(e) => {
                    warn!(error = %e, "Failed to encode listing");
                    Response::text(StatusCode::InternalServerError, "Internal error\n")
                }
            };
            respond(&mut writer, &response, include_body).await
        }
        Route::Page(html) => respond(&mut writer, &Response::html(html), include_body).await,
        Route::NotFound(e) => {
            debug!(error = %e, "Unknown animation");
            respond(
                &mut writer,
                &Response::text(StatusCode::NotFound, format!("{e}\n")),
                include_body,
            )
            .await
        }
        Route::MethodNotAllowed => {
            let response = Response::new(
                ResponseHead::new(StatusCode::MethodNotAllowed)
                    .header("Content-Type", TEXT_PLAIN)
                    .header("Allow", "GET, HEAD"),
                "Method not allowed\n",
            );
            respond(&mut writer, &response, include_body).await
        }
        Route::Stream { name, frames } => {
            if !include_body {
                writer.write_all(&ResponseHead::streaming().encode()).await?;
                writer.shutdown().await?;
                return Ok(ServeOutcome::Responded(StatusCode::Ok));
            }

            let report = if options.buffered {
                stream_buffered(&mut writer, frames, &options.loop_config).await?
            } else {
                writer.write_all(&ResponseHead::streaming().encode()).await?;
                writer.flush().await?;

                let mut sink = ChunkedSink::new(reader, writer);
                let report = StreamingAnimationLoop::new(frames, &options.loop_config)
                    .run(&mut sink)
                    .await;
                let (_, mut writer) = sink.into_inner();
                // The peer may already be gone.
                let _ = writer.shutdown().await;
                report
            };

            info!(
                animation = %name,
                state = ?report.state,
                frames = report.frames_written,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Animation finished"
            );
            Ok(ServeOutcome::Streamed {
                animation: name,
                report,
            })
        }
    }
}

/// Send a bare status response, e.g. when the server is over capacity
///
/// # Errors
///
/// Returns the I/O error if the write fails.
pub async fn reject<W>(writer: &mut W, status: StatusCode, message: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = Response::text(status, format!("{message}\n"));
    writer.write_all(&response.encode(true)).await?;
    writer.shutdown().await
}

async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut decoder = RequestDecoder::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        if let Some(request) = decoder.decode()? {
            return Ok(Some(request));
        }
        match reader.read(&mut chunk).await {
            Ok(0) => {
                if decoder.buffered() > 0 {
                    debug!(buffered = decoder.buffered(), "Peer closed mid-request");
                }
                return Ok(None);
            }
            Ok(n) => decoder.push(&chunk[..n]),
            Err(e) => {
                debug!(error = %e, "Read failed before request completed");
                return Ok(None);
            }
        }
    }
}

async fn respond<W>(
    writer: &mut W,
    response: &Response,
    include_body: bool,
) -> io::Result<ServeOutcome>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.encode(include_body)).await?;
    writer.shutdown().await?;
    Ok(ServeOutcome::Responded(response.status()))
}

async fn stream_buffered<W>(
    writer: &mut W,
    frames: &FrameSet,
    config: &LoopConfig,
) -> io::Result<StreamReport>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = BufferedSink::new();
    let report = StreamingAnimationLoop::new(frames, config)
        .run(&mut sink)
        .await;

    let response = Response::new(
        ResponseHead::new(StatusCode::Ok)
            .header("Content-Type", TEXT_PLAIN)
            .header("Cache-Control", "no-cache"),
        sink.into_body(),
    );
    writer.write_all(&response.encode(true)).await?;
    writer.shutdown().await?;
    Ok(report)
}
