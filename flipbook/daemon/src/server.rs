//! HTTP Server Implementation
//!
//! The accept loop for the flipbook daemon:
//! - Accepts TCP connections
//! - Spawns one handler task per connection
//! - Tracks active connections and enforces the connection cap
//! - Supports graceful shutdown
//!
//! ```text
//!                     HttpServer
//!                          │
//!          ┌───────────────┼───────────────┐
//!          │               │               │
//!       curl #1         curl #2         browser
//!      (conn_…)        (conn_…)        (conn_…)
//!          │               │               │
//!          └───────────────┴───────────────┘
//!                          │
//!               flipbook_core::serve
//!            (shared Dispatcher + registry)
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

use flipbook_core::transport::reject;
use flipbook_core::{
    serve, AnimationRegistry, ConnectionId, Dispatcher, ServeOptions, ServeOutcome,
    ServerConfig, StatusCode,
};

/// How often the accept loop wakes up to check the shutdown flag
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// How long a rejected connection is drained before it is dropped
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Time allowed to hand a 503 to a peer
const REJECT_TIMEOUT: Duration = Duration::from_millis(500);

/// 503 replies in flight at once; past this, excess connections are closed
const MAX_PENDING_REJECTIONS: usize = 32;

/// Connection state tracking
#[derive(Debug)]
struct ConnectionState {
    /// When the connection was accepted
    connected_at: Instant,
    /// Remote address
    peer: SocketAddr,
}

/// The daemon's HTTP server
pub struct HttpServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    options: Arc<ServeOptions>,
    connection_states: Arc<DashMap<ConnectionId, ConnectionState>>,
    rejections: Arc<Semaphore>,
}

impl HttpServer {
    /// Create a server for `registry` configured by `config`
    pub fn new(config: ServerConfig, registry: Arc<AnimationRegistry>) -> Self {
        let mut dispatcher =
            Dispatcher::new(registry).with_default_animation(config.default_animation.clone());
        if let Some(base) = &config.base_path {
            dispatcher = dispatcher.with_mount(base);
        }

        Self {
            options: Arc::new(config.serve_options()),
            dispatcher: Arc::new(dispatcher),
            config,
            connection_states: Arc::new(DashMap::new()),
            rejections: Arc::new(Semaphore::new(MAX_PENDING_REJECTIONS)),
        }
    }

    /// Bind the configured listening address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr();
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))
    }

    /// Number of connections currently being served
    pub fn connection_count(&self) -> usize {
        self.connection_states.len()
    }

    /// Run the accept loop until `shutdown` is set
    pub async fn run(&mut self, listener: TcpListener, shutdown: Arc<AtomicBool>) -> Result<()> {
        let local = listener
            .local_addr()
            .context("Failed to read listener address")?;
        info!(
            addr = %local,
            profile = %self.config.profile,
            buffered = self.config.buffered,
            animations = ?self.dispatcher.registry().names(),
            "Listening for connections"
        );

        let mut tasks = JoinSet::new();

        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested, stopping accept loop");
                break;
            }

            // Reap finished handlers so the set does not grow without bound
            while tasks.try_join_next().is_some() {}

            // Accept with timeout to allow checking shutdown flag
            let (stream, peer) = match tokio::time::timeout(ACCEPT_POLL, listener.accept()).await
            {
                Ok(Ok(accepted)) => accepted,
                Ok(Err(e)) => {
                    error!(error = %e, "Accept failed");
                    continue;
                }
                Err(_) => continue,
            };

            if self.connection_states.len() >= self.config.max_connections {
                warn!(
                    peer = %peer,
                    max_connections = self.config.max_connections,
                    "Connection limit reached, rejecting new connection"
                );
                match Arc::clone(&self.rejections).try_acquire_owned() {
                    Ok(permit) => {
                        tasks.spawn(async move {
                            Self::reject_overloaded(stream).await;
                            drop(permit);
                        });
                    }
                    Err(_) => debug!(peer = %peer, "Too many pending rejections, closing"),
                }
                continue;
            }

            if let Err(e) = stream.set_nodelay(true) {
                debug!(error = %e, "Failed to set TCP_NODELAY");
            }

            let conn_id = ConnectionId::new();
            self.connection_states.insert(
                conn_id.clone(),
                ConnectionState {
                    connected_at: Instant::now(),
                    peer,
                },
            );
            debug!(
                conn_id = %conn_id,
                peer = %peer,
                active_connections = self.connection_states.len(),
                "New connection accepted"
            );

            let span = tracing::info_span!("connection", %conn_id, %peer);
            tasks.spawn(
                Self::handle_connection(
                    conn_id,
                    stream,
                    Arc::clone(&self.dispatcher),
                    Arc::clone(&self.options),
                    Arc::clone(&self.connection_states),
                )
                .instrument(span),
            );
        }

        self.shutdown(tasks).await;
        Ok(())
    }

    /// Serve a single connection and drop its tracking entry
    async fn handle_connection(
        conn_id: ConnectionId,
        stream: TcpStream,
        dispatcher: Arc<Dispatcher>,
        options: Arc<ServeOptions>,
        connection_states: Arc<DashMap<ConnectionId, ConnectionState>>,
    ) {
        match serve(stream, &dispatcher, &options).await {
            Ok(ServeOutcome::NoRequest) => debug!("Client left without sending a request"),
            Ok(ServeOutcome::Responded(status)) => debug!(status = %status, "Response sent"),
            Ok(ServeOutcome::Streamed { .. }) => {}
            Err(e) => debug!(error = %e, "Connection ended with I/O error"),
        }

        if let Some((_, state)) = connection_states.remove(&conn_id) {
            debug!(
                duration_ms = state.connected_at.elapsed().as_millis() as u64,
                active_connections = connection_states.len(),
                "Connection closed"
            );
        }
    }

    async fn reject_overloaded<S>(mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let sent = tokio::time::timeout(
            REJECT_TIMEOUT,
            reject(
                &mut stream,
                StatusCode::ServiceUnavailable,
                "Too many connections, try again shortly",
            ),
        )
        .await;
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(error = %e, "Failed to send 503");
                return;
            }
            Err(_) => {
                debug!("Peer not reading, abandoning 503");
                return;
            }
        }

        // Drain the unread request so the close is a FIN, not a reset
        let mut scratch = [0u8; 1024];
        let _ = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while matches!(stream.read(&mut scratch).await, Ok(n) if n > 0) {}
        })
        .await;
    }

    /// Graceful shutdown: abort live streams and wait for them to unwind
    async fn shutdown(&mut self, mut tasks: JoinSet<()>) {
        let active = self.connection_states.len();
        info!(active_connections = active, "Initiating graceful shutdown");

        for entry in self.connection_states.iter() {
            debug!(conn_id = %entry.key(), peer = %entry.value().peer, "Aborting connection");
        }
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        self.connection_states.clear();

        info!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use tokio::io::AsyncWriteExt;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..ServerConfig::default()
        }
    }

    fn server(config: ServerConfig) -> HttpServer {
        HttpServer::new(config, Arc::new(AnimationRegistry::builtin().unwrap()))
    }

    async fn start(
        config: ServerConfig,
    ) -> (SocketAddr, Arc<AtomicBool>, tokio::task::JoinHandle<Result<()>>) {
        launch(server(config)).await
    }

    async fn launch(
        mut server: HttpServer,
    ) -> (SocketAddr, Arc<AtomicBool>, tokio::task::JoinHandle<Result<()>>) {
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = tokio::spawn(async move { server.run(listener, flag).await });
        (addr, shutdown, handle)
    }

    async fn fetch(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_listing_over_tcp() {
        let (addr, shutdown, handle) = start(test_config()).await;

        let response = fetch(
            addr,
            "GET /list HTTP/1.1\r\nHost: flipbook.test\r\nUser-Agent: curl/8.4.0\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains(r#""animations":["seal"]"#));

        shutdown.store(true, Ordering::SeqCst);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_base_path_mount() {
        let config = ServerConfig {
            base_path: Some("/silly_seal".to_string()),
            ..test_config()
        };
        let (addr, shutdown, handle) = start(config).await;

        let response = fetch(
            addr,
            "GET /silly_seal/whale HTTP/1.1\r\nUser-Agent: curl/8.4.0\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(response.ends_with("Animation 'whale' not found\n"));

        shutdown.store(true, Ordering::SeqCst);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_over_capacity_gets_503() {
        let config = ServerConfig {
            max_connections: 0,
            ..test_config()
        };
        let (addr, shutdown, handle) = start(config).await;

        let response = fetch(addr, "GET / HTTP/1.1\r\nUser-Agent: curl\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));

        shutdown.store(true, Ordering::SeqCst);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_rejections_beyond_the_cap_are_closed_without_reply() {
        let mut overloaded = server(ServerConfig {
            max_connections: 0,
            ..test_config()
        });
        overloaded.rejections = Arc::new(Semaphore::new(0));
        let (addr, shutdown, handle) = launch(overloaded).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut response = Vec::new();
        // A reset is as good as a clean close here.
        let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
            .await
            .expect("connection should be closed");
        assert!(response.is_empty());

        shutdown.store(true, Ordering::SeqCst);
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_gives_up_on_peer_that_never_reads() {
        let (_client, stream) = tokio::io::duplex(16);
        tokio::time::timeout(
            Duration::from_secs(5),
            HttpServer::reject_overloaded(stream),
        )
        .await
        .expect("503 should be abandoned, not block forever");
    }

    #[tokio::test]
    async fn test_shutdown_ends_live_streams() {
        let (addr, shutdown, handle) = start(test_config()).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET / HTTP/1.1\r\nUser-Agent: curl/8.4.0\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 512];
        let n = stream.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).starts_with("HTTP/1.1 200 OK"));

        shutdown.store(true, Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop promptly")
            .unwrap()
            .unwrap();

        // The aborted handler dropped its socket, so the stream reaches EOF.
        let mut rest = Vec::new();
        tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
            .await
            .expect("stream should close")
            .unwrap();
    }

    #[tokio::test]
    async fn test_connection_count_starts_empty() {
        assert_eq!(server(test_config()).connection_count(), 0);
    }
}
