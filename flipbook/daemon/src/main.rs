//! Flipbook Daemon - ASCII Animation Server
//!
//! Serves terminal flipbook animations over HTTP. Point `curl` at it and
//! watch; open it in a browser for instructions.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (0.0.0.0:8081, server profile)
//! flipbook-daemon
//!
//! # Behave like a 30 second function host
//! flipbook-daemon --profile serverless
//!
//! # Serve under a prefix
//! flipbook-daemon --base-path /silly_seal
//!
//! # Print the built-in animations and exit
//! flipbook-daemon --inspect
//!
//! # Verbose logging
//! RUST_LOG=debug flipbook-daemon
//! ```
//!
//! Flags override the `FLIPBOOK_*` environment variables, which override
//! the built-in defaults.
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown

mod server;

use std::fmt::Write as _;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use flipbook_core::{AnimationRegistry, DeploymentProfile, ServerConfig};

use server::HttpServer;

/// Lines of each frame shown by `--inspect`
const INSPECT_LINES: usize = 3;

/// Frames shown by `--inspect`
const INSPECT_FRAMES: usize = 3;

/// Flipbook Daemon - streams ASCII animations to terminal clients
#[derive(Parser, Debug)]
#[command(name = "flipbook-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Port to listen on [env: FLIPBOOK_PORT] [default: 8081]
    #[arg(short = 'p', long, value_name = "PORT")]
    port: Option<u16>,

    /// Address to bind [env: FLIPBOOK_BIND] [default: 0.0.0.0]
    #[arg(short = 'b', long, value_name = "ADDR")]
    bind: Option<IpAddr>,

    /// Timing profile: server, serverless or edge [env: FLIPBOOK_PROFILE]
    #[arg(long, value_name = "PROFILE")]
    profile: Option<DeploymentProfile>,

    /// Send each animation as one buffered body instead of streaming it
    /// [env: FLIPBOOK_BUFFERED]
    #[arg(long)]
    buffered: bool,

    /// Serve everything under this path prefix [env: FLIPBOOK_BASE_PATH]
    #[arg(long, value_name = "PATH")]
    base_path: Option<String>,

    /// Animation served for `/`
    #[arg(long, value_name = "NAME")]
    default_animation: Option<String>,

    /// Concurrent connection cap [env: FLIPBOOK_MAX_CONNECTIONS] [default: 256]
    #[arg(long, value_name = "N")]
    max_connections: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "FLIPBOOK_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print a summary of the built-in animations and exit
    #[arg(long)]
    inspect: bool,
}

impl Args {
    /// Layer command-line flags over an environment-derived config
    fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if self.buffered {
            config.buffered = true;
        }
        if let Some(base) = &self.base_path {
            config.base_path = Some(base.clone());
        }
        if let Some(name) = &self.default_animation {
            config.default_animation = name.clone();
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        config
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "flipbook_daemon={level},flipbook_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Human-readable summary of every registered animation
fn inspect(registry: &AnimationRegistry) -> String {
    let mut out = String::new();
    for name in registry.names() {
        let Some(frames) = registry.lookup(name) else {
            continue;
        };
        let _ = writeln!(out, "Animation '{name}'");
        let _ = writeln!(out, "  Total frames: {}", frames.len());
        let _ = writeln!(out, "  Frame interval: {:?}", frames.interval());

        for (index, frame) in frames.iter().take(INSPECT_FRAMES).enumerate() {
            let _ = writeln!(out, "\n  Frame {}:", index + 1);
            for line in frame.lines().take(INSPECT_LINES) {
                let _ = writeln!(out, "    {line}");
            }
        }
        out.push('\n');
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level);

    let registry = Arc::new(
        AnimationRegistry::builtin().context("Built-in animations failed validation")?,
    );

    if args.inspect {
        print!("{}", inspect(&registry));
        return Ok(());
    }

    let env_config = ServerConfig::from_env().context("Invalid FLIPBOOK_* environment")?;
    let config = args.apply(env_config);

    if registry.lookup(&config.default_animation).is_none() {
        anyhow::bail!(
            "Default animation '{}' is not registered (available: {})",
            config.default_animation,
            registry.names().join(", ")
        );
    }

    info!("Flipbook daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        addr = %config.socket_addr(),
        profile = %config.profile,
        buffered = config.buffered,
        base_path = config.base_path.as_deref().unwrap_or("/"),
        max_connections = config.max_connections,
        "Configuration resolved"
    );

    // Setup signal handlers
    let shutdown = Arc::new(AtomicBool::new(false));
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    let shutdown_clone = Arc::clone(&shutdown);
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
        }
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    let mut server = HttpServer::new(config, registry);
    let listener = server.bind().await?;
    let result = server.run(listener, shutdown).await;

    match result {
        Ok(()) => {
            info!("Flipbook daemon stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Daemon stopped with error");
            Err(e)
        }
    }
}
