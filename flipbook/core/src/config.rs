//! Server Configuration
//!
//! There is no configuration file. The server is tuned through environment
//! variables (read by [`ServerConfig::from_env`]) and command-line flags,
//! with flags taking priority.
//!
//! # Environment Variables
//!
//! - `FLIPBOOK_PORT`: listening port (default 8081)
//! - `FLIPBOOK_BIND`: listening address (default `0.0.0.0`)
//! - `FLIPBOOK_PROFILE`: `server`, `serverless` or `edge` (default `server`)
//! - `FLIPBOOK_BUFFERED`: `1`/`true` to send bodies in one piece
//! - `FLIPBOOK_BASE_PATH`: mount prefix such as `/silly_seal`
//! - `FLIPBOOK_MAX_CONNECTIONS`: concurrent connection cap (default 256)
//!
//! # Deployment Profiles
//!
//! | Profile      | Tick             | Budget    |
//! |--------------|------------------|-----------|
//! | `server`     | frame set's own  | unbounded |
//! | `serverless` | 150 ms           | 30 s      |
//! | `edge`       | 120 ms           | 15 s      |
//!
//! All profiles replay three cycles at 200 ms per frame when the sink cannot
//! flush.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::player::LoopConfig;
use crate::registry::DEFAULT_ANIMATION;
use crate::transport::ServeOptions;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8081;

/// Default cap on concurrent connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// Default time allowed for a client to send its request head
pub const DEFAULT_HEADER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparseable value
    #[error("invalid value {value:?} for {var}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Unknown deployment profile name
    #[error("unknown profile '{0}' (expected server, serverless or edge)")]
    UnknownProfile(String),
}

/// Named bundles of loop timing for different hosting environments
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeploymentProfile {
    /// Long-running server: frame set cadence, no time budget
    #[default]
    Server,
    /// Function host with a ~30 s request cap
    Serverless,
    /// Function host with a ~15 s request cap
    Edge,
}

impl DeploymentProfile {
    /// Every profile, in declaration order
    pub const ALL: [Self; 3] = [Self::Server, Self::Serverless, Self::Edge];

    /// Profile name as accepted on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Serverless => "serverless",
            Self::Edge => "edge",
        }
    }

    /// Loop tuning for this profile
    #[must_use]
    pub fn loop_config(self) -> LoopConfig {
        let base = LoopConfig::default();
        match self {
            Self::Server => base,
            Self::Serverless => base
                .with_tick_interval(Duration::from_millis(150))
                .with_max_duration(Duration::from_secs(30)),
            Self::Edge => base
                .with_tick_interval(Duration::from_millis(120))
                .with_max_duration(Duration::from_secs(15)),
        }
    }
}

impl fmt::Display for DeploymentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeploymentProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

/// Everything the server needs to start
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listening address
    pub bind: IpAddr,
    /// Listening port
    pub port: u16,
    /// Loop timing profile
    pub profile: DeploymentProfile,
    /// Collect each body and send it once instead of streaming
    pub buffered: bool,
    /// Mount prefix stripped from request paths
    pub base_path: Option<String>,
    /// Animation served for `/`
    pub default_animation: String,
    /// Concurrent connection cap
    pub max_connections: usize,
    /// Time allowed for the request head to arrive
    pub header_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            profile: DeploymentProfile::default(),
            buffered: false,
            base_path: None,
            default_animation: DEFAULT_ANIMATION.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            header_timeout: DEFAULT_HEADER_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("FLIPBOOK_PORT") {
            config.port = parse_var("FLIPBOOK_PORT", &port)?;
        }
        if let Some(bind) = lookup("FLIPBOOK_BIND") {
            config.bind = parse_var("FLIPBOOK_BIND", &bind)?;
        }
        if let Some(profile) = lookup("FLIPBOOK_PROFILE") {
            config.profile = profile.parse()?;
        }
        if let Some(buffered) = lookup("FLIPBOOK_BUFFERED") {
            config.buffered = parse_flag("FLIPBOOK_BUFFERED", &buffered)?;
        }
        if let Some(base) = lookup("FLIPBOOK_BASE_PATH").filter(|b| !b.trim().is_empty()) {
            config.base_path = Some(base);
        }
        if let Some(max) = lookup("FLIPBOOK_MAX_CONNECTIONS") {
            config.max_connections = parse_var("FLIPBOOK_MAX_CONNECTIONS", &max)?;
        }

        Ok(config)
    }

    /// Address to listen on
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Per-connection serving options derived from this config
    #[must_use]
    pub fn serve_options(&self) -> ServeOptions {
        ServeOptions {
            loop_config: self.profile.loop_config(),
            buffered: self.buffered,
            header_timeout: self.header_timeout,
        }
    }
}

fn parse_var<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
