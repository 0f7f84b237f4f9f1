//! Client Classification
//!
//! Decides from the `User-Agent` header whether the caller can render a raw
//! escape-sequence stream (command-line HTTP tools) or should get the HTML
//! landing page instead.

use serde::Serialize;

/// User-Agent tokens that identify command-line HTTP clients
pub const TERMINAL_AGENTS: &[&str] = &["curl", "wget", "httpie"];

/// What kind of client sent a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// Command-line tool that renders escape sequences as they arrive
    Terminal,
    /// Interactive browser (or anything unrecognised)
    Browser,
}

impl ClientKind {
    /// Whether the client should receive the animation stream
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal)
    }
}

/// Classify a request by its `User-Agent` header
///
/// Matching is a case-insensitive substring test against
/// [`TERMINAL_AGENTS`]. A missing or empty header classifies as
/// [`ClientKind::Browser`].
#[must_use]
pub fn classify(user_agent: Option<&str>) -> ClientKind {
    let Some(agent) = user_agent.filter(|ua| !ua.trim().is_empty()) else {
        return ClientKind::Browser;
    };

    let agent = agent.to_ascii_lowercase();
    if TERMINAL_AGENTS.iter().any(|token| agent.contains(token)) {
        ClientKind::Terminal
    } else {
        ClientKind::Browser
    }
}
