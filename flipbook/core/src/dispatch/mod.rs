//! Request Dispatch
//!
//! Maps a decoded [`Request`] to a [`Route`]: the JSON listing, the browser
//! landing page, an animation stream, or an error. Dispatch is pure; the
//! connection layer performs the I/O for whichever route comes back.
//!
//! # Path Resolution
//!
//! 1. A non-empty `path` query parameter replaces the URL path (the rewrite
//!    convention used when the server sits behind a function router)
//! 2. Otherwise the configured mount prefix is stripped from the URL path
//! 3. `/` or an empty path selects the default animation

mod page;

pub use page::{escape_html, render_landing_page};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::classify;
use crate::frames::FrameSet;
use crate::registry::{AnimationRegistry, DEFAULT_ANIMATION};
use crate::transport::request::{percent_decode, Request};

/// Path segment that serves the listing
pub const LIST_PATH: &str = "list";

/// Dispatch failures surfaced to the client
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// No animation is registered under the requested name
    #[error("Animation '{0}' not found")]
    NotFound(String),
}

/// Payload of the listing endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Registered animation names
    pub animations: Vec<String>,
    /// Usage hint with a placeholder for the animation name
    pub usage: String,
    /// Ready-to-run example command
    pub example: String,
}

/// Outcome of dispatching one request
#[derive(Debug)]
pub enum Route<'a> {
    /// Serve the listing as JSON
    Listing(Listing),
    /// Serve the landing page to a browser
    Page(String),
    /// Stream `frames` to a terminal client
    Stream {
        /// Resolved animation name
        name: String,
        /// Frames to play
        frames: &'a FrameSet,
    },
    /// Unknown animation
    NotFound(DispatchError),
    /// Method other than `GET` or `HEAD`
    MethodNotAllowed,
}

/// Resolves requests against a shared registry
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<AnimationRegistry>,
    default_animation: String,
    mount: String,
    fallback_host: String,
}

impl Dispatcher {
    /// Dispatcher over `registry` with the default animation and no mount
    #[must_use]
    pub fn new(registry: Arc<AnimationRegistry>) -> Self {
        Self {
            registry,
            default_animation: DEFAULT_ANIMATION.to_string(),
            mount: String::new(),
            fallback_host: "localhost".to_string(),
        }
    }

    /// Animation served for `/`
    #[must_use]
    pub fn with_default_animation(mut self, name: impl Into<String>) -> Self {
        self.default_animation = name.into();
        self
    }

    /// Serve everything under `prefix` (e.g. `/silly_seal`)
    #[must_use]
    pub fn with_mount(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.mount = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Host used in usage hints when the request carries none
    #[must_use]
    pub fn with_fallback_host(mut self, host: impl Into<String>) -> Self {
        self.fallback_host = host.into();
        self
    }

    /// The registry this dispatcher reads
    #[must_use]
    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    /// Name served for `/`
    #[must_use]
    pub fn default_animation(&self) -> &str {
        &self.default_animation
    }

    /// Route a request
    #[must_use]
    pub fn route(&self, request: &Request) -> Route<'_> {
        if !matches!(request.method(), "GET" | "HEAD") {
            return Route::MethodNotAllowed;
        }

        let path = self.resolve_path(request);
        if path.trim_matches('/') == LIST_PATH {
            return Route::Listing(self.listing(request.host()));
        }

        if !classify(request.user_agent()).is_terminal() {
            return Route::Page(self.landing_page(request.host()));
        }

        let name = self.animation_name(&path);
        match self.lookup(&name) {
            Ok(frames) => Route::Stream { name, frames },
            Err(e) => Route::NotFound(e),
        }
    }

    /// Effective path after query override and mount stripping
    #[must_use]
    pub fn resolve_path(&self, request: &Request) -> String {
        if let Some(path) = request.query_param("path").filter(|p| !p.is_empty()) {
            return path;
        }

        let path = percent_decode(request.path());
        if self.mount.is_empty() {
            return path;
        }
        let stripped = match path.strip_prefix(self.mount.as_str()) {
            Some("") => Some("/".to_string()),
            Some(rest) if rest.starts_with('/') => Some(rest.to_string()),
            _ => None,
        };
        stripped.unwrap_or(path)
    }

    /// Animation name for a resolved path, falling back to the default
    #[must_use]
    pub fn animation_name(&self, path: &str) -> String {
        let name = path.trim_matches('/');
        if name.is_empty() {
            self.default_animation.clone()
        } else {
            name.to_string()
        }
    }

    /// Look up an animation by name
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotFound`] naming the requested animation.
    pub fn lookup(&self, name: &str) -> Result<&FrameSet, DispatchError> {
        self.registry
            .lookup(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))
    }

    /// Listing payload with usage hints for `host`
    #[must_use]
    pub fn listing(&self, host: Option<&str>) -> Listing {
        let base = self.public_base(host);
        Listing {
            animations: self
                .registry
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            usage: format!("curl {base}/{{animation}}"),
            example: format!("curl {base}/{}", self.default_animation),
        }
    }

    /// Landing page with usage hints for `host`
    #[must_use]
    pub fn landing_page(&self, host: Option<&str>) -> String {
        let base = self.public_base(host);
        let list_href = format!("{}/{LIST_PATH}", self.mount);
        render_landing_page(&base, &list_href, &self.registry.names())
    }

    fn public_base(&self, host: Option<&str>) -> String {
        let host = host.unwrap_or(&self.fallback_host);
        format!("http://{host}{}", self.mount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::request::RequestDecoder;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn request(path: &str, agent: Option<&str>) -> Request {
        let mut raw = format!("GET {path} HTTP/1.1\r\nHost: example.com\r\n");
        if let Some(agent) = agent {
            raw.push_str(&format!("User-Agent: {agent}\r\n"));
        }
        raw.push_str("\r\n");

        let mut decoder = RequestDecoder::new();
        decoder.push(raw.as_bytes());
        decoder.decode().unwrap().unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(AnimationRegistry::builtin().unwrap()))
    }

    #[test]
    fn test_root_streams_default() {
        let d = dispatcher();
        match d.route(&request("/", Some("curl/8.0"))) {
            Route::Stream { name, frames } => {
                assert_eq!(name, "seal");
                assert_eq!(frames.len(), 8);
            }
            other => panic!("expected stream, got {other:?}"),
        }
    }

    #[test]
    fn test_named_animation_streams() {
        let d = dispatcher();
        assert!(matches!(
            d.route(&request("/seal", Some("Wget/1.21"))),
            Route::Stream { ref name, .. } if name == "seal"
        ));
    }

    #[test]
    fn test_unknown_animation_not_found() {
        let d = dispatcher();
        match d.route(&request("/whale", Some("curl/8.0"))) {
            Route::NotFound(err) => {
                assert_eq!(err, DispatchError::NotFound("whale".to_string()));
                assert!(err.to_string().contains("whale"));
                assert_eq!(err.to_string(), "Animation 'whale' not found");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn test_plus_in_path_is_kept_literally() {
        let d = dispatcher();
        match d.route(&request("/a+b", Some("curl/8.0"))) {
            Route::NotFound(err) => assert_eq!(err.to_string(), "Animation 'a+b' not found"),
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(d.resolve_path(&request("/a%20b", None)), "/a b");
    }

    #[test]
    fn test_browser_gets_page_even_for_unknown_names() {
        let d = dispatcher();
        for path in ["/", "/seal", "/whale"] {
            match d.route(&request(path, Some("Mozilla/5.0"))) {
                Route::Page(html) => assert!(html.contains("curl http://example.com</code>")),
                other => panic!("expected page for {path}, got {other:?}"),
            }
        }
        assert!(matches!(d.route(&request("/", None)), Route::Page(_)));
    }

    #[test]
    fn test_listing_for_any_client() {
        let d = dispatcher();
        for agent in [Some("curl/8.0"), Some("Mozilla/5.0"), None] {
            let Route::Listing(listing) = d.route(&request("/list", agent)) else {
                panic!("expected listing");
            };
            assert_eq!(
                listing,
                Listing {
                    animations: vec!["seal".to_string()],
                    usage: "curl http://example.com/{animation}".to_string(),
                    example: "curl http://example.com/seal".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_listing_matches_registry_names() {
        let frames = FrameSet::new(["x"], Duration::from_millis(10)).unwrap();
        let registry = AnimationRegistry::new([
            ("seal", frames.clone()),
            ("otter", frames.clone()),
            ("puffin", frames),
        ])
        .unwrap();
        let d = Dispatcher::new(Arc::new(registry));

        let listing = d.listing(None);
        let names: BTreeSet<String> = listing.animations.into_iter().collect();
        let expected: BTreeSet<String> = ["seal", "otter", "puffin"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
        assert_eq!(listing.example, "curl http://localhost/seal");
    }

    #[test]
    fn test_listing_json_shape() {
        let listing = dispatcher().listing(Some("h:1"));
        let value: serde_json::Value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["animations"], serde_json::json!(["seal"]));
        assert_eq!(value["usage"], "curl http://h:1/{animation}");
        assert_eq!(value["example"], "curl http://h:1/seal");
    }

    #[test]
    fn test_mount_prefix_is_stripped() {
        let d = dispatcher().with_mount("/silly_seal/");
        assert_eq!(d.resolve_path(&request("/silly_seal", None)), "/");
        assert_eq!(d.resolve_path(&request("/silly_seal/list", None)), "/list");
        assert_eq!(d.resolve_path(&request("/silly_sealion", None)), "/silly_sealion");

        let Route::Listing(listing) = d.route(&request("/silly_seal/list", None)) else {
            panic!("expected listing");
        };
        assert_eq!(listing.example, "curl http://example.com/silly_seal/seal");
    }

    #[test]
    fn test_path_query_overrides_url_path() {
        let d = dispatcher();
        let req = request("/api/index?path=%2Flist", Some("curl/8.0"));
        assert_eq!(d.resolve_path(&req), "/list");
        assert!(matches!(d.route(&req), Route::Listing(_)));

        let req = request("/api/index?path=", Some("curl/8.0"));
        assert_eq!(d.resolve_path(&req), "/api/index");
    }

    #[test]
    fn test_custom_default_animation() {
        let frames = FrameSet::new(["o"], Duration::from_millis(10)).unwrap();
        let registry = AnimationRegistry::new([("otter", frames)]).unwrap();
        let d = Dispatcher::new(Arc::new(registry)).with_default_animation("otter");

        assert_eq!(d.animation_name("/"), "otter");
        assert_eq!(d.animation_name(""), "otter");
        assert_eq!(d.animation_name("/seal/"), "seal");
        assert!(matches!(
            d.route(&request("/", Some("curl"))),
            Route::Stream { .. }
        ));
    }

    #[test]
    fn test_other_methods_rejected() {
        let mut decoder = RequestDecoder::new();
        decoder.push(b"POST /seal HTTP/1.1\r\nUser-Agent: curl\r\n\r\n");
        let req = decoder.decode().unwrap().unwrap();
        assert!(matches!(dispatcher().route(&req), Route::MethodNotAllowed));
    }
}
