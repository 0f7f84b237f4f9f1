//! HTTP Response Encoding
//!
//! Every response closes the connection afterwards, so there is no
//! keep-alive bookkeeping. Complete responses carry `Content-Length`;
//! streamed responses send only the head and let a
//! [`ChunkedSink`](super::ChunkedSink) frame the body.

use std::fmt::Write as _;

/// Content type of streamed animation output
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Content type of the landing page
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Content type of the listing payload
pub const APPLICATION_JSON: &str = "application/json";

/// Status codes this server emits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200
    Ok,
    /// 400
    BadRequest,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 408
    RequestTimeout,
    /// 431
    HeaderFieldsTooLarge,
    /// 500
    InternalServerError,
    /// 503
    ServiceUnavailable,
}

impl StatusCode {
    /// Numeric status code
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::RequestTimeout => 408,
            Self::HeaderFieldsTooLarge => 431,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    /// Canonical reason phrase
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::RequestTimeout => "Request Timeout",
            Self::HeaderFieldsTooLarge => "Request Header Fields Too Large",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

/// Status line and headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
}

impl ResponseHead {
    /// Start a head with the given status
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Head for a streamed animation using chunked transfer framing
    #[must_use]
    pub fn streaming() -> Self {
        Self::new(StatusCode::Ok)
            .header("Content-Type", TEXT_PLAIN)
            .header("Cache-Control", "no-cache")
            .header("Transfer-Encoding", "chunked")
    }

    /// Append a header
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Status of this response
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Serialize the head, including the trailing blank line
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::with_capacity(128);
        let _ = write!(out, "HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("Connection: close\r\n\r\n");
        out.into_bytes()
    }
}

/// A complete response with an in-memory body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    head: ResponseHead,
    body: Vec<u8>,
}

impl Response {
    /// Build a response from a head and body
    #[must_use]
    pub fn new(head: ResponseHead, body: impl Into<Vec<u8>>) -> Self {
        Self {
            head,
            body: body.into(),
        }
    }

    /// Plain-text response
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(
            ResponseHead::new(status).header("Content-Type", TEXT_PLAIN),
            body.into(),
        )
    }

    /// HTML response
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(
            ResponseHead::new(StatusCode::Ok).header("Content-Type", TEXT_HTML),
            body.into(),
        )
    }

    /// JSON response
    #[must_use]
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        Self::new(
            ResponseHead::new(StatusCode::Ok).header("Content-Type", APPLICATION_JSON),
            body,
        )
    }

    /// Status of this response
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// Response body
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Serialize head and body; `HEAD` requests get the head only
    #[must_use]
    pub fn encode(&self, include_body: bool) -> Vec<u8> {
        let head = self
            .head
            .clone()
            .header("Content-Length", self.body.len().to_string())
            .encode();

        let mut out = head;
        if include_body {
            out.extend_from_slice(&self.body);
        }
        out
    }
}
