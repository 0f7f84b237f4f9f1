//! HTTP Request Decoding
//!
//! Incremental parser for the head of an HTTP/1.x request. Bytes are pushed
//! as they arrive from the socket and [`RequestDecoder::decode`] yields a
//! [`Request`] once the blank line ending the head has been seen. Bodies are
//! never read; every route is a `GET`.
//!
//! # Limits
//!
//! - The head may not exceed [`MAX_HEAD_SIZE`] bytes
//! - Only `HTTP/1.0` and `HTTP/1.1` are accepted

use thiserror::Error;

/// Maximum size of a request head (request line plus headers)
pub const MAX_HEAD_SIZE: usize = 16 * 1024;

/// Maximum number of header lines
pub const MAX_HEADERS: usize = 100;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Errors produced while decoding a request head
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The head grew past [`MAX_HEAD_SIZE`] or [`MAX_HEADERS`]
    #[error("request head too large")]
    HeadTooLarge,

    /// The request line did not have the form `METHOD TARGET VERSION`
    #[error("malformed request line: {0}")]
    MalformedRequestLine(String),

    /// A header line had no colon or an invalid name
    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    /// The protocol version was not HTTP/1.x
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// The head contained bytes that are not UTF-8
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
}

/// A decoded request head
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    query: Option<String>,
    version: String,
    headers: Vec<(String, String)>,
}

impl Request {
    /// Request method as sent (`GET`, `HEAD`, ...)
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether the method is `HEAD`
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }

    /// Path component of the request target, without the query
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if any
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Protocol version string (`HTTP/1.1`)
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// First value of header `name`, compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `User-Agent` header
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// The `Host` header
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.header("host").filter(|h| !h.is_empty())
    }

    /// Percent-decoded value of query parameter `name`
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_query_component(key) == name).then(|| decode_query_component(value))
        })
    }
}

/// Decode `%XX` escapes in a URL path; `+` stays literal
#[must_use]
pub fn percent_decode(input: &str) -> String {
    decode(input, false)
}

/// Decode a query key or value: `%XX` escapes and `+` as space
#[must_use]
pub fn decode_query_component(input: &str) -> String {
    decode(input, true)
}

// Malformed escapes pass through unchanged.
fn decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_as_space => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            other => out.push(other),
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Incremental request head decoder
#[derive(Debug, Default)]
pub struct RequestDecoder {
    buffer: Vec<u8>,
}

impl RequestDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Append bytes read from the peer
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes buffered so far
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Try to decode the request head
    ///
    /// Returns:
    /// - `Ok(Some(request))` once the head is complete
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the head is invalid or too large
    pub fn decode(&mut self) -> Result<Option<Request>, RequestError> {
        let Some(end) = find_subslice(&self.buffer, HEAD_TERMINATOR) else {
            if self.buffer.len() > MAX_HEAD_SIZE {
                return Err(RequestError::HeadTooLarge);
            }
            return Ok(None);
        };

        if end > MAX_HEAD_SIZE {
            return Err(RequestError::HeadTooLarge);
        }

        let head =
            std::str::from_utf8(&self.buffer[..end]).map_err(|_| RequestError::InvalidEncoding)?;
        let request = parse_head(head)?;

        self.buffer.drain(..end + HEAD_TERMINATOR.len());
        Ok(Some(request))
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_head(head: &str) -> Result<Request, RequestError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();

    let mut parts = request_line.split(' ').filter(|p| !p.is_empty());
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    };

    if !method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    }
    if version != "HTTP/1.1" && version != "HTTP/1.0" {
        return Err(RequestError::UnsupportedVersion(version.to_string()));
    }

    let target = strip_authority(target);
    if !target.starts_with('/') {
        return Err(RequestError::MalformedRequestLine(request_line.to_string()));
    }
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query.to_string())),
        None => (target, None),
    };

    let mut headers = Vec::new();
    for line in lines {
        if headers.len() == MAX_HEADERS {
            return Err(RequestError::HeadTooLarge);
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(RequestError::MalformedHeader(line.to_string()));
        };
        if name.is_empty() || name.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(RequestError::MalformedHeader(line.to_string()));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }

    Ok(Request {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
        query,
        version: version.to_string(),
        headers,
    })
}

/// Reduce an absolute-form target (`http://host/path`) to its path
fn strip_authority(target: &str) -> &str {
    let Some(rest) = target
        .strip_prefix("http://")
        .or_else(|| target.strip_prefix("https://"))
    else {
        return target;
    };
    match rest.find('/') {
        Some(slash) => &rest[slash..],
        None => "/",
    }
}
