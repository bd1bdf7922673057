//! HTTP request/response types exchanged between `Session` and a `Transport`.
//!
//! # Design
//! Requests and responses are plain data. `Session` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network; a
//! `Transport` performs the round-trip in between. This keeps the status and
//! decoding policy testable without sockets.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is fully encoded, query string included. `headers` always carries
/// the `sid` session cookie.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// A body that failed to read is kept as `Err(message)` next to the status,
/// so the status policy can still report a bad status with a placeholder.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Result<Vec<u8>, String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Ok(body.into()),
        }
    }

    pub fn unreadable(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            body: Err(reason.into()),
        }
    }
}
