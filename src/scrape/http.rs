//! HTTP fetch seam.
//!
//! The scraper only ever issues `GET` requests with a handful of headers and
//! a per-request timeout, so the trait is that one call. Non-2xx responses
//! come back as ordinary [`HttpResponse`] values; only transport failures
//! (DNS, TLS, refused connections, timeouts) are errors.

use std::io::{self, Read};
use std::time::Duration;
use thiserror::Error;

/// Largest body the production client will read (64 MiB).
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Media type without parameters, lowercased (`image/jpeg`).
    pub fn media_type(&self) -> String {
        self.header("Content-Type")
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait HttpClient {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError>;
}

/// Blocking client backed by `ureq`.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().redirects(5).build(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for UreqClient {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        let transport = |message: String| FetchError::Transport {
            url: url.to_string(),
            message,
        };

        let mut request = self.agent.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(t)) => return Err(transport(t.to_string())),
        };

        let status = response.status();
        let headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();

        let body = read_body(response.into_reader(), MAX_BODY_BYTES)
            .map_err(|e| transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Read a whole body, failing instead of truncating when it exceeds `limit`.
fn read_body(reader: impl Read, limit: u64) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("body exceeds {limit} bytes"),
        ));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_type(content_type: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![("content-type".into(), content_type.into())],
            body: Vec::new(),
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = with_type("image/png");
        assert_eq!(resp.header("Content-Type"), Some("image/png"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn media_type_strips_parameters_and_case() {
        assert_eq!(with_type("Image/JPEG; charset=binary").media_type(), "image/jpeg");
        assert_eq!(with_type("").media_type(), "");
    }

    #[test]
    fn missing_content_type_is_empty() {
        let resp = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert_eq!(resp.media_type(), "");
    }

    #[test]
    fn success_range() {
        let mut resp = with_type("text/html");
        assert!(resp.is_success());
        resp.status = 204;
        assert!(resp.is_success());
        resp.status = 301;
        assert!(!resp.is_success());
        resp.status = 404;
        assert!(!resp.is_success());
    }

    // =========================================================================
    // Body limit
    // =========================================================================

    #[test]
    fn body_at_limit_is_read_whole() {
        let body = read_body(io::Cursor::new(vec![1u8; 16]), 16).unwrap();
        assert_eq!(body.len(), 16);
    }

    #[test]
    fn body_over_limit_is_an_error_not_truncated() {
        let err = read_body(io::Cursor::new(vec![1u8; 17]), 16).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "body exceeds 16 bytes");
    }
}
