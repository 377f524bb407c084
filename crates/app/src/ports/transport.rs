//! Transport port: executes one outbound HTTP request.
//!
//! The application layer only builds request descriptors and interprets
//! responses. Sockets, TLS and connection pooling live behind this trait in
//! an adapter crate.

use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;
use url::Url;

/// HTTP verbs used by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestBody {
    /// UTF-8 JSON payload.
    #[must_use]
    pub fn json(bytes: Vec<u8>) -> Self {
        Self {
            content_type: "application/json; charset=utf-8".to_string(),
            bytes,
        }
    }
}

/// Transport-agnostic description of an outbound request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl OutboundRequest {
    #[must_use]
    pub fn new(method: Method, uri: Url) -> Self {
        Self {
            method,
            uri,
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a header. Duplicates are kept in insertion order.
    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// First value of the header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// What came back from the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: Option<String>,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A send that did not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The attempt was cancelled before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// Connection, TLS or protocol failure reported by the adapter.
    #[error("transport failure")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Executes outbound requests.
///
/// Implementations must stop work and return [`TransportError::Cancelled`]
/// once `cancel` fires.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: OutboundRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_method_in_upper_case() {
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn should_look_up_headers_case_insensitively() {
        let mut request =
            OutboundRequest::new(Method::Get, Url::parse("https://api.example/").unwrap());
        request.push_header("X-Tenant", "acme");
        assert_eq!(request.header("x-tenant"), Some("acme"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn should_treat_2xx_as_success() {
        assert!(TransportResponse::new(200).is_success());
        assert!(TransportResponse::new(202).is_success());
        assert!(!TransportResponse::new(301).is_success());
        assert!(!TransportResponse::new(500).is_success());
    }

    #[test]
    fn should_tag_json_body_with_utf8_charset() {
        let body = RequestBody::json(b"{}".to_vec());
        assert_eq!(body.content_type, "application/json; charset=utf-8");
    }
}
