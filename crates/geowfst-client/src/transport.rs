//! The HTTP transport contract.
//!
//! The client never talks to the network itself; every request goes
//! through an injected [`Transport`]. Embedders back it with whatever
//! HTTP stack they already carry, tests back it with a scripted fake.
//! A transport reports a response for every status code it receives and
//! reserves its error channel for failures that produced no response at
//! all.

use async_trait::async_trait;
use thiserror::Error;

/// Request methods the WFS endpoints accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// The method name on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing HTTP request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    /// Request body; only sent for POST.
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Whether ambient credentials (cookies, auth state) should travel
    /// with the request.
    pub credentials: bool,
}

/// One received HTTP response, whatever its status.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response: DNS, connect, timeout and friends.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sends HTTP requests on behalf of the client.
///
/// Implementations must return `Ok` for any status code they receive;
/// `Err` means no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_match_the_wire() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn success_covers_the_2xx_range() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        assert!(ok.is_success());
        let bad = HttpResponse {
            status: 400,
            body: String::new(),
        };
        assert!(!bad.is_success());
    }
}
