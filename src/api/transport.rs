//! Blocking HTTP transport.
//!
//! [`Transport`] is the single seam between the client and the network: one
//! request in, one response (any status) out. [`UreqTransport`] is the real
//! implementation; tests substitute a canned one, and
//! [`CachedTransport`](super::cache::CachedTransport) wraps either.

use std::fmt;

use crate::error::MytardisError;

/// HTTP methods used by the MyTardis API client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        };
        f.write_str(name)
    }
}

/// A fully-built request: absolute URL, headers and optional JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Cache key for this request: method and URL.
    pub fn signature(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body of a response, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and blocks until a response arrives.
///
/// Non-2xx statuses are returned as responses, not errors; only failures
/// that leave no status (DNS, connection, TLS) are `Err`.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError> {
        (**self).send(request)
    }
}

/// [`Transport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(&'static str, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, MytardisError> {
        log::debug!("{} {}", request.method, request.url);

        let transport_error = |source: ureq::Error| MytardisError::Transport {
            url: request.url.clone(),
            message: source.to_string(),
        };
        let body = request.body.clone().unwrap_or_default();

        let mut response = match request.method {
            Method::Get => with_headers(self.agent.get(&request.url), &request.headers).call(),
            Method::Post => {
                with_headers(self.agent.post(&request.url), &request.headers).send(body)
            }
            Method::Patch => {
                with_headers(self.agent.patch(&request.url), &request.headers).send(body)
            }
        }
        .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;
        log::debug!("{} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse::new(status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_method_and_url() {
        let request = HttpRequest {
            method: Method::Get,
            url: "https://example.com/api/v1/dataset/?format=json".into(),
            headers: vec![("Accept", "application/json".into())],
            body: None,
        };
        assert_eq!(
            request.signature(),
            "GET https://example.com/api/v1/dataset/?format=json"
        );
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
