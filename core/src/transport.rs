//! The transport seam between the client and the network.
//!
//! `Transport` is the only way the client reaches the server. `UreqTransport`
//! is the default; tests substitute in-memory or recording doubles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Default cap on a response body read by `UreqTransport` (256 MiB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 256 * 1024 * 1024;

/// Execute one HTTP request and return its response.
///
/// Implementations must return non-2xx responses as `Ok`; status
/// classification belongs to the client. The response body must be fully
/// read and the connection released before returning, on every path.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
///
/// Cloning is cheap and clones share the agent's connection pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    max_body_size: u64,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Agent with no timeout.
    pub fn new() -> Self {
        Self::from_agent(status_passthrough_agent(None))
    }

    /// Agent whose whole round trip is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_agent(status_passthrough_agent(Some(timeout)))
    }

    /// Use a caller-built agent. It must be configured with
    /// `http_status_as_error(false)`, or 4xx/5xx surface as transport errors,
    /// and `max_redirects(0)`, or 3xx responses are followed.
    pub fn from_agent(agent: Agent) -> Self {
        Self {
            agent,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, limit: u64) -> Self {
        self.max_body_size = limit;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn status_passthrough_agent(timeout: Option<Duration>) -> Agent {
    // Redirects are returned to the client as 3xx, never followed.
    Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_global(timeout)
        .build()
        .new_agent()
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), headers).send(body),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), headers).send(body),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => with_headers(self.agent.patch(url), headers).send(body),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), headers).send_empty(),
        };
        let mut response = result.map_err(TransportError::from_source)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();

        // Drain the body even for error statuses so the connection goes back to the pool.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body_size)
            .read_to_vec()
            .map_err(TransportError::from_source)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
