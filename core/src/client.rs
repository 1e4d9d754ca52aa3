//! Blocking client for the database's REST endpoint.
//!
//! # Design
//! `DatabaseClient` holds a `ClientConfig` and a transport, nothing else.
//! The node path is an argument of every call and results are returned, never
//! stored, so one client can be shared across threads. Variants with other
//! options are derived with the `with_*` methods instead of being mutated.
//!
//! Every operation goes through the same pipeline: `build_request`, one
//! `Transport::execute`, then `parse_response`. The two halves are public so
//! callers that do their own I/O can drive them directly.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ClientConfig, PrintMode};
use crate::error::DbError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::request::build_url;
use crate::transport::{Transport, UreqTransport};
use crate::types::PushResponse;

/// Diagnostic header the server sets when it rejects a credential.
pub const AUTH_DEBUG_HEADER: &str = "X-Firebase-Auth-Debug";

/// Synchronous client for one database.
#[derive(Debug, Clone)]
pub struct DatabaseClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl DatabaseClient<UreqTransport> {
    /// Client using the default `ureq` transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> DatabaseClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Describe the request for `method` on `path` without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpRequest, DbError> {
        let url = build_url(&self.config, method, path)?;
        let (headers, body) = match (method, body) {
            (HttpMethod::Get | HttpMethod::Delete, _) => (Vec::new(), None),
            (_, Some(body)) => (
                vec![("content-type".to_string(), "application/json".to_string())],
                Some(body),
            ),
            (_, None) => (Vec::new(), None),
        };
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Classify a response: 2xx yields the payload, anything else a `Remote` error.
    ///
    /// The auth debug header, when present, is logged whatever the status.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Vec<u8>, DbError> {
        if let Some(message) = response.header(AUTH_DEBUG_HEADER) {
            info!(debug = %message, "auth debug from server");
        }
        check_status(&response)?;
        Ok(response.body)
    }

    /// Perform one round trip and return the raw success payload.
    pub fn execute(&self, method: HttpMethod, path: &str, body: Option<String>) -> Result<Vec<u8>, DbError> {
        let request = self.build_request(method, path, body)?;
        debug!(%method, path, "dispatching request");

        let response = self.transport.execute(&request)?;
        debug!(%method, path, status = response.status, bytes = response.body.len(), "received response");

        self.parse_response(response)
    }

    /// Read the node at `path`. An absent node is JSON `null`, so decode into
    /// `Option<V>` or `serde_json::Value` when the node may not exist.
    pub fn get<V: DeserializeOwned>(&self, path: &str) -> Result<V, DbError> {
        let payload = self.execute(HttpMethod::Get, path, None)?;
        decode(&payload)
    }

    /// Replace the node at `path` with `value`.
    pub fn set<V: Serialize + ?Sized>(&self, path: &str, value: &V) -> Result<(), DbError> {
        let body = encode(value)?;
        self.execute(HttpMethod::Put, path, Some(body))?;
        Ok(())
    }

    /// Append `value` as a new child of `path` under a server-generated key.
    ///
    /// Returns the new key, or `None` when the server sent no body
    /// (`print=silent`).
    pub fn push<V: Serialize + ?Sized>(&self, path: &str, value: &V) -> Result<Option<String>, DbError> {
        let body = encode(value)?;
        let payload = self.execute(HttpMethod::Post, path, Some(body))?;
        let created: Option<PushResponse> = decode(&payload)?;
        Ok(created.map(|c| c.name))
    }

    /// Merge the fields of `value` into the node at `path`, leaving other
    /// children untouched.
    pub fn update<V: Serialize + ?Sized>(&self, path: &str, value: &V) -> Result<(), DbError> {
        let body = encode(value)?;
        self.execute(HttpMethod::Patch, path, Some(body))?;
        Ok(())
    }

    /// Remove the node at `path` and everything below it.
    pub fn delete(&self, path: &str) -> Result<(), DbError> {
        self.execute(HttpMethod::Delete, path, None)?;
        Ok(())
    }
}

impl<T: Transport + Clone> DatabaseClient<T> {
    /// A client with a derived configuration, sharing a clone of the transport.
    pub fn with_config(&self, f: impl FnOnce(ClientConfig) -> ClientConfig) -> Self {
        Self {
            config: f(self.config.clone()),
            transport: self.transport.clone(),
        }
    }

    pub fn with_auth(&self, token: impl Into<String>) -> Self {
        self.with_config(|c| c.with_auth(token))
    }

    pub fn with_export(&self, export: bool) -> Self {
        self.with_config(|c| c.with_export(export))
    }

    pub fn with_shallow(&self, shallow: bool) -> Self {
        self.with_config(|c| c.with_shallow(shallow))
    }

    pub fn with_print(&self, print: Option<PrintMode>) -> Self {
        self.with_config(|c| c.with_print(print))
    }
}

fn check_status(response: &HttpResponse) -> Result<(), DbError> {
    if response.is_success() {
        return Ok(());
    }
    Err(DbError::Remote {
        status: response.status,
        reason: response.reason.clone(),
    })
}

fn encode<V: Serialize + ?Sized>(value: &V) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(DbError::Serialization)
}

/// An empty body (204) decodes as `null`.
fn decode<V: DeserializeOwned>(payload: &[u8]) -> Result<V, DbError> {
    let payload = if payload.is_empty() { b"null".as_slice() } else { payload };
    serde_json::from_slice(payload).map_err(DbError::Decode)
}
