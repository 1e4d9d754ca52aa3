//! Blocking client for a JSON tree database spoken to over its REST endpoint.
//!
//! # Overview
//! Every operation is a single stateless round trip: the path becomes
//! `<base><path>.json` plus the query options the config enables, the request
//! goes through a pluggable `Transport`, and any status outside 200..=299 is
//! reported as `DbError::Remote`. Success payloads are decoded with
//! `serde_json`.
//!
//! # Design
//! - `DatabaseClient` carries only its config and transport; paths are
//!   per-call arguments and results are returned, never cached.
//! - `build_request` / `parse_response` expose the two halves around the
//!   transport so hosts can do their own I/O.
//! - `UreqTransport` is the default transport; anything implementing
//!   `Transport` can replace it.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use client::{DatabaseClient, AUTH_DEBUG_HEADER};
pub use config::{ClientConfig, PrintMode};
pub use error::{DbError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::PushResponse;
