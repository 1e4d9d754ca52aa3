//! In-memory stand-in for the database's REST endpoint.
//!
//! Serves `<path>.json` for GET, PUT, POST, PATCH and DELETE over a single
//! JSON tree, honoring the `auth`, `shallow`, `format` and `print` query
//! parameters.

pub mod tree;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Header carrying the reason a credential was rejected.
pub const AUTH_DEBUG_HEADER: &str = "x-firebase-auth-debug";

pub type Db = Arc<RwLock<Value>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    secret: Option<Arc<str>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    pub auth: Option<String>,
    pub format: Option<String>,
    pub shallow: Option<String>,
    pub print: Option<String>,
}

/// Open database: every request is accepted.
pub fn app() -> Router {
    app_with_secret(None)
}

/// Database that rejects requests whose `auth` differs from `secret`.
pub fn app_with_secret(secret: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Value::Null)),
        secret: secret.map(Into::into),
    };
    Router::new().fallback(handle).with_state(state)
}

pub async fn run(listener: TcpListener, secret: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_secret(secret)).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn node_keys(path: &str) -> Option<Vec<String>> {
    tree::segments(path)
        .into_iter()
        .map(|s| percent_decode_str(s).decode_utf8().ok().map(|s| s.into_owned()))
        .collect()
}

async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(params): Query<Params>,
    body: Bytes,
) -> Response {
    debug!(%method, path = uri.path(), "request");

    let Some(path) = uri.path().strip_suffix(".json") else {
        return error(StatusCode::NOT_FOUND, "Not Found");
    };
    let Some(keys) = node_keys(path) else {
        return error(StatusCode::BAD_REQUEST, "Invalid path");
    };
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();

    if let Some(secret) = &state.secret {
        if params.auth.as_deref() != Some(&**secret) {
            let reason = match params.auth {
                None => "No credential was supplied.",
                Some(_) => "Credential does not match the database secret.",
            };
            return (
                StatusCode::UNAUTHORIZED,
                [(AUTH_DEBUG_HEADER, reason)],
                Json(json!({ "error": "Permission denied" })),
            )
                .into_response();
        }
    }

    let payload = match method {
        Method::GET | Method::DELETE => Value::Null,
        _ => match serde_json::from_slice::<Value>(&body) {
            Ok(v) => v,
            Err(_) => return error(StatusCode::BAD_REQUEST, "Invalid data; couldn't parse JSON object."),
        },
    };

    let reply = match method {
        Method::GET => {
            let db = state.db.read().await;
            let node = tree::get(&db, &keys).cloned().unwrap_or(Value::Null);
            if params.shallow.as_deref() == Some("true") {
                tree::shallow(&node)
            } else {
                node
            }
        }
        Method::PUT => {
            tree::set(&mut *state.db.write().await, &keys, payload.clone());
            payload
        }
        Method::POST => {
            let name = tree::push(&mut *state.db.write().await, &keys, payload);
            json!({ "name": name })
        }
        Method::PATCH => {
            let Value::Object(patch) = payload else {
                return error(StatusCode::BAD_REQUEST, "Invalid data; PATCH requires a JSON object.");
            };
            tree::merge(&mut *state.db.write().await, &keys, patch.clone());
            Value::Object(patch)
        }
        Method::DELETE => {
            tree::remove(&mut *state.db.write().await, &keys);
            Value::Null
        }
        _ => return error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    };

    if params.print.as_deref() == Some("silent") {
        return StatusCode::NO_CONTENT.into_response();
    }
    (StatusCode::OK, Json(reply)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_keys_are_percent_decoded() {
        assert_eq!(
            node_keys("/first%20name/x%3Fy").unwrap(),
            vec!["first name".to_string(), "x?y".to_string()]
        );
    }

    #[test]
    fn node_keys_reject_invalid_utf8() {
        assert!(node_keys("/%FF").is_none());
    }

    #[test]
    fn params_default_to_absent() {
        let params: Params = serde_json::from_str("{}").unwrap();
        assert!(params.auth.is_none());
        assert!(params.shallow.is_none());
    }
}
