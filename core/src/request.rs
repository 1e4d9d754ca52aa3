//! URL and query-string construction.
//!
//! A node URL is `<base>/<path>.json`, followed by the query parameters the
//! config enables and the method accepts, in the fixed order
//! `auth`, `format`, `shallow`, `print`.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};

use crate::config::ClientConfig;
use crate::error::DbError;
use crate::http::HttpMethod;

/// Suffix that selects the JSON REST representation of a node.
pub const JSON_SUFFIX: &str = ".json";

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Query values keep only unreserved characters.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Query parameters understood by the REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParam {
    Auth,
    Format,
    Shallow,
    Print,
}

impl QueryParam {
    pub fn name(self) -> &'static str {
        match self {
            QueryParam::Auth => "auth",
            QueryParam::Format => "format",
            QueryParam::Shallow => "shallow",
            QueryParam::Print => "print",
        }
    }

    /// `shallow` only makes sense on reads; everything else goes on every method.
    pub fn allowed_for(self, method: HttpMethod) -> bool {
        match self {
            QueryParam::Shallow => method.is_read(),
            QueryParam::Auth | QueryParam::Format | QueryParam::Print => true,
        }
    }
}

/// Parameters `config` contributes to a request of `method`, unencoded.
pub fn query_params(config: &ClientConfig, method: HttpMethod) -> Vec<(QueryParam, String)> {
    let candidates = [
        (QueryParam::Auth, config.auth.clone()),
        (QueryParam::Format, config.export.then(|| "export".to_string())),
        (QueryParam::Shallow, config.shallow.then(|| "true".to_string())),
        (QueryParam::Print, config.print.map(|p| p.as_str().to_string())),
    ];

    candidates
        .into_iter()
        .filter(|(param, _)| param.allowed_for(method))
        .filter_map(|(param, value)| value.filter(|v| !v.is_empty()).map(|v| (param, v)))
        .collect()
}

/// Validate `path` and return it as `/seg/seg`, segments percent-encoded.
///
/// Leading, trailing and repeated slashes are ignored; the root is `/`.
pub fn node_path(path: &str) -> Result<String, DbError> {
    let mut out = String::new();
    for (depth, segment) in path.split('/').filter(|s| !s.is_empty()).enumerate() {
        if let Some(reason) = invalid_key_reason(depth, segment) {
            return Err(DbError::InvalidPath {
                path: path.to_string(),
                reason,
            });
        }
        out.push('/');
        out.extend(utf8_percent_encode(segment, PATH_SEGMENT));
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}

/// Server-defined locations whose names start with a dot.
const RESERVED_ROOT_KEYS: [&str; 2] = [".settings", ".info"];
const RESERVED_KEYS: [&str; 2] = [".priority", ".value"];

fn invalid_key_reason(depth: usize, segment: &str) -> Option<&'static str> {
    let reserved = (depth == 0 && RESERVED_ROOT_KEYS.contains(&segment)) || RESERVED_KEYS.contains(&segment);
    if reserved {
        return None;
    }
    if segment.chars().any(|c| matches!(c, '.' | '$' | '#' | '[' | ']')) {
        return Some("keys may not contain '.', '$', '#', '[' or ']'");
    }
    if segment.chars().any(|c| c.is_ascii_control()) {
        return Some("keys may not contain control characters");
    }
    None
}

/// Full request URL for `path` under `config`.
pub fn build_url(config: &ClientConfig, method: HttpMethod, path: &str) -> Result<String, DbError> {
    let mut url = format!("{}{}{JSON_SUFFIX}", config.base_url(), node_path(path)?);

    let params = query_params(config, method);
    for (i, (param, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(param.name());
        url.push('=');
        url.extend(utf8_percent_encode(value, QUERY_VALUE));
    }
    Ok(url)
}
