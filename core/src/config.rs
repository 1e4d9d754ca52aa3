//! Client configuration.

/// Output formatting requested through the `print` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Human-readable JSON in the response.
    Pretty,
    /// Suppress the response body; the server answers `204 No Content`.
    Silent,
}

impl PrintMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PrintMode::Pretty => "pretty",
            PrintMode::Silent => "silent",
        }
    }
}

/// Static configuration of a `DatabaseClient`.
///
/// Built once and never mutated by the client. Use the `with_*` methods to
/// derive a variant before constructing a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Database root, e.g. `https://example.firebaseio.com`.
    base_url: String,

    /// Database secret or ID token, sent as `auth`.
    pub auth: Option<String>,

    /// Ask the server to include priorities in responses (`format=export`).
    pub export: bool,

    /// Truncate nested objects to `true` on reads (`shallow=true`).
    pub shallow: bool,

    /// Response formatting (`print=pretty|silent`).
    pub print: Option<PrintMode>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: None,
            export: false,
            shallow: false,
            print: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the credential. An empty token clears it.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_export(mut self, export: bool) -> Self {
        self.export = export;
        self
    }

    pub fn with_shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    pub fn with_print(mut self, print: Option<PrintMode>) -> Self {
        self.print = print;
        self
    }
}
