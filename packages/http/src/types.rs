use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP method for requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    PUT,
    DELETE,
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::PUT => http::Method::PUT,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
        };
        f.write_str(name)
    }
}

/// A single HTTP call against an already-encoded URL.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HttpRequest {
    #[serde(default)]
    pub method: Method,

    /// Absolute URL, query string included. Sent as-is.
    pub url: String,

    /// Form fields, sent as `application/x-www-form-urlencoded` when non-empty.
    /// Order is preserved on the wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form: Vec<(String, String)>,

    /// Upper bound on the whole exchange. `None` waits as long as the
    /// server holds the connection open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self {
            method: Method::PUT,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Look up a form field by name.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response with its body already drained from the connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Raw body text. `None` when the server sent no content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status`.
    pub fn new(status: u16, body: Option<String>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();

        Self {
            status,
            status_text,
            body: body.filter(|b| !b.is_empty()),
        }
    }
}
