use crate::model::EtcdResult;
use crate::status::ErrorCode;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a usable response: connect failure,
    /// timeout, or interruption.
    #[error("Transport error: {0}")]
    Transport(#[from] etcdv2_http::Error),

    /// A status outside the operation's expected set, with nothing to parse.
    #[error("Error response from etcd: {reason} ({status})")]
    Http { status: u16, reason: String },

    /// A parsed error envelope whose code the operation did not expect.
    #[error("{message}")]
    Service {
        message: String,
        result: Box<EtcdResult>,
    },

    #[error("Error parsing response from etcd: {0}")]
    Parse(#[from] serde_json::Error),

    /// The operation needs a result but the server sent no body.
    #[error("Empty response body from etcd")]
    EmptyBody,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },
}

impl Error {
    pub(crate) fn service(result: EtcdResult) -> Self {
        let message = result
            .message
            .clone()
            .or_else(|| result.error_code.map(|c| c.description().to_string()))
            .unwrap_or_else(|| "etcd error".to_string());

        Error::Service {
            message,
            result: Box::new(result),
        }
    }

    /// The HTTP status, for errors raised on status alone.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_http_error(&self, status: u16) -> bool {
        self.http_status() == Some(status)
    }

    /// The service error code, for errors carrying a parsed envelope.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.etcd_result().and_then(EtcdResult::error_code)
    }

    pub fn is_etcd_error(&self, code: ErrorCode) -> bool {
        self.error_code() == Some(code)
    }

    /// The full parsed envelope behind a service error.
    pub fn etcd_result(&self) -> Option<&EtcdResult> {
        match self {
            Error::Service { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_interrupted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> EtcdResult {
        EtcdResult {
            error_code: Some(ErrorCode::KeyNotFound),
            message: Some("Key not found".to_string()),
            cause: Some("/missing".to_string()),
            index: 12,
            ..Default::default()
        }
    }

    #[test]
    fn service_error_keeps_envelope() {
        let e = Error::service(not_found());

        assert_eq!(e.to_string(), "Key not found");
        assert!(e.is_etcd_error(ErrorCode::KeyNotFound));
        assert!(!e.is_etcd_error(ErrorCode::TestFailed));
        assert_eq!(e.etcd_result().unwrap().cause.as_deref(), Some("/missing"));
        assert_eq!(e.http_status(), None);
    }

    #[test]
    fn service_error_without_message_uses_code_description() {
        let e = Error::service(EtcdResult {
            error_code: Some(ErrorCode::NotDir),
            ..Default::default()
        });
        assert_eq!(e.to_string(), "not a directory");
    }

    #[test]
    fn http_error_display_and_status() {
        let e = Error::Http {
            status: 500,
            reason: "Internal Server Error".to_string(),
        };

        assert_eq!(
            e.to_string(),
            "Error response from etcd: Internal Server Error (500)"
        );
        assert!(e.is_http_error(500));
        assert!(!e.is_http_error(404));
        assert!(e.error_code().is_none());
    }

    #[test]
    fn transport_interrupted() {
        let e: Error = etcdv2_http::Error::Interrupted.into();
        assert!(e.is_interrupted());
        assert!(e.etcd_result().is_none());
    }
}
