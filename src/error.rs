use serde_json::Value;
use thiserror::Error;

/// Classified failure taxonomy for every call against the backend.
///
/// Every failure a caller can observe resolves to one of these kinds before
/// it reaches the presentation layer. `Config` only occurs at client
/// construction time (bad base address); it never comes out of a dispatched
/// request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response reached the client (connection refused, DNS, timeout).
    /// Transient from the user's point of view, retryable.
    #[error("network error: {message}")]
    Network { message: String },

    /// The remote explicitly rejected the request with a non-2xx status.
    /// The raw body is preserved unparsed because the backend may return
    /// either a structured `{"detail": ...}` object or plain text.
    #[error("server rejected the request (status {status})")]
    Api { status: u16, body: String },

    /// The response carried a success status but its body violated the
    /// expected shape. Contract violation, never silently coerced.
    #[error("malformed response (status {status}): {message}")]
    Parse { status: u16, message: String },

    /// The client itself was misconfigured. Fatal at construction.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Status code of the remote rejection, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::Parse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx rejections: the request itself was at fault (bad credentials,
    /// validation failure). Retrying unchanged will not help.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ApiError::Api { status, .. } if (400..500).contains(status))
    }

    /// 5xx rejections and transport failures: the remote side (or the path
    /// to it) failed, potentially transiently.
    pub fn is_remote_fault(&self) -> bool {
        match self {
            ApiError::Network { .. } => true,
            ApiError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Extract the `detail` field when the rejection body is the backend's
    /// structured error object. Plain-text bodies yield `None`; callers fall
    /// back to the raw body or the Display impl.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Api { body, .. } => serde_json::from_str::<Value>(body)
                .ok()?
                .get("detail")?
                .as_str()
                .map(|s| s.to_string()),
            _ => None,
        }
    }
}
