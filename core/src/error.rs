//! Error types for the request layer and the action facade.
//!
//! # Design
//! `RequestError` is the classified failure every `execute` call can return:
//! a closed `ErrorKind`, a human-readable message, and the HTTP status when
//! one applies. `ApiError` is what facade operations return; it wraps
//! `RequestError` and adds the failures that belong to the facade itself
//! (bad input, encoding, unexpected response shapes).

use std::fmt;

use crate::health::HealthSignal;

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller cancelled the request.
    Cancelled,
    /// The request timed out, or the server answered 503.
    ServiceUnavailable,
    /// The server answered with a 5xx other than 503.
    ServerError,
    /// Any other non-2xx status.
    HttpError,
    /// No response arrived (connectivity, refused, unroutable request).
    NetworkError,
    /// A 2xx response whose body is not valid JSON.
    DecodeError,
}

impl ErrorKind {
    /// The health signal published alongside this kind, if it is systemic.
    pub fn health_signal(&self) -> Option<HealthSignal> {
        match self {
            ErrorKind::ServiceUnavailable => Some(HealthSignal::ServiceUnavailable),
            ErrorKind::ServerError => Some(HealthSignal::ServerError),
            ErrorKind::Cancelled
            | ErrorKind::HttpError
            | ErrorKind::NetworkError
            | ErrorKind::DecodeError => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::ServiceUnavailable => "service unavailable",
            ErrorKind::ServerError => "server error",
            ErrorKind::HttpError => "http error",
            ErrorKind::NetworkError => "network error",
            ErrorKind::DecodeError => "decode error",
        };
        f.write_str(name)
    }
}

/// A classified request failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl RequestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Result of one executed request: the decoded JSON body or a classified failure.
pub type Outcome = Result<serde_json::Value, RequestError>;

/// Errors returned by `ArcadeClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request layer reported a failure.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// An argument could not be turned into a valid request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response was valid JSON but not the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// The request-layer kind, when the failure came from the request layer.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Request(e) => Some(e.kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_systemic_kinds_signal() {
        assert_eq!(
            ErrorKind::ServiceUnavailable.health_signal(),
            Some(HealthSignal::ServiceUnavailable)
        );
        assert_eq!(ErrorKind::ServerError.health_signal(), Some(HealthSignal::ServerError));
        for kind in [
            ErrorKind::Cancelled,
            ErrorKind::HttpError,
            ErrorKind::NetworkError,
            ErrorKind::DecodeError,
        ] {
            assert_eq!(kind.health_signal(), None, "{kind}");
        }
    }

    #[test]
    fn request_error_display() {
        let err = RequestError::new(ErrorKind::HttpError, "HTTP 404: no such room").with_status(404);
        assert_eq!(err.to_string(), "http error: HTTP 404: no such room");
        assert_eq!(err.status, Some(404));
    }

    #[test]
    fn api_error_exposes_kind() {
        let err: ApiError = RequestError::new(ErrorKind::Cancelled, "cancelled").into();
        assert_eq!(err.kind(), Some(ErrorKind::Cancelled));
        assert_eq!(ApiError::InvalidInput("code".into()).kind(), None);
    }
}
