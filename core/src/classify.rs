//! Pure mapping from raw failures to classified `RequestError`s.
//!
//! Classification performs no I/O and publishes nothing; the executor
//! publishes health signals based on the kind returned here.

use crate::cancel::CancelReason;
use crate::error::{ErrorKind, RequestError};
use crate::origin::ResolveError;
use crate::transport::TransportError;

/// Status reported for a request that timed out before the server answered.
pub const TIMEOUT_STATUS: u16 = 503;

/// A failure as observed by the executor, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// The descriptor did not resolve to a same-origin URL; nothing was sent.
    Unroutable(ResolveError),
    /// A cancellation source fired before the transport settled.
    Cancelled(CancelReason),
    /// The transport failed without being cancelled.
    Transport(TransportError),
    /// A response arrived with a non-2xx status.
    Status { status: u16, body: String },
    /// A 2xx response body failed to parse as JSON.
    Malformed { status: u16, error: String },
}

pub fn classify(failure: &RawFailure) -> RequestError {
    match failure {
        RawFailure::Unroutable(e) => {
            RequestError::new(ErrorKind::NetworkError, format!("request not sent: {e}"))
        }
        RawFailure::Cancelled(CancelReason::Caller) => {
            RequestError::new(ErrorKind::Cancelled, "request cancelled by caller")
        }
        RawFailure::Cancelled(CancelReason::Timeout) => RequestError::new(
            ErrorKind::ServiceUnavailable,
            "request timed out; service unavailable",
        )
        .with_status(TIMEOUT_STATUS),
        // A transport that reports an abort nobody asked for is treated like
        // any other pre-response failure.
        RawFailure::Transport(e) => RequestError::new(ErrorKind::NetworkError, e.to_string()),
        RawFailure::Status { status, body } => {
            let kind = match *status {
                503 => ErrorKind::ServiceUnavailable,
                s if s >= 500 => ErrorKind::ServerError,
                _ => ErrorKind::HttpError,
            };
            RequestError::new(kind, status_message(*status, body)).with_status(*status)
        }
        RawFailure::Malformed { status, error } => RequestError::new(
            ErrorKind::DecodeError,
            format!("response body is not valid JSON: {error}"),
        )
        .with_status(*status),
    }
}

fn status_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}
