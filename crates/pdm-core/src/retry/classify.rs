//! Classify HTTP status and transport errors into retry policy error kinds.

use super::error::UnitError;
use super::policy::ErrorKind;
use crate::transport::TransportError;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a transport failure.
pub fn classify_transport(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Timeout(_) => ErrorKind::Timeout,
        TransportError::Connection(_) | TransportError::Io(_) => ErrorKind::Connection,
        TransportError::Aborted(_) | TransportError::Other(_) => ErrorKind::Other,
    }
}

/// Classify a unit error into an ErrorKind.
pub fn classify(e: &UnitError) -> ErrorKind {
    match e {
        UnitError::Transport(te) => classify_transport(te),
        UnitError::Http(code) => classify_http_status(*code),
        UnitError::PartialTransfer { .. } => ErrorKind::Connection,
        UnitError::Overrun { .. } | UnitError::Storage(_) | UnitError::Cancelled => {
            ErrorKind::Other
        }
    }
}
