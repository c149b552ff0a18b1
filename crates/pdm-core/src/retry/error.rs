//! Failure of one transfer unit (a ranged leaf or a whole stream).

use crate::transport::TransportError;

/// Error returned by a single unit attempt. Classified before it is retried
/// or escalated to the download.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Response status the unit cannot use.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body ended before the requested range was filled.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// The server sent more than the requested range.
    #[error("server sent more than the {expected} bytes requested")]
    Overrun { expected: u64 },
    /// Positioned write to the destination failed. Not retried.
    #[error("storage: {0}")]
    Storage(std::io::Error),
    /// The pool generation was stopped, or a sibling unit failed for good.
    #[error("transfer cancelled")]
    Cancelled,
}
