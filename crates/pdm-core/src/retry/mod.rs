//! Retry and backoff policy for transfer units.
//!
//! Classifies unit failures (timeouts, throttling, dropped connections,
//! terminal HTTP statuses) and decides whether and when to try again, so the
//! ranged and whole-stream paths share one policy.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, classify_transport};
pub use error::UnitError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
