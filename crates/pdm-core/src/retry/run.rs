//! Retry loop: run a unit until success or the policy says stop.

use super::classify;
use super::error::UnitError;
use super::policy::{RetryDecision, RetryPolicy};
use crate::control::AbortToken;

/// Runs `f` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. Backoff sleeps end early when `abort` trips,
/// yielding `UnitError::Cancelled`. The last failure is returned as is.
pub fn run_with_retry<F>(policy: &RetryPolicy, abort: &AbortToken, mut f: F) -> Result<(), UnitError>
where
    F: FnMut() -> Result<(), UnitError>,
{
    let mut attempt = 1u32;
    loop {
        let err = match f() {
            Ok(()) => return Ok(()),
            Err(UnitError::Cancelled) => return Err(UnitError::Cancelled),
            Err(e) => e,
        };
        match policy.decide(attempt, classify::classify(&err)) {
            RetryDecision::NoRetry => return Err(err),
            RetryDecision::RetryAfter(d) => {
                tracing::debug!(attempt, delay_ms = d.as_millis() as u64, error = %err, "retrying transfer unit");
                if !abort.sleep(d) {
                    return Err(UnitError::Cancelled);
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;
    use std::cell::Cell;
    use std::io;

    fn reset() -> UnitError {
        UnitError::Transport(TransportError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        )))
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let res = run_with_retry(&RetryPolicy::immediate(5), &AbortToken::new(), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(reset())
            } else {
                Ok(())
            }
        });
        assert!(res.is_ok());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhaustion_returns_last_error() {
        let calls = Cell::new(0);
        let res = run_with_retry(&RetryPolicy::immediate(3), &AbortToken::new(), || {
            calls.set(calls.get() + 1);
            Err(UnitError::PartialTransfer {
                expected: 10,
                received: calls.get(),
            })
        });
        assert_eq!(calls.get(), 3);
        match res {
            Err(UnitError::PartialTransfer { received, .. }) => assert_eq!(received, 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn terminal_error_is_not_retried() {
        let calls = Cell::new(0);
        let res = run_with_retry(&RetryPolicy::immediate(5), &AbortToken::new(), || {
            calls.set(calls.get() + 1);
            Err(UnitError::Http(404))
        });
        assert!(matches!(res, Err(UnitError::Http(404))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn abort_during_backoff_cancels() {
        let abort = AbortToken::new();
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: std::time::Duration::from_secs(60),
            max_delay: std::time::Duration::from_secs(60),
        };
        let res = run_with_retry(&policy, &abort, || {
            abort.abort();
            Err(reset())
        });
        assert!(matches!(res, Err(UnitError::Cancelled)));
    }
}
