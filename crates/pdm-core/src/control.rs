//! Cancellation for in-flight work.
//!
//! Every worker pool generation owns one `AbortToken`. Stopping or resizing
//! the engine trips the token of the outgoing generation; transfer units
//! check it between chunks and while backing off, and abandon their range.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity of abort checks while sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(20);

/// Shared abort flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    aborted: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Sleeps for `duration` unless aborted first.
    /// Returns `true` if the full duration elapsed, `false` if woken by abort.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_aborted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}
