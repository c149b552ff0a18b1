//! Worker pool generations.
//!
//! Stopping or resizing the engine replaces the whole pool. Each replacement
//! gets a new generation id and abort token; downloads are claimed by id, so
//! work still draining from an old pool cannot touch state the new one owns.

use std::any::Any;

use crate::control::AbortToken;

pub(super) struct PoolGeneration {
    pub(super) id: u64,
    pub(super) threads: usize,
    pub(super) abort: AbortToken,
    pool: rayon::ThreadPool,
}

impl PoolGeneration {
    pub(super) fn build(id: u64, threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("pdm-g{}-w{}", id, i))
            .panic_handler(move |payload| {
                tracing::error!(generation = id, panic = panic_message(payload.as_ref()), "worker panicked");
            })
            .build()?;
        tracing::debug!(generation = id, threads, "worker pool started");
        Ok(Self {
            id,
            threads,
            abort: AbortToken::new(),
            pool,
        })
    }

    pub(super) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
