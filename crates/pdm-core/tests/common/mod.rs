#![allow(dead_code)]

pub mod range_server;
pub mod scripted;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pdm_core::config::{EngineConfig, RetryConfig};
use pdm_core::{Download, DownloadState, EventSink};

/// Deterministic body: 0..=250 repeated.
pub fn body(len: usize) -> Vec<u8> {
    (0u8..=250).cycle().take(len).collect()
}

/// Small parts, immediate retries and fast polling.
pub fn test_config(threads: usize, min_part_size: u64, max_attempts: u32) -> EngineConfig {
    EngineConfig {
        threads: Some(threads),
        min_part_size,
        wait_poll_interval_ms: 5,
        retry: Some(RetryConfig {
            max_attempts,
            base_delay_secs: 0.0,
            max_delay_secs: 0,
        }),
        ..EngineConfig::default()
    }
}

/// Polls `cond` until it holds; panics after five seconds.
pub fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Sink recording every state change and counting progress events.
#[derive(Default)]
pub struct RecordingSink {
    states: Mutex<Vec<(String, DownloadState)>>,
    progress: Mutex<usize>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states_for(&self, url: &str) -> Vec<DownloadState> {
        self.states
            .lock()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn progress_events(&self) -> usize {
        *self.progress.lock()
    }
}

impl EventSink for RecordingSink {
    fn download_state_changed(&self, download: &Download, state: DownloadState) {
        self.states.lock().push((download.url().to_string(), state));
    }

    fn progress_changed(&self, _download: &Download) {
        *self.progress.lock() += 1;
    }
}
