//! Scheduling engine: owns the downloads and a resizable worker pool.
//!
//! `start_all` claims every unfinished download for the current pool
//! generation and queues one job per download. A job prepares the download
//! if it has no tracker yet, then fetches whatever its tracker reports
//! missing. `stop_all` and `set_threads_number` swap in a fresh generation
//! and abort the old one; interrupted downloads keep their progress and are
//! reverted to the state they re-enter from.

mod builder;
mod error;
mod job;
mod pool;
mod prepare;
mod transfer;

pub use builder::DownloaderBuilder;
pub use error::DownloaderError;

use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::config::EngineConfig;
use crate::download::{Download, DownloadState};
use crate::events::EventSink;
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use job::{ClaimGuard, JobContext};
use pool::PoolGeneration;

/// State shared between the `Downloader` handle and its jobs.
pub(crate) struct Shared {
    downloads: RwLock<Vec<Download>>,
    transport: Arc<dyn HttpTransport>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
    retry: RetryPolicy,
    download_dir: PathBuf,
    /// Queued or running jobs across all generations.
    in_flight: AtomicUsize,
}

/// Resumable parallel download engine.
pub struct Downloader {
    shared: Arc<Shared>,
    /// Current generation. Also serializes start/stop/resize.
    pool: Mutex<PoolGeneration>,
}

impl Downloader {
    /// Engine with default configuration, libcurl transport and no event sink.
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self, DownloaderError> {
        Self::builder(download_dir).build()
    }

    pub fn builder(download_dir: impl Into<PathBuf>) -> DownloaderBuilder {
        DownloaderBuilder::new(download_dir)
    }

    /// Absolute directory downloads are saved into.
    pub fn download_dir(&self) -> &Path {
        &self.shared.download_dir
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Registers `url` as a New download at the end of the collection.
    pub fn create_download(&self, url: &str) -> Result<Download, DownloaderError> {
        let parsed = Url::parse(url).map_err(|source| DownloaderError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let download = Download::new(parsed);
        self.shared.downloads.write().push(download.clone());
        tracing::debug!(url = download.url(), "download registered");
        Ok(download)
    }

    /// Snapshot of the registered downloads, in registration order.
    pub fn downloads(&self) -> Vec<Download> {
        self.shared.downloads.read().clone()
    }

    /// Queues every download that is not Finished and not already queued on
    /// the current pool. Downloads in Error are re-armed first (Ready if they
    /// have a tracker, New otherwise). Calling it again is harmless.
    pub fn start_all(&self) {
        let pool = self.pool.lock();
        let queued = self
            .downloads()
            .iter()
            .filter(|d| self.submit(&pool, d))
            .count();
        tracing::info!(generation = pool.id, queued, "start all");
    }

    /// Cancels in-flight work by replacing the worker pool. Interrupted
    /// downloads go back to New (from Preparing) or Ready (from Running)
    /// and keep their progress.
    pub fn stop_all(&self) -> Result<(), DownloaderError> {
        let mut pool = self.pool.lock();
        let threads = pool.threads;
        let interrupted = self.replace_pool(&mut pool, threads)?;
        tracing::info!(interrupted = interrupted.len(), "stop all");
        Ok(())
    }

    /// Blocks until no job is queued or running, polling at the configured
    /// interval. Returns at once for a never-started or stopped engine.
    pub fn wait_all(&self) {
        let interval = self.shared.config.wait_poll_interval();
        while self.shared.in_flight.load(Ordering::SeqCst) > 0 {
            std::thread::sleep(interval);
        }
    }

    /// Replaces the worker pool with one of `threads` workers and resubmits
    /// the downloads it interrupted. Progress is kept, so only ranges still
    /// missing are fetched again.
    pub fn set_threads_number(&self, threads: usize) -> Result<(), DownloaderError> {
        let threads = threads.max(1);
        let mut pool = self.pool.lock();
        let interrupted = self.replace_pool(&mut pool, threads)?;
        let resubmitted = interrupted
            .iter()
            .filter(|d| self.submit(&pool, d))
            .count();
        tracing::info!(threads, resubmitted, "worker pool resized");
        Ok(())
    }

    pub fn threads_number(&self) -> usize {
        self.pool.lock().threads
    }

    /// Claims `download` for `pool` and queues a job for it.
    fn submit(&self, pool: &PoolGeneration, download: &Download) -> bool {
        let claimed = download.with_entry(|e| {
            if e.state == DownloadState::Finished || e.claim == Some(pool.id) {
                return None;
            }
            let rearm = e.state == DownloadState::Error;
            if rearm {
                e.state = if e.progress.is_some() {
                    DownloadState::Ready
                } else {
                    DownloadState::New
                };
            }
            e.claim = Some(pool.id);
            Some(rearm.then_some(e.state))
        });
        let Some(rearmed) = claimed else {
            return false;
        };
        if let Some(state) = rearmed {
            tracing::info!(url = download.url(), state = %state, "download re-armed");
            self.shared.events.download_state_changed(download, state);
        }

        let guard = ClaimGuard::new(Arc::clone(&self.shared), pool.id, download.clone());
        let ctx = JobContext {
            shared: Arc::clone(&self.shared),
            generation: pool.id,
            abort: pool.abort.clone(),
        };
        pool.spawn(move || job::run_job(ctx, guard));
        true
    }

    /// Swaps in a new generation, aborts the old one and releases its claims.
    /// Returns the unfinished downloads the old generation was holding.
    fn replace_pool(
        &self,
        slot: &mut PoolGeneration,
        threads: usize,
    ) -> Result<Vec<Download>, DownloaderError> {
        let fresh = PoolGeneration::build(slot.id + 1, threads)?;
        let old = std::mem::replace(slot, fresh);
        old.abort.abort();
        Ok(self.release_claims(old.id))
    }

    fn release_claims(&self, generation: u64) -> Vec<Download> {
        let mut interrupted = Vec::new();
        for download in self.downloads() {
            let released = download.with_entry(|e| {
                if e.claim != Some(generation) {
                    return None;
                }
                e.claim = None;
                let before = e.state;
                e.state = match before {
                    DownloadState::Preparing => DownloadState::New,
                    DownloadState::Running => DownloadState::Ready,
                    other => other,
                };
                Some((before, e.state))
            });
            let Some((before, after)) = released else {
                continue;
            };
            if before != after {
                tracing::info!(url = download.url(), state = %after, "download interrupted");
                self.shared.events.download_state_changed(&download, after);
            }
            if !after.is_terminal() {
                interrupted.push(download);
            }
        }
        interrupted
    }
}

impl Drop for Downloader {
    fn drop(&mut self) {
        self.pool.get_mut().abort.abort();
    }
}
