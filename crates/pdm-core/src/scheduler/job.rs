//! One queued unit of engine work: prepare a download if needed, then transfer it.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::{prepare, transfer, Shared};
use crate::control::AbortToken;
use crate::download::{Download, DownloadEntry, DownloadState};

/// What a job needs to act on behalf of its pool generation.
pub(super) struct JobContext {
    pub(super) shared: Arc<Shared>,
    pub(super) generation: u64,
    pub(super) abort: AbortToken,
}

impl JobContext {
    /// Moves `download` from one of `from` to `to`, applying `update` in the
    /// same critical section. Refused once the generation is aborted or the
    /// download is claimed by someone else. The event fires after the lock
    /// is released.
    pub(super) fn transition(
        &self,
        download: &Download,
        from: &[DownloadState],
        to: DownloadState,
        update: impl FnOnce(&mut DownloadEntry),
    ) -> bool {
        let moved = download.with_entry(|e| {
            if self.abort.is_aborted()
                || e.claim != Some(self.generation)
                || !from.contains(&e.state)
            {
                return false;
            }
            update(e);
            e.state = to;
            true
        });
        if moved {
            tracing::info!(url = download.url(), state = %to, "download state changed");
            self.shared.events.download_state_changed(download, to);
        }
        moved
    }

    /// Moves `download` from `from` to Error with `message`.
    pub(super) fn fail(&self, download: &Download, from: DownloadState, message: String) -> bool {
        let text = message.clone();
        let moved = self.transition(download, &[from], DownloadState::Error, |e| {
            e.message = Some(message)
        });
        if moved {
            tracing::warn!(url = download.url(), error = %text, "download failed");
        }
        moved
    }
}

/// Holds a download's claim and one slot of the in-flight count for the
/// lifetime of a queued job. Dropping it (normally, on panic, or when the
/// pool discards the job) releases both.
pub(super) struct ClaimGuard {
    shared: Arc<Shared>,
    generation: u64,
    download: Download,
}

impl ClaimGuard {
    pub(super) fn new(shared: Arc<Shared>, generation: u64, download: Download) -> Self {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            shared,
            generation,
            download,
        }
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        let generation = self.generation;
        self.download.with_entry(|e| {
            if e.claim == Some(generation) {
                e.claim = None;
            }
        });
        // Claim first: once the count hits zero, waiters may re-submit.
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub(super) fn run_job(ctx: JobContext, guard: ClaimGuard) {
    let download = &guard.download;
    if ctx.abort.is_aborted() {
        return;
    }
    let tracker = match download.progress() {
        Some(tracker) => tracker,
        None => match prepare::prepare(&ctx, download) {
            Some(tracker) => tracker,
            None => return,
        },
    };
    transfer::transfer(&ctx, download, tracker);
}
