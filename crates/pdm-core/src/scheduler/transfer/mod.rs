//! Transfer step: Ready → Running → Finished (or Error).
//!
//! A known size is fetched as a recursive fan-out of ranged leaves over the
//! ranges still missing in the tracker; an unknown size is fetched as one
//! whole stream. Both write through one shared `StorageWriter`.

mod fanout;
mod sink;
mod stream;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::job::JobContext;
use crate::download::{Download, DownloadState};
use crate::progress::ProgressTracker;
use crate::retry::UnitError;
use crate::storage::StorageWriter;

/// State shared by every unit of one download's transfer run.
pub(super) struct Unit<'a> {
    ctx: &'a JobContext,
    download: &'a Download,
    tracker: &'a ProgressTracker,
    storage: StorageWriter,
    /// Set when a leaf gives up, so its siblings stop early.
    failed: AtomicBool,
}

impl Unit<'_> {
    /// True once the generation is aborted or a sibling failed for good.
    fn stopped(&self) -> bool {
        self.ctx.abort.is_aborted() || self.failed.load(Ordering::Acquire)
    }
}

pub(super) fn transfer(ctx: &JobContext, download: &Download, tracker: Arc<ProgressTracker>) {
    if !ctx.transition(download, &[DownloadState::Ready], DownloadState::Running, |_| {}) {
        return;
    }
    match execute(ctx, download, &tracker) {
        Ok(()) if tracker.size().is_none() || tracker.is_complete() => {
            ctx.transition(download, &[DownloadState::Running], DownloadState::Finished, |_| {});
        }
        Ok(()) => {
            ctx.fail(
                download,
                DownloadState::Running,
                "transfer ended with missing ranges".to_string(),
            );
        }
        Err(UnitError::Cancelled) => {
            tracing::debug!(url = download.url(), "transfer cancelled");
        }
        Err(e) => {
            ctx.fail(download, DownloadState::Running, e.to_string());
        }
    }
}

fn execute(ctx: &JobContext, download: &Download, tracker: &ProgressTracker) -> Result<(), UnitError> {
    let path = download.filename().ok_or_else(|| {
        UnitError::Storage(io::Error::new(io::ErrorKind::NotFound, "destination not prepared"))
    })?;
    let storage = StorageWriter::open_existing(&path)
        .map_err(|e| UnitError::Storage(io::Error::other(format!("{:#}", e))))?;
    let unit = Unit {
        ctx,
        download,
        tracker,
        storage,
        failed: AtomicBool::new(false),
    };
    match tracker.size() {
        Some(_) => fanout::fetch_missing(&unit)?,
        None => stream::fetch_stream(&unit)?,
    }
    unit.storage.sync().map_err(UnitError::Storage)
}
