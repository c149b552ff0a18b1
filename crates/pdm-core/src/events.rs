//! Event sink consumed by front-ends (table UI, console).
//!
//! Both callbacks run synchronously on the worker thread that produced the
//! change, after the download's internal lock has been released. They must
//! return quickly and must not call back into the `Downloader`.
//!
//! By the time a callback runs the download may already have moved on, so
//! the state a change produced is passed along instead of being read back.

use crate::download::{Download, DownloadState};

/// Receiver of download notifications. Both methods default to no-ops.
pub trait EventSink: Send + Sync {
    /// The download moved to `state`.
    fn download_state_changed(&self, _download: &Download, _state: DownloadState) {}

    /// More bytes of the download were written to disk.
    fn progress_changed(&self, _download: &Download) {}
}

/// Sink that ignores every event; the engine default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {}
