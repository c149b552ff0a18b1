//! Download entity and its state.
//!
//! A `Download` is a cheap, cloneable handle. Readers (UI, CLI) only see the
//! getters; all mutation happens on engine workers through `with_entry`, one
//! critical section per entity.

use parking_lot::Mutex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

use crate::progress::ProgressTracker;
use crate::segmenter::Segment;

/// Lifecycle of a download.
///
/// New → Preparing → Ready → Running → Finished, with Error reachable from
/// Preparing and Running. Error is re-armed by `Downloader::start_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadState {
    New,
    Preparing,
    Ready,
    Running,
    Finished,
    Error,
}

impl DownloadState {
    /// Finished and Error end a run; nothing moves them without a new start.
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadState::Finished | DownloadState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadState::New => "new",
            DownloadState::Preparing => "preparing",
            DownloadState::Ready => "ready",
            DownloadState::Running => "running",
            DownloadState::Finished => "finished",
            DownloadState::Error => "error",
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Mutable part of a download, guarded by the entity lock.
#[derive(Debug)]
pub(crate) struct DownloadEntry {
    pub(crate) state: DownloadState,
    pub(crate) filename: Option<PathBuf>,
    pub(crate) message: Option<String>,
    pub(crate) progress: Option<Arc<ProgressTracker>>,
    /// Pool generation currently working on this download, if any.
    pub(crate) claim: Option<u64>,
}

struct DownloadInner {
    url: Url,
    entry: Mutex<DownloadEntry>,
}

/// Handle to one registered download.
#[derive(Clone)]
pub struct Download {
    inner: Arc<DownloadInner>,
}

impl Download {
    pub(crate) fn new(url: Url) -> Self {
        Self {
            inner: Arc::new(DownloadInner {
                url,
                entry: Mutex::new(DownloadEntry {
                    state: DownloadState::New,
                    filename: None,
                    message: None,
                    progress: None,
                    claim: None,
                }),
            }),
        }
    }

    /// Runs `f` inside this download's critical section.
    pub(crate) fn with_entry<R>(&self, f: impl FnOnce(&mut DownloadEntry) -> R) -> R {
        f(&mut self.inner.entry.lock())
    }

    pub fn url(&self) -> &str {
        self.inner.url.as_str()
    }

    pub(crate) fn parsed_url(&self) -> &Url {
        &self.inner.url
    }

    pub fn state(&self) -> DownloadState {
        self.inner.entry.lock().state
    }

    /// Absolute destination path; set once preparation succeeds.
    pub fn filename(&self) -> Option<PathBuf> {
        self.inner.entry.lock().filename.clone()
    }

    /// Last error description; set when the download enters Error.
    pub fn message(&self) -> Option<String> {
        self.inner.entry.lock().message.clone()
    }

    /// Declared size. `None` before preparation or when the server sent no length.
    pub fn size(&self) -> Option<u64> {
        self.progress().and_then(|p| p.size())
    }

    /// The progress tracker, present from Ready onwards.
    pub fn progress(&self) -> Option<Arc<ProgressTracker>> {
        self.inner.entry.lock().progress.clone()
    }

    /// Completion ratio in [0, 1]; 0 until the tracker exists.
    pub fn completion(&self) -> f64 {
        self.progress().map_or(0.0, |p| p.completion_ratio())
    }

    /// Bytes recorded as written.
    pub fn absolute_progress(&self) -> u64 {
        self.progress().map_or(0, |p| p.absolute_progress())
    }

    /// `None` until the size is established.
    pub fn is_complete(&self) -> Option<bool> {
        self.progress().map(|p| p.is_complete())
    }

    /// Ranges still to fetch; `None` until the size is established.
    pub fn missing_parts(&self) -> Option<Vec<Segment>> {
        self.progress().map(|p| p.missing_parts())
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = self.inner.entry.lock();
        f.debug_struct("Download")
            .field("url", &self.inner.url.as_str())
            .field("state", &entry.state)
            .field("filename", &entry.filename)
            .field("message", &entry.message)
            .finish()
    }
}
