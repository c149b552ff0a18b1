//! Preparation: HEAD the URL, pick the destination, preallocate it.

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::job::JobContext;
use crate::download::{Download, DownloadState};
use crate::progress::ProgressTracker;
use crate::storage::StorageWriterBuilder;
use crate::transport::TransportError;
use crate::url_model::derive_filename;

/// Why a download could not be prepared. Never retried.
#[derive(Debug, thiserror::Error)]
pub(super) enum PreparationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("HEAD returned HTTP {0}")]
    Status(u32),
    #[error("{0:#}")]
    Storage(anyhow::Error),
}

/// New → Preparing → Ready (or Error). Returns the new tracker on success.
pub(super) fn prepare(ctx: &JobContext, download: &Download) -> Option<Arc<ProgressTracker>> {
    if !ctx.transition(download, &[DownloadState::New], DownloadState::Preparing, |_| {}) {
        return None;
    }
    match resolve(ctx, download) {
        Ok((path, tracker)) => {
            let ready = ctx.transition(
                download,
                &[DownloadState::Preparing],
                DownloadState::Ready,
                |e| {
                    e.filename = Some(path);
                    e.progress = Some(Arc::clone(&tracker));
                },
            );
            ready.then_some(tracker)
        }
        Err(e) => {
            ctx.fail(download, DownloadState::Preparing, e.to_string());
            None
        }
    }
}

fn resolve(
    ctx: &JobContext,
    download: &Download,
) -> Result<(PathBuf, Arc<ProgressTracker>), PreparationError> {
    let head = ctx.shared.transport.head(download.url())?;
    if head.status != 200 {
        return Err(PreparationError::Status(head.status));
    }
    let size = head.content_length();
    let name = derive_filename(download.parsed_url(), head.content_type());
    let path = ctx.shared.download_dir.join(name);
    allocate(&ctx.shared.download_dir, &path, size).map_err(PreparationError::Storage)?;
    tracing::debug!(
        url = download.url(),
        path = %path.display(),
        size = ?size,
        "destination allocated"
    );
    Ok((path, Arc::new(ProgressTracker::new(size))))
}

/// Creates (or truncates) the destination and preallocates a known size.
fn allocate(dir: &Path, path: &Path, size: Option<u64>) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut builder = StorageWriterBuilder::create(path)?;
    if let Some(size) = size {
        builder.preallocate(size)?;
    }
    Ok(())
}
