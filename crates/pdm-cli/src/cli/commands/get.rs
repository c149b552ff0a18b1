//! Get command: register URLs, start everything, wait, report.

use anyhow::{bail, Result};
use pdm_core::config::EngineConfig;
use pdm_core::{checksum, Downloader, DownloadState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::console::ConsoleSink;

/// Progress lines per download at most this often.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct GetArgs {
    pub urls: Vec<String>,
    pub download_dir: PathBuf,
    pub threads: Option<usize>,
    pub sha256: Option<String>,
}

pub fn run_get(mut cfg: EngineConfig, args: GetArgs) -> Result<()> {
    if args.sha256.is_some() && args.urls.len() != 1 {
        bail!("--sha256 needs exactly one URL");
    }
    if let Some(threads) = args.threads {
        cfg.threads = Some(threads);
    }

    let downloader = Downloader::builder(args.download_dir)
        .config(cfg)
        .event_sink(Arc::new(ConsoleSink::new(PROGRESS_INTERVAL)))
        .build()?;

    for url in &args.urls {
        if let Err(e) = downloader.create_download(url) {
            eprintln!("skipping: {}", e);
        }
    }
    let downloads = downloader.downloads();
    if downloads.is_empty() {
        bail!("no valid URLs to download");
    }

    tracing::info!(
        count = downloads.len(),
        dir = %downloader.download_dir().display(),
        threads = downloader.threads_number(),
        "get started"
    );
    downloader.start_all();
    downloader.wait_all();

    let failed = downloads
        .iter()
        .filter(|d| d.state() != DownloadState::Finished)
        .count();

    if let (Some(expected), Some(download)) = (&args.sha256, downloads.first()) {
        if let (DownloadState::Finished, Some(path)) = (download.state(), download.filename()) {
            if !checksum::verify_sha256(&path, expected)? {
                bail!("checksum mismatch for {}", path.display());
            }
            println!("checksum OK  {}", path.display());
        }
    }

    if failed > 0 {
        bail!("{} of {} downloads did not finish", failed, downloads.len());
    }
    Ok(())
}
