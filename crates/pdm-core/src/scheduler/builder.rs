use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::pool::PoolGeneration;
use super::{Downloader, DownloaderError, Shared};
use crate::config::EngineConfig;
use crate::events::{EventSink, NoopSink};
use crate::transport::{CurlOptions, CurlTransport, HttpTransport};

/// Configures and builds a `Downloader`.
pub struct DownloaderBuilder {
    download_dir: PathBuf,
    config: EngineConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    events: Option<Arc<dyn EventSink>>,
}

impl DownloaderBuilder {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            config: EngineConfig::default(),
            transport: None,
            events: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// HTTP transport; defaults to libcurl configured from `EngineConfig`.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Receiver of state and progress events; defaults to `NoopSink`.
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<Downloader, DownloaderError> {
        let download_dir = std::path::absolute(&self.download_dir).unwrap_or(self.download_dir);
        let config = self.config;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(CurlTransport::new(curl_options(&config))));
        let events = self.events.unwrap_or_else(|| Arc::new(NoopSink));
        let pool = PoolGeneration::build(1, config.threads_or_default())?;

        tracing::debug!(dir = %download_dir.display(), threads = pool.threads, "downloader ready");
        Ok(Downloader {
            shared: Arc::new(Shared {
                downloads: RwLock::new(Vec::new()),
                transport,
                events,
                retry: config.retry_policy(),
                config,
                download_dir,
                in_flight: AtomicUsize::new(0),
            }),
            pool: Mutex::new(pool),
        })
    }
}

fn curl_options(config: &EngineConfig) -> CurlOptions {
    CurlOptions {
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        buffer_size: Some(config.buffer_size),
        user_agent: config.user_agent.clone(),
        ..CurlOptions::default()
    }
}
