pub mod config;
pub mod logging;

pub mod checksum;
pub mod control;
pub mod download;
pub mod events;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod segmenter;
pub mod storage;
pub mod transport;
pub mod url_model;

pub use download::{Download, DownloadState};
pub use events::{EventSink, NoopSink};
pub use progress::ProgressTracker;
pub use scheduler::{Downloader, DownloaderBuilder, DownloaderError};
pub use segmenter::Segment;
