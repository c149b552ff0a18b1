/// Errors surfaced synchronously by the `Downloader` API.
///
/// Everything else (preparation and transfer failures) is reported through
/// download state and the event sink.
#[derive(Debug, thiserror::Error)]
pub enum DownloaderError {
    /// The URL passed to `create_download` does not parse.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// A worker pool could not be started (engine construction, stop or resize).
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
