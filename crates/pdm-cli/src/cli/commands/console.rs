//! Console event sink: one line per state change, throttled progress lines.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use pdm_core::{Download, DownloadState, EventSink};

pub struct ConsoleSink {
    interval: Duration,
    last_progress: Mutex<HashMap<String, Instant>>,
}

impl ConsoleSink {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_progress: Mutex::new(HashMap::new()),
        }
    }

    /// True if `url` has not printed progress within the interval.
    fn due(&self, url: &str) -> bool {
        let Ok(mut last) = self.last_progress.lock() else {
            return false;
        };
        let now = Instant::now();
        match last.get(url) {
            Some(at) if now.duration_since(*at) < self.interval => false,
            _ => {
                last.insert(url.to_string(), now);
                true
            }
        }
    }
}

impl EventSink for ConsoleSink {
    fn download_state_changed(&self, download: &Download, state: DownloadState) {
        match (state, download.message()) {
            (DownloadState::Error, Some(msg)) => {
                println!("[{:>9}] {}: {}", state, download.url(), msg)
            }
            (DownloadState::Ready, _) => match download.filename() {
                Some(path) => println!("[{:>9}] {} -> {}", state, download.url(), path.display()),
                None => println!("[{:>9}] {}", state, download.url()),
            },
            _ => println!("[{:>9}] {}", state, download.url()),
        }
    }

    fn progress_changed(&self, download: &Download) {
        if self.due(download.url()) {
            println!(
                "{}",
                progress_line(download.url(), download.absolute_progress(), download.size())
            );
        }
    }
}

pub(crate) fn progress_line(url: &str, received: u64, size: Option<u64>) -> String {
    match size {
        Some(size) if size > 0 => format!(
            "{:>6.1}% {} ({}/{} bytes)",
            received as f64 * 100.0 / size as f64,
            url,
            received,
            size
        ),
        _ => format!("{:>7} {} ({} bytes)", "?", url, received),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_with_size() {
        assert_eq!(
            progress_line("http://h/f", 50, Some(200)),
            "  25.0% http://h/f (50/200 bytes)"
        );
    }

    #[test]
    fn progress_line_unknown_size() {
        assert_eq!(progress_line("http://h/f", 7, None), "      ? http://h/f (7 bytes)");
    }

    #[test]
    fn progress_is_throttled_per_url() {
        let sink = ConsoleSink::new(Duration::from_secs(60));
        assert!(sink.due("a"));
        assert!(!sink.due("a"));
        assert!(sink.due("b"));
        let eager = ConsoleSink::new(Duration::ZERO);
        assert!(eager.due("a"));
        assert!(eager.due("a"));
    }
}
