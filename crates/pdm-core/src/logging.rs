//! Logging init: append-only file under the XDG state dir, or stderr.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,pdm_core=debug,pdm=debug";

/// Per-event writer: a clone of the log file, or stderr when cloning fails.
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFile(fs::File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

/// `RUST_LOG` when set, else the crate defaults.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// `~/.local/state/pdm/pdm.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pdm")?;
    Ok(xdg_dirs.get_state_home().join("pdm.log"))
}

/// Initialize structured logging to the state-dir log file.
/// Errors leave the global subscriber unset so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(BoxMakeWriter::new(LogFile(file)))
        .with_thread_names(true)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("pdm logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only. Does nothing if a subscriber is already set.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_thread_names(true)
        .with_ansi(false)
        .try_init();
}
