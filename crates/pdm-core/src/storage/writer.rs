//! Concurrent offset writer for destination files.

use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

/// Writer for a destination file. Safe to clone and use from several threads;
/// each `write_at` is independent of the file cursor (pwrite-style).
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    path: PathBuf,
}

impl StorageWriter {
    /// Open a prepared file for writing, without truncation.
    pub fn open_existing(path: &Path) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self {
            file: Arc::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Write all of `data` at `offset`.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.write_all_at(data, offset)
    }

    #[cfg(windows)]
    pub fn write_at(&self, mut offset: u64, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            let n = self.file.seek_write(data, offset)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
            }
            data = &data[n..];
            offset += n as u64;
        }
        Ok(())
    }

    /// Sync file data to disk.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    /// Truncate or extend the file to `len` bytes.
    pub fn set_len(&self, len: u64) -> io::Result<()> {
        self.file.set_len(len)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
