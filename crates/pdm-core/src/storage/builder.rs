//! Builder for creating and preallocating destination files.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Creates a new destination file. Once preallocated it is reopened with
/// `StorageWriter::open_existing` for concurrent `write_at` from several leaves.
pub struct StorageWriterBuilder {
    file: File,
}

impl StorageWriterBuilder {
    /// Create the file at `path`, truncating anything already there.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to create file: {}", path.display()))?;
        Ok(StorageWriterBuilder { file })
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` first and
    /// falls back to `set_len` (sparse, zero-filled) when that fails.
    pub fn preallocate(&mut self, size: u64) -> Result<()> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .with_context(|| format!("failed to preallocate {} bytes", size))?;
        Ok(())
    }
}
