//! Rotating log file writer with size-based rotation and backup retention.
//!
//! [`RotatingFileWriter`] plugs into `tracing_subscriber::fmt` as a
//! [`MakeWriter`]. Every formatted event is appended to the log file; once the
//! file grows past the size limit it is renamed with a timestamp suffix and a
//! fresh file is started. Backups beyond the retention limit are removed.

use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum file size before rotation (10 MB).
const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Number of backup files to retain after rotation.
const MAX_BACKUP_FILES: usize = 3;

struct Inner {
    file_path: PathBuf,
    max_bytes: u64,
    /// Lazily opened handle and the number of bytes in the current file.
    file: Mutex<Option<(File, u64)>>,
}

/// Thread-safe rotating file writer.
///
/// Cloning is cheap; all clones share one file handle.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Inner>,
}

impl RotatingFileWriter {
    /// Creates a writer for `file_path`. The file is opened on first write.
    #[must_use]
    pub fn new(file_path: PathBuf) -> Self {
        Self::with_limit(file_path, MAX_FILE_SIZE_BYTES)
    }

    pub(crate) fn with_limit(file_path: PathBuf, max_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                file_path,
                max_bytes,
                file: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.file_path
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<()> {
        let mut guard = self.inner.file.lock();

        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.inner.file_path)?;
            let size = file.metadata().map(|m| m.len()).unwrap_or(0);
            *guard = Some((file, size));
        }

        if guard.as_ref().is_some_and(|(_, size)| *size > self.inner.max_bytes) {
            *guard = None;
            self.rotate_files()?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.inner.file_path)?;
            *guard = Some((file, 0));
        }

        let (file, size) = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        file.write_all(buf)?;
        *size += buf.len() as u64;
        Ok(())
    }

    /// Renames the current file to `<name>.<unix_timestamp>` and prunes old backups.
    fn rotate_files(&self) -> io::Result<()> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let file_name = self
            .inner
            .file_path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Invalid file name"))?;
        let backup_path = self.inner.file_path.with_file_name(format!("{file_name}.{timestamp}"));

        if self.inner.file_path.exists() {
            fs::rename(&self.inner.file_path, &backup_path)?;
        }

        self.cleanup_old_backups(file_name)
    }

    fn cleanup_old_backups(&self, file_name: &str) -> io::Result<()> {
        let parent_dir = self
            .inner
            .file_path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?;
        let prefix = format!("{file_name}.");

        let mut backups: Vec<PathBuf> = fs::read_dir(parent_dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
            })
            .collect();

        // Timestamp suffixes sort chronologically; newest first.
        backups.sort_by(|a, b| b.cmp(a));

        for old_backup in backups.iter().skip(MAX_BACKUP_FILES) {
            let _ = fs::remove_file(old_backup);
        }

        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.file.lock().as_mut() {
            Some((file, _)) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("file_path", &self.inner.file_path)
            .finish_non_exhaustive()
    }
}
