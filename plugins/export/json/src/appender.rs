use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use history_api::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    #[error("cannot open '{}': {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },

    #[error("cannot lock '{}': {source}", path.display())]
    Lock { path: PathBuf, source: std::io::Error },

    #[error("cannot write to '{}': {source}", path.display())]
    Write { path: PathBuf, source: std::io::Error },

    #[error("cannot flush '{}': {source}", path.display())]
    Flush { path: PathBuf, source: std::io::Error },

    #[error("cannot unlock '{}': {source}", path.display())]
    Unlock { path: PathBuf, source: std::io::Error },
}

impl AppendError {
    /// Open failures disable the exporter for the rest of the process.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, AppendError::Open { .. })
    }
}

impl From<AppendError> for ExportError {
    fn from(e: AppendError) -> Self {
        ExportError::io(e.to_string())
    }
}

// ════════════════════════════════════════════════════════════════
//  LockedAppender
// ════════════════════════════════════════════════════════════════

/// Append-only writer holding an exclusive advisory lock on its file.
///
/// `open` = open for append + `flock(LOCK_EX)`; `finish` = flush + unlock +
/// close. Dropping without `finish` releases the same way, so the lock is
/// never left behind on an early return.
pub struct LockedAppender {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: usize,
}

impl LockedAppender {
    /// Blocks until the lock is granted. There is no timeout.
    pub fn open(path: &Path) -> Result<Self, AppendError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AppendError::Open { path: path.to_path_buf(), source })?;

        // On failure `file` is dropped here, which closes it.
        flock(&file, libc::LOCK_EX)
            .map_err(|source| AppendError::Lock { path: path.to_path_buf(), source })?;

        tracing::trace!(path = %path.display(), "lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    /// Append `line` plus a single `\n`.
    pub fn append_line(&mut self, line: &str) -> Result<(), AppendError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|source| AppendError::Write { path: self.path.clone(), source })?;
        self.lines += 1;
        Ok(())
    }

    /// Flush, unlock and close. Returns the number of lines appended.
    ///
    /// A flush failure does not skip the unlock; it is reported after the
    /// lock has been released.
    pub fn finish(mut self) -> Result<usize, AppendError> {
        self.release().map(|()| self.lines)
    }

    fn release(&mut self) -> Result<(), AppendError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        let flushed = writer
            .flush()
            .map_err(|source| AppendError::Flush { path: self.path.clone(), source });
        // Drop whatever could not be flushed rather than letting BufWriter
        // retry the write after the lock is gone.
        let (file, _unflushed) = writer.into_parts();

        let unlocked = flock(&file, libc::LOCK_UN)
            .map_err(|source| AppendError::Unlock { path: self.path.clone(), source });
        drop(file);

        flushed.and(unlocked)
    }
}

impl Drop for LockedAppender {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "releasing history file");
        }
    }
}

/// `flock(2)`, retried when interrupted by a signal.
fn flock(file: &File, op: libc::c_int) -> std::io::Result<()> {
    loop {
        // SAFETY: the descriptor is owned by `file` and open for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
