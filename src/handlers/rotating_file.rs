//! Size-triggered rotation and the rollover plumbing shared with the timed
//! variant

use super::file::{FileMode, FileStream, FileTarget};
use super::stream::Stream;
use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file handler that archives its file when a trigger fires
pub trait RotatingHandler: Handler {
    /// Whether writing `record` would trigger a rollover, together with the
    /// formatted text that would be written
    fn should_rollover(&self, record: &LogRecord) -> Result<(bool, String)>;

    /// Archive the active file and reopen a fresh one at the same path
    fn do_rollover(&self) -> Result<()>;
}

/// Rollover steps run while the caller holds the file lock
pub(crate) trait Rollover {
    fn target(&self) -> &FileTarget;

    fn is_due(&self, stream: &mut FileStream, message: &str) -> Result<bool>;

    /// Archive the file; the stream has already been flushed and closed
    fn archive(&self) -> Result<()>;
}

/// Close, archive, reopen. The reopen runs even when archiving failed so
/// the handler keeps a usable file.
pub(crate) fn rollover_locked<R: Rollover + ?Sized>(
    rollover: &R,
    slot: &mut Option<FileStream>,
) -> Result<()> {
    let closed = match slot.take() {
        Some(mut stream) => stream.close(),
        None => Ok(()),
    };
    let archived = closed.and_then(|()| rollover.archive());
    *slot = Some(rollover.target().open_stream()?);
    archived
}

/// Check the trigger and write, all under one acquisition of the file lock
pub(crate) fn rollover_emit<R: Rollover + ?Sized>(rollover: &R, message: &str) -> Result<()> {
    let target = rollover.target();
    let mut slot = target.lock();
    let stream = slot.as_mut().ok_or_else(|| target.closed_error())?;
    if rollover.is_due(stream, message)? {
        rollover_locked(rollover, &mut *slot)?;
    }
    slot.as_mut()
        .ok_or_else(|| target.closed_error())?
        .write(message)
}

/// Rename `source` to `dest`, replacing an existing `dest`
pub(crate) fn rotate_file(source: &Path, dest: &Path) -> Result<()> {
    if !source.exists() {
        return Ok(());
    }
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| {
            LoggerError::file_rotation(dest.display().to_string(), format!("Failed to remove: {}", e))
        })?;
    }
    fs::rename(source, dest).map_err(|e| {
        LoggerError::file_rotation(
            source.display().to_string(),
            format!("Failed to rename to '{}': {}", dest.display(), e),
        )
    })
}

/// `<path>.<suffix>`
pub(crate) fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Rotates its file once it would grow past `max_bytes`.
///
/// Backups are numbered: the newest is `<path>.1`, the oldest kept is
/// `<path>.<backup_count>`. A `max_bytes` of 0 never rotates.
///
/// With `backup_count == 0` nothing is renamed; the file is simply reopened
/// with the handler's [`FileMode`]. In `Append` mode it keeps growing past
/// `max_bytes`; in `Truncate` mode its content is discarded on every
/// rollover and on every process restart.
///
/// # Example
///
/// ```no_run
/// use rust_channel_logger::handlers::{FileMode, RotatingFileHandler};
///
/// // 10 MB per file, keep 5 backups
/// let handler =
///     RotatingFileHandler::new("/var/log/app.log", FileMode::Append, 10 * 1024 * 1024, 5)
///         .unwrap();
/// ```
pub struct RotatingFileHandler {
    core: HandlerCore,
    target: FileTarget,
    max_bytes: u64,
    backup_count: u32,
}

impl RotatingFileHandler {
    pub fn new(
        path: impl AsRef<Path>,
        mode: FileMode,
        max_bytes: u64,
        backup_count: u32,
    ) -> Result<Self> {
        Self::with_buffer(path, mode, 0, max_bytes, backup_count)
    }

    pub fn with_buffer(
        path: impl AsRef<Path>,
        mode: FileMode,
        buffer_size: usize,
        max_bytes: u64,
        backup_count: u32,
    ) -> Result<Self> {
        let target = FileTarget::open(path.as_ref(), mode, buffer_size)?;
        Ok(Self {
            core: HandlerCore::new(target.path().display().to_string(), LogLevel::NOTSET),
            target,
            max_bytes,
            backup_count,
        })
    }

    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> u32 {
        self.backup_count
    }
}

impl Rollover for RotatingFileHandler {
    fn target(&self) -> &FileTarget {
        &self.target
    }

    fn is_due(&self, stream: &mut FileStream, message: &str) -> Result<bool> {
        if self.max_bytes == 0 {
            return Ok(false);
        }
        Ok(stream.tell()? + message.len() as u64 > self.max_bytes)
    }

    fn archive(&self) -> Result<()> {
        if self.backup_count == 0 {
            return Ok(());
        }
        let path = self.target.path();
        for i in (1..self.backup_count).rev() {
            rotate_file(
                &backup_path(path, &i.to_string()),
                &backup_path(path, &(i + 1).to_string()),
            )?;
        }
        rotate_file(path, &backup_path(path, "1"))
    }
}

impl RotatingHandler for RotatingFileHandler {
    fn should_rollover(&self, record: &LogRecord) -> Result<(bool, String)> {
        let message = self.format(record);
        let mut slot = self.target.lock();
        let stream = slot.as_mut().ok_or_else(|| self.target.closed_error())?;
        let due = self.is_due(stream, &message)?;
        Ok((due, message))
    }

    fn do_rollover(&self) -> Result<()> {
        let mut slot = self.target.lock();
        rollover_locked(self, &mut *slot)
    }
}

impl Handler for RotatingFileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let message = self.format(record);
        rollover_emit(self, &message)
    }

    fn flush(&self) -> Result<()> {
        self.target.flush()
    }

    fn close(&self) {
        if let Err(e) = self.target.close() {
            eprintln!("[LOGGER ERROR] Failed to close '{}': {}", self.path().display(), e);
        }
    }
}
