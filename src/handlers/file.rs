//! File handler and the offset-tracking file stream it writes through

use super::stream::Stream;
use crate::core::{ConfigError, Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result};
use parking_lot::{Mutex, MutexGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// How an existing log file is treated when (re)opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Keep existing content and write after it
    #[default]
    Append,
    /// Discard existing content
    Truncate,
}

impl FromStr for FileMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "append" | "a" | "O_APPEND" => Ok(FileMode::Append),
            "truncate" | "w" | "O_TRUNC" => Ok(FileMode::Truncate),
            other => Err(ConfigError::UnknownFileMode(other.to_string())),
        }
    }
}

/// A file behind an optional write buffer.
///
/// The offset starts at the file's length when opened and grows with every
/// accepted write, buffered or not.
pub struct FileStream {
    writer: Option<BufWriter<File>>,
    offset: u64,
}

impl FileStream {
    pub fn new(file: File, buffer_size: usize) -> Result<Self> {
        let offset = file.metadata()?.len();
        Ok(Self {
            writer: Some(BufWriter::with_capacity(buffer_size, file)),
            offset,
        })
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("file stream is closed"))
    }
}

impl Stream for FileStream {
    fn tell(&mut self) -> Result<u64> {
        Ok(self.offset)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.writer()?.write_all(text.as_bytes())?;
        self.offset += text.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileStream {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.close();
    }
}

/// The open file shared by the plain and the rotating file handlers
pub(crate) struct FileTarget {
    path: PathBuf,
    mode: FileMode,
    buffer_size: usize,
    stream: Mutex<Option<FileStream>>,
}

impl FileTarget {
    pub(crate) fn open(path: &Path, mode: FileMode, buffer_size: usize) -> Result<Self> {
        // Keep the absolute path so a later change of working directory
        // does not redirect the output
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let target = Self {
            path,
            mode,
            buffer_size,
            stream: Mutex::new(None),
        };
        let stream = target.open_stream()?;
        *target.stream.lock() = Some(stream);
        Ok(target)
    }

    /// Open the file at the canonical path, creating missing directories
    pub(crate) fn open_stream(&self) -> Result<FileStream> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        match self.mode {
            FileMode::Append => options.append(true),
            FileMode::Truncate => options.write(true).truncate(true),
        };
        let file = options.open(&self.path).map_err(|e| {
            LoggerError::file_handler(self.path.display().to_string(), format!("Failed to open: {}", e))
        })?;
        FileStream::new(file, self.buffer_size)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn mode(&self) -> FileMode {
        self.mode
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<FileStream>> {
        self.stream.lock()
    }

    pub(crate) fn closed_error(&self) -> LoggerError {
        LoggerError::HandlerClosed(self.path.display().to_string())
    }

    pub(crate) fn write(&self, text: &str) -> Result<()> {
        let mut slot = self.lock();
        let stream = slot.as_mut().ok_or_else(|| self.closed_error())?;
        stream.write(text)
    }

    pub(crate) fn tell(&self) -> Result<u64> {
        let mut slot = self.lock();
        let stream = slot.as_mut().ok_or_else(|| self.closed_error())?;
        stream.tell()
    }

    pub(crate) fn flush(&self) -> Result<()> {
        match self.lock().as_mut() {
            Some(stream) => stream.flush(),
            None => Ok(()),
        }
    }

    /// Flush and drop the stream; closing twice is harmless
    pub(crate) fn close(&self) -> Result<()> {
        match self.lock().take() {
            Some(mut stream) => stream.close(),
            None => Ok(()),
        }
    }
}

/// Writes formatted records to a file.
///
/// # Example
///
/// ```no_run
/// use rust_channel_logger::handlers::{FileHandler, FileMode};
///
/// let handler = FileHandler::with_options("/var/log/app.log", FileMode::Append, 8192).unwrap();
/// ```
pub struct FileHandler {
    core: HandlerCore,
    target: FileTarget,
}

impl FileHandler {
    /// Append mode, unbuffered
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(path, FileMode::Append, 0)
    }

    /// `buffer_size` bytes are held in memory before reaching the file;
    /// 0 writes through
    pub fn with_options(path: impl AsRef<Path>, mode: FileMode, buffer_size: usize) -> Result<Self> {
        let target = FileTarget::open(path.as_ref(), mode, buffer_size)?;
        Ok(Self {
            core: HandlerCore::new(target.path().display().to_string(), LogLevel::NOTSET),
            target,
        })
    }

    /// Absolute path of the log file
    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn mode(&self) -> FileMode {
        self.target.mode()
    }

    /// Bytes written so far, including buffered ones
    pub fn offset(&self) -> Result<u64> {
        self.target.tell()
    }
}

impl Handler for FileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let message = self.format(record);
        self.target.write(&message)
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
