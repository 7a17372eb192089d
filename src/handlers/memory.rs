//! In-memory buffering handler

use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Buffers records and hands them to a target handler in batches.
///
/// The buffer is flushed when it holds `capacity` records or when a record
/// at or above the flush level arrives. Without a target, flushing keeps the
/// records, which makes the handler useful for inspecting output in tests.
/// Closing flushes and then empties the buffer.
///
/// # Example
///
/// ```
/// use rust_channel_logger::prelude::*;
/// use std::sync::Arc;
///
/// let target = Arc::new(MemoryHandler::new(100));
/// let buffered = MemoryHandler::new(10).with_target(target.clone());
///
/// buffered.handle(&Arc::new(LogRecord::new("app", LogLevel::INFO, "queued")));
/// assert_eq!(buffered.records().len(), 1);
///
/// buffered.handle(&Arc::new(LogRecord::new("app", LogLevel::ERROR, "boom")));
/// assert!(buffered.records().is_empty());
/// assert_eq!(target.records().len(), 2);
/// ```
pub struct MemoryHandler {
    core: HandlerCore,
    capacity: usize,
    flush_level: LogLevel,
    buffer: Mutex<Vec<Arc<LogRecord>>>,
    target: RwLock<Option<Arc<dyn Handler>>>,
}

impl MemoryHandler {
    /// Flush level ERROR, no target
    pub fn new(capacity: usize) -> Self {
        Self {
            core: HandlerCore::new("memory", LogLevel::NOTSET),
            capacity,
            flush_level: LogLevel::ERROR,
            buffer: Mutex::new(Vec::with_capacity(capacity)),
            target: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn with_flush_level(mut self, level: LogLevel) -> Self {
        self.flush_level = level;
        self
    }

    #[must_use]
    pub fn with_target(self, target: Arc<dyn Handler>) -> Self {
        *self.target.write() = Some(target);
        self
    }

    pub fn set_target(&self, target: Option<Arc<dyn Handler>>) {
        *self.target.write() = target;
    }

    pub fn target(&self) -> Option<Arc<dyn Handler>> {
        self.target.read().clone()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn flush_level(&self) -> LogLevel {
        self.flush_level
    }

    /// Records currently buffered
    pub fn records(&self) -> Vec<Arc<LogRecord>> {
        self.buffer.lock().clone()
    }

    pub fn should_flush(&self, record: &LogRecord) -> bool {
        self.buffer.lock().len() >= self.capacity || record.level >= self.flush_level
    }

    /// Drop every buffered record without forwarding it
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Handler for MemoryHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        self.buffer.lock().push(Arc::clone(record));
        if self.should_flush(record) {
            self.flush()?;
        }
        Ok(())
    }

    /// Forward the buffered records to the target, outside the buffer lock
    fn flush(&self) -> Result<()> {
        let Some(target) = self.target() else {
            return Ok(());
        };
        let records = std::mem::take(&mut *self.buffer.lock());
        for record in &records {
            target.handle(record);
        }
        Ok(())
    }

    fn close(&self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush '{}' on close: {}", self.name(), e);
        }
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: LogLevel, message: &str) -> Arc<LogRecord> {
        Arc::new(LogRecord::new("mem", level, message))
    }

    #[test]
    fn test_flush_on_capacity() {
        let target = Arc::new(MemoryHandler::new(100));
        let handler = MemoryHandler::new(3).with_target(target.clone());

        handler.handle(&record(LogLevel::INFO, "a"));
        handler.handle(&record(LogLevel::INFO, "b"));
        assert!(target.records().is_empty());

        handler.handle(&record(LogLevel::INFO, "c"));
        let forwarded: Vec<String> = target.records().iter().map(|r| r.message().to_string()).collect();
        assert_eq!(forwarded, vec!["a", "b", "c"]);
        assert!(handler.records().is_empty());
    }

    #[test]
    fn test_flush_on_level() {
        let target = Arc::new(MemoryHandler::new(100));
        let handler = MemoryHandler::new(100)
            .with_flush_level(LogLevel::WARN)
            .with_target(target.clone());

        handler.handle(&record(LogLevel::INFO, "quiet"));
        assert!(target.records().is_empty());
        handler.handle(&record(LogLevel::WARN, "loud"));
        assert_eq!(target.records().len(), 2);
    }

    #[test]
    fn test_without_target_records_are_kept() {
        let handler = MemoryHandler::new(1);
        handler.handle(&record(LogLevel::FATAL, "x"));
        handler.handle(&record(LogLevel::FATAL, "y"));
        handler.flush().unwrap();
        assert_eq!(handler.records().len(), 2);
    }

    #[test]
    fn test_close_flushes_and_empties_buffer() {
        let target = Arc::new(MemoryHandler::new(100));
        let handler = MemoryHandler::new(100).with_target(target.clone());
        handler.handle(&record(LogLevel::INFO, "pending"));

        handler.close();
        assert_eq!(target.records().len(), 1);
        assert!(handler.records().is_empty());

        let orphan = MemoryHandler::new(100);
        orphan.handle(&record(LogLevel::INFO, "lost"));
        orphan.close();
        assert!(orphan.records().is_empty());
    }

    #[test]
    fn test_forwarding_respects_target_filters() {
        let target = Arc::new(MemoryHandler::new(100));
        target.add_filter(Arc::new(crate::core::NameFilter::new("keep")));
        let handler = MemoryHandler::new(1).with_target(target.clone());

        handler.handle(&Arc::new(LogRecord::new("keep.me", LogLevel::INFO, "1")));
        handler.handle(&Arc::new(LogRecord::new("drop", LogLevel::INFO, "2")));
        assert_eq!(target.records().len(), 1);
    }
}
