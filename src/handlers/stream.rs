//! Stream abstraction and the handler that writes formatted records to one

use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// A byte sink that knows its current offset
pub trait Stream: Send {
    /// Current offset, counting bytes still held in any write buffer
    fn tell(&mut self) -> Result<u64>;

    fn write(&mut self, text: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Process standard output
#[derive(Debug, Default)]
pub struct StdoutStream;

impl Stream for StdoutStream {
    fn tell(&mut self) -> Result<u64> {
        Err(LoggerError::other("stdout stream has no offset"))
    }

    fn write(&mut self, text: &str) -> Result<()> {
        std::io::stdout().lock().write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Process standard error
#[derive(Debug, Default)]
pub struct StderrStream;

impl Stream for StderrStream {
    fn tell(&mut self) -> Result<u64> {
        Err(LoggerError::other("stderr stream has no offset"))
    }

    fn write(&mut self, text: &str) -> Result<()> {
        std::io::stderr().lock().write_all(text.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stderr().flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each formatted record to a [`Stream`].
///
/// Closing flushes and closes the stream; the standard streams ignore the
/// close.
pub struct StreamHandler {
    core: HandlerCore,
    stream: Mutex<Box<dyn Stream>>,
}

impl StreamHandler {
    pub fn new(name: &str, level: LogLevel, stream: Box<dyn Stream>) -> Self {
        Self {
            core: HandlerCore::new(name, level),
            stream: Mutex::new(stream),
        }
    }

    /// Swap the underlying stream, returning the previous one unflushed
    pub fn set_stream(&self, stream: Box<dyn Stream>) -> Box<dyn Stream> {
        std::mem::replace(&mut *self.stream.lock(), stream)
    }
}

impl Handler for StreamHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let message = self.format(record);
        self.stream.lock().write(&message)
    }

    fn flush(&self) -> Result<()> {
        self.stream.lock().flush()
    }

    fn close(&self) {
        let mut stream = self.stream.lock();
        if let Err(e) = stream.flush().and_then(|()| stream.close()) {
            eprintln!("[LOGGER ERROR] Failed to close stream of '{}': {}", self.name(), e);
        }
    }
}

/// A [`StreamHandler`] over standard output
pub struct StdoutHandler {
    inner: StreamHandler,
}

impl StdoutHandler {
    pub fn new() -> Self {
        Self {
            inner: StreamHandler::new("stdout", LogLevel::NOTSET, Box::new(StdoutStream)),
        }
    }
}

impl Default for StdoutHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for StdoutHandler {
    fn core(&self) -> &HandlerCore {
        self.inner.core()
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        self.inner.emit(record)
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StandardFormatter;

    #[derive(Clone, Default)]
    struct SharedStream {
        data: Arc<Mutex<String>>,
        closed: Arc<Mutex<bool>>,
    }

    impl Stream for SharedStream {
        fn tell(&mut self) -> Result<u64> {
            Ok(self.data.lock().len() as u64)
        }

        fn write(&mut self, text: &str) -> Result<()> {
            self.data.lock().push_str(text);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            *self.closed.lock() = true;
            Ok(())
        }
    }

    #[test]
    fn test_stream_handler_writes_formatted_records() {
        let stream = SharedStream::default();
        let handler = StreamHandler::new("mem", LogLevel::NOTSET, Box::new(stream.clone()));
        handler.set_formatter(Arc::new(StandardFormatter::new("%(name)s|%(message)s")));

        handler.handle(&Arc::new(LogRecord::new("a", LogLevel::INFO, "one")));
        handler.handle(&Arc::new(LogRecord::new("b", LogLevel::INFO, "two")));

        assert_eq!(*stream.data.lock(), "a|one\nb|two\n");
        handler.close();
        assert!(*stream.closed.lock());
    }

    #[test]
    fn test_set_stream_swaps_target() {
        let first = SharedStream::default();
        let second = SharedStream::default();
        let handler = StreamHandler::new("mem", LogLevel::NOTSET, Box::new(first.clone()));

        handler.handle(&Arc::new(LogRecord::new("a", LogLevel::INFO, "x")));
        let _previous = handler.set_stream(Box::new(second.clone()));
        handler.handle(&Arc::new(LogRecord::new("a", LogLevel::INFO, "y")));

        assert_eq!(*first.data.lock(), "x\n");
        assert_eq!(*second.data.lock(), "y\n");
    }

    #[test]
    fn test_stdout_stream_has_no_offset() {
        assert!(StdoutStream.tell().is_err());
    }
}
