//! A handler that discards everything

use crate::core::{HandlerCore, Handler, LogLevel, LogRecord, Result};
use std::sync::Arc;

/// Drops every record.
///
/// Attach it to a library's top-level logger so the library logs nowhere
/// unless the application configures handlers of its own.
pub struct NullHandler {
    core: HandlerCore,
}

impl NullHandler {
    pub fn new() -> Self {
        Self {
            core: HandlerCore::new("null", LogLevel::NOTSET),
        }
    }
}

impl Default for NullHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for NullHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, _record: &Arc<LogRecord>) -> Result<()> {
        Ok(())
    }

    fn handle(&self, _record: &Arc<LogRecord>) -> u32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handler_votes_zero() {
        let handler = NullHandler::new();
        let record = Arc::new(LogRecord::new("x", LogLevel::FATAL, "gone"));
        assert_eq!(handler.handle(&record), 0);
        assert_eq!(handler.metrics().handled(), 0);
    }
}
