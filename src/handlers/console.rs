//! Colored terminal handler

use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, Result, StandardFormatter};
use std::io::Write;
use std::sync::Arc;

const DEFAULT_CONSOLE_FORMAT: &str = "[%(asctime)s] [%(levelname)s] %(name)s - %(message)s";

/// Writes to the terminal with the level name colored by severity.
///
/// ERROR and above go to stderr, everything else to stdout.
pub struct ConsoleHandler {
    core: HandlerCore,
    use_colors: bool,
}

impl ConsoleHandler {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            core: HandlerCore::new("console", LogLevel::NOTSET)
                .with_formatter(Arc::new(StandardFormatter::new(DEFAULT_CONSOLE_FORMAT))),
            use_colors,
        }
    }

    /// Only the `%(levelname)s` segment is colored, wherever it sits
    fn render(&self, record: &LogRecord) -> String {
        if self.use_colors {
            self.core.formatter().format_colored(record)
        } else {
            self.format(record)
        }
    }
}

impl Default for ConsoleHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ConsoleHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let line = self.render(record);

        // Route Error and Fatal levels to stderr, others to stdout
        if record.level >= LogLevel::ERROR {
            std::io::stderr().lock().write_all(line.as_bytes())?;
        } else {
            std::io::stdout().lock().write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}
