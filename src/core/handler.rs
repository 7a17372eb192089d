//! Handler contract and the shared dispatch helper every sink embeds

use super::{
    error::{LoggerError, Result},
    filter::{Filter, Filterer},
    formatter::{Formatter, StandardFormatter},
    level::LogLevel,
    metrics::HandlerMetrics,
    record::LogRecord,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// State shared by every handler: name, threshold, formatter, filters, and
/// the lock that serializes access to the sink.
pub struct HandlerCore {
    name: RwLock<String>,
    level: RwLock<LogLevel>,
    formatter: RwLock<Arc<dyn Formatter>>,
    filterer: Filterer,
    io: Mutex<()>,
    metrics: HandlerMetrics,
}

impl HandlerCore {
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: RwLock::new(name.into()),
            level: RwLock::new(level),
            formatter: RwLock::new(Arc::new(StandardFormatter::default())),
            filterer: Filterer::new(),
            io: Mutex::new(()),
            metrics: HandlerMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_formatter(self, formatter: Arc<dyn Formatter>) -> Self {
        *self.formatter.write() = formatter;
        self
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn set_name(&self, name: &str) {
        *self.name.write() = name.to_string();
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    /// Rejects levels without a registered name, leaving the old level
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        if !level.is_registered() {
            return Err(LoggerError::NoSuchLevel(level.value()));
        }
        *self.level.write() = level;
        Ok(())
    }

    pub fn formatter(&self) -> Arc<dyn Formatter> {
        Arc::clone(&self.formatter.read())
    }

    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.formatter.write() = formatter;
    }

    pub fn format(&self, record: &LogRecord) -> String {
        self.formatter().format(record)
    }

    pub fn filterer(&self) -> &Filterer {
        &self.filterer
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        &self.metrics
    }

    /// Filter, then emit under the sink lock; failures go to `handle_error`.
    ///
    /// Returns 0 when the record was dropped by a filter, 1 when an emit
    /// was attempted.
    pub fn handle<H: Handler + ?Sized>(&self, handler: &H, record: &Arc<LogRecord>) -> u32 {
        let rv = self.filterer.filter(record);
        if rv == 0 {
            self.metrics.record_filtered();
            return 0;
        }

        let outcome = {
            let _guard = self.io.lock();
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.emit(record)))
        };
        self.metrics.record_handled();

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.metrics.record_emit_error();
                eprintln!("[LOGGER ERROR] Handler '{}' failed: {}", self.name(), e);
                handler.handle_error(record, &e);
            }
            Err(panic_info) => {
                self.metrics.record_emit_error();
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Handler '{}' panicked: {}. \
                     Other handlers continue to function.",
                    self.name(),
                    panic_msg
                );
            }
        }
        rv
    }
}

/// A sink for log records.
///
/// Implementors provide `core` and `emit`; everything else has a default.
/// `handle` is what loggers call: it runs the handler's filters and then
/// `emit` under the handler's private lock, so one handler never sees two
/// emits at once.
pub trait Handler: Send + Sync {
    fn core(&self) -> &HandlerCore;

    /// Write one record to the sink
    fn emit(&self, record: &Arc<LogRecord>) -> Result<()>;

    fn handle(&self, record: &Arc<LogRecord>) -> u32 {
        self.core().handle(self, record)
    }

    /// Called after a failed emit, outside the sink lock
    fn handle_error(&self, _record: &Arc<LogRecord>, _error: &LoggerError) {}

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) {}

    fn name(&self) -> String {
        self.core().name()
    }

    fn level(&self) -> LogLevel {
        self.core().level()
    }

    fn set_level(&self, level: LogLevel) -> Result<()> {
        self.core().set_level(level)
    }

    fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        self.core().set_formatter(formatter);
    }

    fn format(&self, record: &LogRecord) -> String {
        self.core().format(record)
    }

    fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.core().filterer().add_filter(filter);
    }

    fn remove_filter(&self, filter: &Arc<dyn Filter>) {
        self.core().filterer().remove_filter(filter);
    }

    fn filter(&self, record: &LogRecord) -> u32 {
        self.core().filterer().filter(record)
    }

    fn metrics(&self) -> &HandlerMetrics {
        self.core().metrics()
    }
}

/// Identity comparison for shared handlers
pub fn same_handler(a: &Arc<dyn Handler>, b: &Arc<dyn Handler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::NameFilter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        core: HandlerCore,
        emits: AtomicUsize,
        errors: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new(fail: bool) -> Self {
            Self {
                core: HandlerCore::new("counting", LogLevel::NOTSET),
                emits: AtomicUsize::new(0),
                errors: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Handler for CountingHandler {
        fn core(&self) -> &HandlerCore {
            &self.core
        }

        fn emit(&self, _record: &Arc<LogRecord>) -> Result<()> {
            self.emits.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LoggerError::other("sink down"))
            } else {
                Ok(())
            }
        }

        fn handle_error(&self, _record: &Arc<LogRecord>, _error: &LoggerError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn record(name: &str) -> Arc<LogRecord> {
        Arc::new(LogRecord::new(name, LogLevel::INFO, "m"))
    }

    #[test]
    fn test_handle_votes_and_counts() {
        let handler = CountingHandler::new(false);
        handler.add_filter(Arc::new(NameFilter::new("app")));

        assert_eq!(handler.handle(&record("app.db")), 1);
        assert_eq!(handler.handle(&record("other")), 0);
        assert_eq!(handler.emits.load(Ordering::SeqCst), 1);
        assert_eq!(handler.metrics().handled(), 1);
        assert_eq!(handler.metrics().filtered(), 1);
    }

    #[test]
    fn test_emit_error_goes_to_hook() {
        let handler = CountingHandler::new(true);
        assert_eq!(handler.handle(&record("x")), 1);
        assert_eq!(handler.errors.load(Ordering::SeqCst), 1);
        assert_eq!(handler.metrics().emit_errors(), 1);
    }

    #[test]
    fn test_set_level_rejects_unregistered() {
        let handler = CountingHandler::new(false);
        handler.set_level(LogLevel::ERROR).unwrap();

        let err = handler.set_level(LogLevel(77)).unwrap_err();
        assert!(matches!(err, LoggerError::NoSuchLevel(77)));
        assert_eq!(handler.level(), LogLevel::ERROR);
    }

    #[test]
    fn test_formatter_is_replaceable() {
        let handler = CountingHandler::new(false);
        let rec = LogRecord::new("db", LogLevel::WARN, "slow");
        assert_eq!(handler.format(&rec), "slow\n");

        handler.set_formatter(Arc::new(StandardFormatter::new("%(levelname)s %(message)s")));
        assert_eq!(handler.format(&rec), "WARN slow\n");
    }

    #[test]
    fn test_same_handler_identity() {
        let a: Arc<dyn Handler> = Arc::new(CountingHandler::new(false));
        let b: Arc<dyn Handler> = Arc::new(CountingHandler::new(false));
        assert!(same_handler(&a, &Arc::clone(&a)));
        assert!(!same_handler(&a, &b));
    }
}
