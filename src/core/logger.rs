//! Named channel loggers and the dispatch walk up the hierarchy

use super::{
    error::{LoggerError, Result},
    filter::{Filter, Filterer},
    handler::{same_handler, Handler},
    level::{is_enabled_for, LogLevel},
    manager::Manager,
    record::{CallerInfo, LogRecord, MessageSource},
};
use parking_lot::RwLock;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Weak};

struct LoggerState {
    level: LogLevel,
    propagate: bool,
    parent: Option<Weak<Logger>>,
    handlers: Vec<Arc<dyn Handler>>,
    manager: Weak<Manager>,
}

/// A logging channel.
///
/// Loggers are created and owned by a [`Manager`]; parents and the manager
/// are held weakly. Each logger guards its own fields with its own lock and
/// dispatch never holds more than one logger lock at a time.
pub struct Logger {
    name: String,
    state: RwLock<LoggerState>,
    filterer: Filterer,
}

impl Logger {
    /// A detached logger; it joins a hierarchy when a manager registers it
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(LoggerState {
                level,
                propagate: true,
                parent: None,
                handlers: Vec::new(),
                manager: Weak::new(),
            }),
            filterer: Filterer::new(),
        }
    }

    /// Give the logger the name it is registered under
    pub(crate) fn renamed(mut self, name: &str) -> Self {
        if self.name != name {
            eprintln!(
                "[LOGGER WARN] Logger factory returned '{}' for '{}'; using the requested name",
                self.name, name
            );
            self.name = name.to_string();
        }
        self
    }

    #[must_use]
    pub fn with_propagate(self, propagate: bool) -> Self {
        self.state.write().propagate = propagate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        self.state.read().level
    }

    /// Rejects levels without a registered name, leaving the old level
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        if !level.is_registered() {
            return Err(LoggerError::NoSuchLevel(level.value()));
        }
        self.state.write().level = level;
        Ok(())
    }

    pub fn propagate(&self) -> bool {
        self.state.read().propagate
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.state.write().propagate = propagate;
    }

    pub fn parent(&self) -> Option<Arc<Logger>> {
        self.state.read().parent.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: &Arc<Logger>) {
        self.state.write().parent = Some(Arc::downgrade(parent));
    }

    pub fn manager(&self) -> Option<Arc<Manager>> {
        self.state.read().manager.upgrade()
    }

    pub(crate) fn set_manager(&self, manager: Weak<Manager>) {
        self.state.write().manager = manager;
    }

    /// First level other than NOTSET on the way up to the root
    pub fn effective_level(&self) -> LogLevel {
        let level = self.level();
        if !level.is_notset() {
            return level;
        }
        let mut current = self.parent();
        while let Some(logger) = current {
            let level = logger.level();
            if !level.is_notset() {
                return level;
            }
            current = logger.parent();
        }
        LogLevel::NOTSET
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        is_enabled_for(self.effective_level(), level)
    }

    /// Attach a handler; it is also tracked for shutdown by the manager's
    /// closer. Adding the same handler twice is a no-op.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        {
            let mut state = self.state.write();
            if state.handlers.iter().any(|h| same_handler(h, &handler)) {
                return;
            }
            state.handlers.push(Arc::clone(&handler));
        }
        if let Some(manager) = self.manager() {
            manager.closer().add_handler(&handler);
        }
    }

    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) {
        self.state.write().handlers.retain(|h| !same_handler(h, handler));
    }

    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.state.read().handlers.clone()
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filterer.add_filter(filter);
    }

    pub fn remove_filter(&self, filter: &Arc<dyn Filter>) {
        self.filterer.remove_filter(filter);
    }

    pub fn filter(&self, record: &LogRecord) -> u32 {
        self.filterer.filter(record)
    }

    /// The logger named `<self>.<suffix>` from the same manager
    ///
    /// `None` once the owning manager has been dropped.
    pub fn get_child(&self, suffix: &str) -> Option<Arc<Logger>> {
        let manager = self.manager()?;
        if self.name.is_empty() {
            Some(manager.get_logger(suffix))
        } else {
            Some(manager.get_logger(&format!("{}.{}", self.name, suffix)))
        }
    }

    /// Call every handler of this logger whose level the record meets
    pub fn call_handlers(&self, record: &Arc<LogRecord>) {
        let handlers = self.handlers();
        for handler in handlers {
            if record.level >= handler.level() {
                handler.handle(record);
            }
        }
    }

    /// Run this logger's filters, then its handlers and those of every
    /// ancestor until a logger with `propagate == false` or the root.
    pub fn handle(&self, record: Arc<LogRecord>) {
        if self.filter(&record) == 0 {
            return;
        }
        self.call_handlers(&record);
        if !self.propagate() {
            return;
        }
        let mut current = self.parent();
        while let Some(logger) = current {
            logger.call_handlers(&record);
            current = if logger.propagate() {
                logger.parent()
            } else {
                None
            };
        }
    }

    fn do_log(&self, level: LogLevel, source: MessageSource, caller: CallerInfo) {
        let record = LogRecord::with_source(self.name.as_str(), level, source).with_caller(caller);
        self.handle(Arc::new(record));
    }

    /// Entry point for the logging macros, which supply their own caller site
    pub fn log_with_caller(&self, level: LogLevel, message: String, caller: CallerInfo) {
        if self.is_enabled_for(level) {
            self.do_log(level, MessageSource::Text(message), caller);
        }
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if self.is_enabled_for(level) {
            let caller = CallerInfo::from_location(Location::caller());
            self.do_log(level, MessageSource::Text(message.into()), caller);
        }
    }

    /// Log a message that is only rendered if some handler formats it
    #[track_caller]
    pub fn log_lazy<F>(&self, level: LogLevel, render: F)
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        if self.is_enabled_for(level) {
            let caller = CallerInfo::from_location(Location::caller());
            self.do_log(level, MessageSource::Deferred(Box::new(render)), caller);
        }
    }

    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::TRACE, message);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::DEBUG, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::INFO, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::WARN, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::ERROR, message);
    }

    /// Logs at FATAL; does not terminate the process
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::FATAL, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &state.level)
            .field("propagate", &state.propagate)
            .field("handlers", &state.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::MemoryHandler;

    #[test]
    fn test_detached_logger_defaults() {
        let logger = Logger::new("app", LogLevel::NOTSET);
        assert_eq!(logger.name(), "app");
        assert!(logger.propagate());
        assert!(logger.parent().is_none());
        assert!(logger.manager().is_none());
        assert_eq!(logger.effective_level(), LogLevel::NOTSET);
        assert!(logger.get_child("x").is_none());
    }

    #[test]
    fn test_notset_everywhere_enables_everything() {
        let logger = Logger::new("app", LogLevel::NOTSET);
        for value in [0u8, 1, 5, 20, 255] {
            assert!(logger.is_enabled_for(LogLevel(value)));
        }
    }

    #[test]
    fn test_set_level_rejects_unregistered() {
        let logger = Logger::new("app", LogLevel::INFO);
        assert!(matches!(
            logger.set_level(LogLevel(201)),
            Err(LoggerError::NoSuchLevel(201))
        ));
        assert_eq!(logger.level(), LogLevel::INFO);
    }

    #[test]
    fn test_handlers_are_a_set() {
        let logger = Logger::new("app", LogLevel::INFO);
        let handler: Arc<dyn Handler> = Arc::new(MemoryHandler::new(16));
        logger.add_handler(Arc::clone(&handler));
        logger.add_handler(Arc::clone(&handler));
        assert_eq!(logger.handlers().len(), 1);

        logger.remove_handler(&handler);
        logger.remove_handler(&handler);
        assert!(logger.handlers().is_empty());
    }

    #[test]
    fn test_level_gating_and_caller_site() {
        let logger = Logger::new("app", LogLevel::INFO);
        let memory = Arc::new(MemoryHandler::new(16));
        logger.add_handler(memory.clone());

        logger.debug("hidden");
        logger.info("shown");

        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message(), "shown");
        assert_eq!(records[0].caller.file_name, "logger.rs");
    }

    #[test]
    fn test_lazy_message_not_rendered_when_disabled() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let logger = Logger::new("app", LogLevel::ERROR);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        logger.log_lazy(LogLevel::INFO, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "expensive".to_string()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
