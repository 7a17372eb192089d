//! Environments: a manager plus the registry of handlers to close
//!
//! Every environment is independent. The process-wide default one backs the
//! free functions at the bottom of this module.

use super::{
    handler::{same_handler, Handler},
    level::LogLevel,
    logger::Logger,
    manager::Manager,
};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock};

/// Tracks handlers so they can be flushed and closed exactly once
#[derive(Default)]
pub struct HandlerCloser {
    handlers: Mutex<Vec<Arc<dyn Handler>>>,
}

impl HandlerCloser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&self, handler: &Arc<dyn Handler>) {
        let mut handlers = self.handlers.lock();
        if !handlers.iter().any(|h| same_handler(h, handler)) {
            handlers.push(Arc::clone(handler));
        }
    }

    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) {
        self.handlers.lock().retain(|h| !same_handler(h, handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.lock().is_empty()
    }

    /// Flush every tracked handler, then close them newest first.
    ///
    /// The registry is emptied, so a second call does nothing.
    pub fn close_all(&self) {
        let handlers = std::mem::take(&mut *self.handlers.lock());
        for handler in &handlers {
            if let Err(e) = handler.flush() {
                eprintln!(
                    "[LOGGER ERROR] Failed to flush handler '{}' during shutdown: {}",
                    handler.name(),
                    e
                );
            }
        }
        for handler in handlers.iter().rev() {
            handler.close();
        }
    }
}

struct EnvState {
    manager: Arc<Manager>,
    closer: Arc<HandlerCloser>,
}

impl EnvState {
    fn new(root_level: LogLevel) -> Arc<Self> {
        let closer = Arc::new(HandlerCloser::new());
        Arc::new(Self {
            manager: Manager::with_closer(root_level, Arc::clone(&closer)),
            closer,
        })
    }
}

/// A self-contained logging setup: logger tree plus handler registry
///
/// # Example
///
/// ```
/// use rust_channel_logger::prelude::*;
/// use std::sync::Arc;
///
/// let env = Environment::new();
/// let memory = Arc::new(MemoryHandler::new(64));
/// env.root().add_handler(memory.clone());
///
/// env.get_logger("app.db").error("connection lost");
/// assert_eq!(memory.records()[0].message(), "connection lost");
/// env.shutdown();
/// ```
pub struct Environment {
    root_level: LogLevel,
    state: RwLock<Arc<EnvState>>,
}

impl Environment {
    /// Root at WARN
    pub fn new() -> Self {
        Self::with_root_level(LogLevel::WARN)
    }

    pub fn with_root_level(root_level: LogLevel) -> Self {
        Self {
            root_level,
            state: RwLock::new(EnvState::new(root_level)),
        }
    }

    pub fn manager(&self) -> Arc<Manager> {
        Arc::clone(&self.state.read().manager)
    }

    pub fn closer(&self) -> Arc<HandlerCloser> {
        Arc::clone(&self.state.read().closer)
    }

    pub fn root(&self) -> Arc<Logger> {
        self.manager().root()
    }

    /// `""` returns the root
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        self.manager().get_logger(name)
    }

    /// Track a handler that is not attached to any logger yet
    pub fn track_handler(&self, handler: &Arc<dyn Handler>) {
        self.closer().add_handler(handler);
    }

    /// Close every tracked handler and start over with a fresh root,
    /// manager and closer. Loggers obtained earlier keep working but are
    /// detached from the new tree.
    pub fn shutdown(&self) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, EnvState::new(self.root_level))
        };
        previous.closer.close_all();
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide environment used by the free functions
pub fn default_environment() -> &'static Environment {
    static DEFAULT: OnceLock<Environment> = OnceLock::new();
    DEFAULT.get_or_init(Environment::new)
}

/// Logger for `name` in the default environment; `""` is the root
pub fn get_logger(name: &str) -> Arc<Logger> {
    default_environment().get_logger(name)
}

pub fn root() -> Arc<Logger> {
    default_environment().root()
}

/// Close all handlers of the default environment and reset it
pub fn shutdown() {
    default_environment().shutdown();
}

#[track_caller]
pub fn log(level: LogLevel, message: impl Into<String>) {
    root().log(level, message);
}

#[track_caller]
pub fn trace(message: impl Into<String>) {
    root().trace(message);
}

#[track_caller]
pub fn debug(message: impl Into<String>) {
    root().debug(message);
}

#[track_caller]
pub fn info(message: impl Into<String>) {
    root().info(message);
}

#[track_caller]
pub fn warn(message: impl Into<String>) {
    root().warn(message);
}

#[track_caller]
pub fn error(message: impl Into<String>) {
    root().error(message);
}

#[track_caller]
pub fn fatal(message: impl Into<String>) {
    root().fatal(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::MemoryHandler;

    #[test]
    fn test_add_handler_registers_with_closer() {
        let env = Environment::new();
        let handler: Arc<dyn Handler> = Arc::new(MemoryHandler::new(8));
        env.get_logger("a").add_handler(Arc::clone(&handler));
        env.get_logger("b").add_handler(Arc::clone(&handler));
        assert_eq!(env.closer().len(), 1);
    }

    #[test]
    fn test_shutdown_resets_state() {
        let env = Environment::new();
        let before = env.get_logger("svc");
        before.set_level(LogLevel::DEBUG).unwrap();
        env.root().add_handler(Arc::new(MemoryHandler::new(8)));

        env.shutdown();

        let after = env.get_logger("svc");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.level(), LogLevel::NOTSET);
        assert!(env.root().handlers().is_empty());
        assert!(env.closer().is_empty());
        assert_eq!(env.root().level(), LogLevel::WARN);

        // old loggers must not crash
        before.info("still fine");
    }

    #[test]
    fn test_close_all_runs_once() {
        let closer = HandlerCloser::new();
        let handler: Arc<dyn Handler> = Arc::new(MemoryHandler::new(8));
        closer.add_handler(&handler);
        closer.add_handler(&handler);
        assert_eq!(closer.len(), 1);

        closer.close_all();
        assert!(closer.is_empty());
        closer.close_all();
    }
}
