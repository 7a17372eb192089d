//! # Rust Channel Logger
//!
//! A hierarchical logging runtime: applications obtain named channel
//! loggers, attach handlers, and emit records that propagate up a
//! dot-separated namespace tree to the handlers of every ancestor.
//!
//! ## Features
//!
//! - **Logger hierarchy**: loggers may be created in any order; missing
//!   ancestors are filled in and re-parented when they appear
//! - **Pluggable handlers**: stream, console, file, size and time rotation,
//!   in-memory buffering, asynchronous queue, TCP socket
//! - **Retry combinators**: fixed, exponential and jittered backoff used by
//!   network handlers to reconnect
//! - **Declarative configuration**: JSON documents wired through a handler
//!   registry
//! - **Isolated environments**: every [`Environment`](core::Environment) owns
//!   its own tree and shuts its handlers down exactly once
//!
//! ## Example
//!
//! ```
//! use rust_channel_logger::prelude::*;
//! use std::sync::Arc;
//!
//! let env = Environment::new();
//! let memory = Arc::new(MemoryHandler::new(100));
//! env.root().add_handler(memory.clone());
//!
//! let db = env.get_logger("app.db");
//! db.set_level(LogLevel::DEBUG).unwrap();
//! db.debug("connected");
//!
//! assert_eq!(memory.records()[0].name, "app.db");
//! env.shutdown();
//! ```

pub mod config;
pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::handlers::ConsoleHandler;
    #[cfg(feature = "network")]
    pub use crate::handlers::SocketHandler;

    pub use crate::config::{Config, HandlerRegistry};
    pub use crate::core::{
        BufferingFormatter, CallerInfo, ConfigError, Environment, ErrorRetry, Filter, Formatter,
        Handler, HandlerCore, HandlerMetrics, LogLevel, LogRecord, Logger, LoggerError, Manager,
        NameFilter, Result, Retry, StandardFormatter, TimestampFormat,
    };
    pub use crate::handlers::{
        FileHandler, FileMode, MemoryHandler, NullHandler, QueueHandler, RotatingFileHandler,
        RotatingHandler, StdoutHandler, StreamHandler, TimedRotatingFileHandler,
    };
}

pub use crate::core::environment::{
    debug, error, fatal, get_logger, info, log, root, shutdown, trace, warn,
};
pub use crate::core::{Environment, Handler, LogLevel, LogRecord, Logger, LoggerError, Result};
