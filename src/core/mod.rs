//! Core logger types and traits

pub mod environment;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod level;
pub mod logger;
pub mod manager;
pub mod metrics;
pub mod record;
pub mod retry;
pub mod timestamp;

pub use environment::{default_environment, Environment, HandlerCloser};
pub use error::{ConfigError, LoggerError, Result};
pub use filter::{Filter, Filterer, NameFilter};
pub use formatter::{BufferingFormatter, Formatter, StandardFormatter, DEFAULT_FORMAT};
pub use handler::{same_handler, Handler, HandlerCore};
pub use level::{
    is_enabled_for, level_by_name, level_name, lookup_level_name, register_level, LevelRegistry,
    LogLevel,
};
pub use logger::Logger;
pub use manager::{LoggerFactory, Manager};
pub use metrics::HandlerMetrics;
pub use record::{CallerInfo, LogRecord, MessageSource};
pub use retry::{
    BoundedExponentialBackoffRetry, ErrorRetry, ExhaustionMode, ExponentialBackoffRetry,
    NTimesRetry, OnceRetry, Retry, RetryablePredicate, SleepFn, UntilElapsedRetry,
    UNLIMITED_DEADLINE, UNLIMITED_DELAY, UNLIMITED_TRIES,
};
pub use timestamp::{TimestampFormat, DEFAULT_DATE_FORMAT};
