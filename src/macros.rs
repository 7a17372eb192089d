//! Logging macros for ergonomic log message formatting.
//!
//! The message is only formatted when the logger is enabled for the level,
//! and the caller site comes from `file!`, `line!` and `module_path!`.
//!
//! # Examples
//!
//! ```
//! use rust_channel_logger::prelude::*;
//! use rust_channel_logger::info;
//!
//! let env = Environment::new();
//! let logger = env.get_logger("server");
//! logger.set_level(LogLevel::INFO).unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_channel_logger::prelude::*;
/// # let env = Environment::new();
/// # let logger = env.get_logger("app");
/// use rust_channel_logger::log;
/// log!(logger, LogLevel::INFO, "Simple message");
/// log!(logger, LogLevel::ERROR, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = &$logger;
        if logger.is_enabled_for(level) {
            logger.log_with_caller(
                level,
                format!($($arg)+),
                $crate::core::CallerInfo::new(file!(), line!(), module_path!()),
            );
        }
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::TRACE, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::INFO, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_channel_logger::prelude::*;
/// # let env = Environment::new();
/// # let logger = env.get_logger("net");
/// use rust_channel_logger::warn;
/// warn!(logger, "Retry {} of {}", 1, 3);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::WARN, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::ERROR, $($arg)+)
    };
}

/// Log a fatal-level message. The process keeps running.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::FATAL, $($arg)+)
    };
}
