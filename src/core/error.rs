//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Level value that was never registered
    #[error("No such level: {0}")]
    NoSuchLevel(u8),

    /// Rotation rule that cannot be parsed
    #[error("Invalid rotation rule '{0}'")]
    InvalidRotationRule(String),

    /// File handler error with path
    #[error("File handler error for '{path}': {message}")]
    FileHandlerError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Handler used after close
    #[error("Handler '{0}' is closed")]
    HandlerClosed(String),

    /// Marker error that every retry policy treats as retryable
    #[error("force to retry")]
    ForceRetry,

    /// Retry gave up without keeping the last failure
    #[error("retry failed")]
    RetryFailed,

    /// Retry gave up; the last operation error is kept as source
    #[error("retry exhausted after {attempts} attempt(s)")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<LoggerError>,
    },

    /// Declarative configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Distinct failure kinds raised while applying a configuration document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    #[error("id missing in section '{0}'")]
    IdMissing(&'static str),

    #[error("id '{id}' already exists in section '{section}'")]
    IdAlreadyExists { section: &'static str, id: String },

    #[error("handler '{0}' has no class")]
    HandlerClassMissing(String),

    #[error("unknown handler class '{0}'")]
    UnknownHandlerClass(String),

    #[error("map has no such key '{0}'")]
    NoSuchKey(String),

    #[error("value type mismatch for '{key}': expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("unknown level '{0}'")]
    UnknownLevel(String),

    #[error("unknown file mode '{0}'")]
    UnknownFileMode(String),

    #[error("no such handler '{0}'")]
    NoSuchHandler(String),

    #[error("handler '{0}' is part of a target cycle")]
    HandlerCycle(String),

    #[error("no such formatter '{0}'")]
    NoSuchFormatter(String),

    #[error("no such filter '{0}'")]
    NoSuchFilter(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a file handler error
    pub fn file_handler(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileHandlerError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a retry exhaustion error carrying the last failure
    pub fn retry_exhausted(attempts: u32, last: LoggerError) -> Self {
        LoggerError::RetryExhausted {
            attempts,
            source: Box::new(last),
        }
    }

    /// Create a type mismatch configuration error
    pub fn type_mismatch(key: impl Into<String>, expected: &'static str) -> Self {
        LoggerError::Config(ConfigError::TypeMismatch {
            key: key.into(),
            expected,
        })
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// True for both flavours of retry exhaustion
    pub fn is_retry_exhaustion(&self) -> bool {
        matches!(
            self,
            LoggerError::RetryFailed | LoggerError::RetryExhausted { .. }
        )
    }

    /// The configuration error kind, if this is one
    pub fn config_kind(&self) -> Option<&ConfigError> {
        match self {
            LoggerError::Config(kind) => Some(kind),
            _ => None,
        }
    }
}
