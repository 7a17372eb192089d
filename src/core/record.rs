//! Log record structure

use super::level::LogLevel;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::fmt;
use std::panic::Location;
use std::sync::OnceLock;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Where a logging call was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub path_name: String,
    pub file_name: String,
    pub line_no: u32,
    pub func_name: String,
}

impl CallerInfo {
    pub fn new(path_name: &str, line_no: u32, func_name: &str) -> Self {
        Self {
            path_name: path_name.to_string(),
            file_name: base_name(path_name).to_string(),
            line_no,
            func_name: func_name.to_string(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            path_name: "(unknown path)".to_string(),
            file_name: "(unknown file)".to_string(),
            line_no: 0,
            func_name: "(unknown function)".to_string(),
        }
    }

    /// Caller site as reported by `#[track_caller]`; the function is unknown
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            path_name: location.file().to_string(),
            file_name: base_name(location.file()).to_string(),
            line_no: location.line(),
            func_name: "(unknown function)".to_string(),
        }
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Message source of a record, rendered at most once
pub enum MessageSource {
    Text(String),
    Deferred(Box<dyn Fn() -> String + Send + Sync>),
}

impl fmt::Debug for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSource::Text(text) => f.debug_tuple("Text").field(text).finish(),
            MessageSource::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// An event being logged.
///
/// Immutable after construction except for the memoized rendered message.
#[derive(Debug)]
pub struct LogRecord {
    pub name: String,
    pub level: LogLevel,
    pub created: DateTime<Utc>,
    pub caller: CallerInfo,
    pub thread_id: String,
    pub thread_name: Option<String>,
    source: MessageSource,
    rendered: OnceLock<String>,
}

impl LogRecord {
    pub fn new(name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self::with_source(name, level, MessageSource::Text(message.into()))
    }

    /// A record whose message is produced by `render` on first access
    pub fn deferred<F>(name: impl Into<String>, level: LogLevel, render: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::with_source(name, level, MessageSource::Deferred(Box::new(render)))
    }

    pub fn with_source(name: impl Into<String>, level: LogLevel, source: MessageSource) -> Self {
        Self {
            name: name.into(),
            level,
            created: Utc::now(),
            caller: CallerInfo::unknown(),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            source,
            rendered: OnceLock::new(),
        }
    }

    pub fn with_caller(mut self, caller: CallerInfo) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// The rendered message, materialized on first call
    pub fn message(&self) -> &str {
        self.rendered.get_or_init(|| match &self.source {
            MessageSource::Text(text) => text.clone(),
            MessageSource::Deferred(render) => render(),
        })
    }

    /// Whether the message has been materialized already
    pub fn is_rendered(&self) -> bool {
        self.rendered.get().is_some()
    }

    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<LogRecord: {}, {}, {}, {}, \"{}\">",
            self.name,
            self.level,
            self.caller.path_name,
            self.caller.line_no,
            self.message()
        )
    }
}
