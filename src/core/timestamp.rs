//! Timestamp formatting utilities
//!
//! Selects how formatters render a record's creation time. Supports the
//! classic log date layout, ISO 8601, RFC 3339, Unix timestamps and custom
//! strftime formats, in local time or UTC.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// The default date layout: `2025-01-08 10:30:45 123`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %3f";

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_channel_logger::core::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now(), true);
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Date, time and milliseconds: `2025-01-08 10:30:45 123`
    #[default]
    Standard,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in nanoseconds
    UnixNanos,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Parse a strftime string; the default layout maps back to `Standard`
    pub fn from_strftime(format: &str) -> Self {
        if format == DEFAULT_DATE_FORMAT {
            TimestampFormat::Standard
        } else {
            TimestampFormat::Custom(format.to_string())
        }
    }

    /// Format `datetime` in UTC or in the local time zone
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>, utc: bool) -> String {
        if utc {
            self.format_in(datetime)
        } else {
            self.format_in(&datetime.with_timezone(&Local))
        }
    }

    fn format_in<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self {
            TimestampFormat::Standard => datetime.format(DEFAULT_DATE_FORMAT).to_string(),
            TimestampFormat::Iso8601 => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixNanos => datetime
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixNanos
        )
    }
}
