//! Record formatting
//!
//! A [`StandardFormatter`] is built from a template that mixes literal text
//! with record attributes:
//!
//! | Placeholder     | Value                                        |
//! |-----------------|----------------------------------------------|
//! | `%(name)s`      | channel name                                 |
//! | `%(levelno)d`   | numeric level                                |
//! | `%(levelname)s` | level name (`Level N` when unregistered)     |
//! | `%(pathname)s`  | source path of the logging call              |
//! | `%(filename)s`  | file name portion of the path                |
//! | `%(lineno)d`    | source line                                  |
//! | `%(funcname)s`  | function or module of the logging call       |
//! | `%(created)d`   | creation time, Unix nanoseconds              |
//! | `%(asctime)s`   | creation time rendered with the date format  |
//! | `%(message)s`   | the rendered message                         |
//! | `%(thread)s`    | thread name, or thread id for unnamed threads |
//!
//! `%%` renders a single `%`; anything else passes through literally.

use super::record::LogRecord;
use super::timestamp::TimestampFormat;
use std::sync::Arc;

pub const DEFAULT_FORMAT: &str = "%(message)s";

/// Converts a record to text
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;

    /// Like `format`, with only the level name colored by severity.
    /// Formatters without a level segment return plain output.
    #[cfg(feature = "console")]
    fn format_colored(&self, record: &LogRecord) -> String {
        self.format(record)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attr {
    Name,
    LevelNo,
    LevelName,
    PathName,
    FileName,
    LineNo,
    FuncName,
    Created,
    AscTime,
    Message,
    Thread,
}

const ATTRIBUTES: [(&str, Attr); 11] = [
    ("%(name)s", Attr::Name),
    ("%(levelno)d", Attr::LevelNo),
    ("%(levelname)s", Attr::LevelName),
    ("%(pathname)s", Attr::PathName),
    ("%(filename)s", Attr::FileName),
    ("%(lineno)d", Attr::LineNo),
    ("%(funcname)s", Attr::FuncName),
    ("%(created)d", Attr::Created),
    ("%(asctime)s", Attr::AscTime),
    ("%(message)s", Attr::Message),
    ("%(thread)s", Attr::Thread),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Attr(Attr),
}

fn compile(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        literal.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some(after) = rest.strip_prefix("%%") {
            literal.push('%');
            rest = after;
            continue;
        }
        match ATTRIBUTES.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, attr)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Attr(*attr));
                rest = &rest[token.len()..];
            }
            None => {
                literal.push('%');
                rest = &rest[1..];
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Template based formatter; every formatted record ends with a newline
#[derive(Debug, Clone)]
pub struct StandardFormatter {
    template: String,
    segments: Vec<Segment>,
    date_format: TimestampFormat,
    utc: bool,
}

impl StandardFormatter {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            segments: compile(template),
            date_format: TimestampFormat::default(),
            utc: false,
        }
    }

    /// Template plus a strftime date format for `%(asctime)s`
    pub fn with_date_format(template: &str, date_format: &str) -> Self {
        Self::new(template).with_timestamp_format(TimestampFormat::from_strftime(date_format))
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.date_format = format;
        self
    }

    /// Render `%(asctime)s` in UTC instead of local time
    #[must_use]
    pub fn with_utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format_time(&self, record: &LogRecord) -> String {
        self.date_format.format(&record.created, self.utc)
    }

    fn push_attr(&self, out: &mut String, attr: Attr, record: &LogRecord, color_level: bool) {
        match attr {
            Attr::Name => out.push_str(&record.name),
            Attr::LevelNo => out.push_str(&record.level.value().to_string()),
            Attr::LevelName => push_level_name(out, record, color_level),
            Attr::PathName => out.push_str(&record.caller.path_name),
            Attr::FileName => out.push_str(&record.caller.file_name),
            Attr::LineNo => out.push_str(&record.caller.line_no.to_string()),
            Attr::FuncName => out.push_str(&record.caller.func_name),
            Attr::Created => out.push_str(
                &record
                    .created
                    .timestamp_nanos_opt()
                    .unwrap_or_default()
                    .to_string(),
            ),
            Attr::AscTime => out.push_str(&self.format_time(record)),
            Attr::Message => out.push_str(record.message()),
            Attr::Thread => out.push_str(record.thread_label()),
        }
    }
}

#[cfg(feature = "console")]
fn push_level_name(out: &mut String, record: &LogRecord, color: bool) {
    use colored::Colorize;
    let name = record.level.name();
    if color {
        out.push_str(&name.as_str().color(record.level.color_code()).to_string());
    } else {
        out.push_str(&name);
    }
}

#[cfg(not(feature = "console"))]
fn push_level_name(out: &mut String, record: &LogRecord, _color: bool) {
    out.push_str(&record.level.name());
}

impl Default for StandardFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl StandardFormatter {
    fn render(&self, record: &LogRecord, color_level: bool) -> String {
        let mut out = String::with_capacity(self.template.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Attr(attr) => self.push_attr(&mut out, *attr, record, color_level),
            }
        }
        out.push('\n');
        out
    }
}

impl Formatter for StandardFormatter {
    fn format(&self, record: &LogRecord) -> String {
        self.render(record, false)
    }

    #[cfg(feature = "console")]
    fn format_colored(&self, record: &LogRecord) -> String {
        self.render(record, true)
    }
}

/// Formats a batch of records with an optional header and footer
pub struct BufferingFormatter {
    line_formatter: Arc<dyn Formatter>,
    header: String,
    footer: String,
}

impl BufferingFormatter {
    pub fn new(line_formatter: Arc<dyn Formatter>) -> Self {
        Self {
            line_formatter,
            header: String::new(),
            footer: String::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    /// Empty input produces empty output, without header or footer
    pub fn format_batch(&self, records: &[Arc<LogRecord>]) -> String {
        if records.is_empty() {
            return String::new();
        }
        let mut out = self.header.clone();
        for record in records {
            out.push_str(&self.line_formatter.format(record));
        }
        out.push_str(&self.footer);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level::LogLevel;
    use crate::core::record::CallerInfo;
    use chrono::TimeZone;

    fn test_record() -> LogRecord {
        LogRecord::new("name", LogLevel::INFO, "message")
            .with_caller(CallerInfo::new("src/pathname/filename.rs", 111, "funcname"))
            .with_created(
                chrono::Utc
                    .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
                    .single()
                    .expect("valid datetime"),
            )
    }

    fn format(template: &str) -> String {
        StandardFormatter::new(template).format(&test_record())
    }

    #[test]
    fn test_default_formatter() {
        assert_eq!(StandardFormatter::default().format(&test_record()), "message\n");
    }

    #[test]
    fn test_attributes() {
        assert_eq!(format("%(name)s"), "name\n");
        assert_eq!(format("%(levelno)d"), "20\n");
        assert_eq!(format("%(levelname)s"), "INFO\n");
        assert_eq!(format("%(pathname)s"), "src/pathname/filename.rs\n");
        assert_eq!(format("%(filename)s"), "filename.rs\n");
        assert_eq!(format("%(lineno)d"), "111\n");
        assert_eq!(format("%(funcname)s"), "funcname\n");
        assert_eq!(format("%(created)d"), "1736332245000000000\n");
    }

    #[test]
    fn test_asctime_with_date_format() {
        let formatter = StandardFormatter::with_date_format("%(asctime)s", "%Y-%m-%d %H:%M:%S")
            .with_utc(true);
        assert_eq!(formatter.format(&test_record()), "2025-01-08 10:30:45\n");
    }

    #[test]
    fn test_mixed_template() {
        assert_eq!(
            format("[%(levelname)s] %(name)s: %(message)s"),
            "[INFO] name: message\n"
        );
    }

    #[test]
    fn test_percent_escape_and_unknown_placeholders() {
        assert_eq!(format("100%% %(message)s"), "100% message\n");
        assert_eq!(format("%(ctxid)s %(message)s"), "%(ctxid)s message\n");
        assert_eq!(format("50% done"), "50% done\n");
        assert_eq!(format("trailing %"), "trailing %\n");
    }

    #[test]
    fn test_buffering_formatter() {
        let line: Arc<dyn Formatter> = Arc::new(StandardFormatter::default());
        let formatter = BufferingFormatter::new(line)
            .with_header("BEGIN\n")
            .with_footer("END\n");
        let records = vec![Arc::new(test_record()), Arc::new(test_record())];
        assert_eq!(
            formatter.format_batch(&records),
            "BEGIN\nmessage\nmessage\nEND\n"
        );
        assert_eq!(formatter.format_batch(&[]), "");
    }
}
