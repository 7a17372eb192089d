//! Wall-clock-triggered rotation

use super::file::{FileMode, FileStream, FileTarget};
use super::rotating_file::{
    backup_path, rollover_emit, rollover_locked, rotate_file, Rollover, RotatingHandler,
};
use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result};
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, Local, Timelike, Utc};
use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

/// When a [`TimedRotatingFileHandler`] rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Seconds,
    Minutes,
    Hours,
    Days,
    Midnight,
    /// Day of the week, 0 is Monday
    Weekday(u32),
}

impl When {
    fn unit(self) -> Duration {
        match self {
            When::Seconds => Duration::seconds(1),
            When::Minutes => Duration::minutes(1),
            When::Hours => Duration::hours(1),
            When::Days | When::Midnight => Duration::days(1),
            When::Weekday(_) => Duration::weeks(1),
        }
    }

    /// strftime pattern appended to archived file names
    pub fn suffix_format(self) -> &'static str {
        match self {
            When::Seconds => "%Y-%m-%d_%H-%M-%S",
            When::Minutes => "%Y-%m-%d_%H-%M",
            When::Hours => "%Y-%m-%d_%H",
            When::Days | When::Midnight | When::Weekday(_) => "%Y-%m-%d",
        }
    }

    fn suffix_len(self) -> usize {
        match self {
            When::Seconds => 19,
            When::Minutes => 16,
            When::Hours => 13,
            When::Days | When::Midnight | When::Weekday(_) => 10,
        }
    }
}

impl FromStr for When {
    type Err = LoggerError;

    /// `S`, `M`, `H`, `D`, `MIDNIGHT` or `W0`..`W6`, in any case
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let rule = s.to_ascii_uppercase();
        match rule.as_str() {
            "S" => Ok(When::Seconds),
            "M" => Ok(When::Minutes),
            "H" => Ok(When::Hours),
            "D" => Ok(When::Days),
            "MIDNIGHT" => Ok(When::Midnight),
            _ => {
                let day = rule
                    .strip_prefix('W')
                    .filter(|d| d.len() == 1)
                    .and_then(|d| d.parse::<u32>().ok())
                    .filter(|d| *d <= 6);
                day.map(When::Weekday)
                    .ok_or_else(|| LoggerError::InvalidRotationRule(s.to_string()))
            }
        }
    }
}

/// Rollover instants for one rule and interval
#[derive(Debug, Clone, Copy)]
pub struct RolloverSchedule {
    when: When,
    interval: Duration,
    utc: bool,
}

impl RolloverSchedule {
    /// Fails when `interval` units do not fit in a duration
    pub fn new(when: When, interval: u32, utc: bool) -> Result<Self> {
        let interval = when
            .unit()
            .num_seconds()
            .checked_mul(i64::from(interval))
            .and_then(Duration::try_seconds)
            .ok_or_else(|| Self::out_of_range(when, interval))?;
        Ok(Self {
            when,
            interval,
            utc,
        })
    }

    fn out_of_range(when: When, interval: impl std::fmt::Display) -> LoggerError {
        LoggerError::InvalidRotationRule(format!("{:?} every {} is out of range", when, interval))
    }

    pub fn when(&self) -> When {
        self.when
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The first rollover after `current`.
    ///
    /// Midnight and weekday rules land on the next day boundary (local time
    /// unless the schedule is UTC), pushed forward to the target weekday.
    pub fn next_after(&self, current: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let day_rule = matches!(self.when, When::Midnight | When::Weekday(_));
        if !day_rule {
            return current
                .checked_add_signed(self.interval)
                .ok_or_else(|| Self::out_of_range(self.when, self.interval));
        }

        let (since_midnight, today) = if self.utc {
            (current.num_seconds_from_midnight(), current.weekday())
        } else {
            let local = current.with_timezone(&Local);
            (local.num_seconds_from_midnight(), local.weekday())
        };
        let day_start = Duration::seconds(i64::from(since_midnight))
            + Duration::nanoseconds(i64::from(current.nanosecond() % 1_000_000_000));
        let mut result = current
            .checked_add_signed(Duration::days(1) - day_start)
            .ok_or_else(|| Self::out_of_range(self.when, self.interval))?;

        if let When::Weekday(target) = self.when {
            let today = today.num_days_from_monday();
            if today != target {
                let days_to_wait = if today < target {
                    target - today
                } else {
                    6 - today + target + 1
                };
                result = result
                    .checked_add_signed(Duration::days(i64::from(days_to_wait)))
                    .ok_or_else(|| Self::out_of_range(self.when, self.interval))?;
            }
        }
        Ok(result)
    }

    /// Archive suffix for the interval that ends at `rollover_at`
    pub fn suffix_for(&self, rollover_at: DateTime<Utc>) -> String {
        let start = rollover_at.checked_sub_signed(self.interval).unwrap_or(rollover_at);
        let format = self.when.suffix_format();
        if self.utc {
            start.format(format).to_string()
        } else {
            start.with_timezone(&Local).format(format).to_string()
        }
    }

    /// Whether `suffix` looks like one this schedule produces
    pub fn matches_suffix(&self, suffix: &str) -> bool {
        if suffix.len() != self.when.suffix_len() {
            return false;
        }
        let mut parsed = Parsed::new();
        parse(&mut parsed, suffix, StrftimeItems::new(self.when.suffix_format())).is_ok()
    }
}

/// Rotates its file at fixed wall-clock intervals.
///
/// Archives are named `<path>.<timestamp>` after the start of the interval
/// they cover. With `backup_count > 0` only that many archives are kept.
pub struct TimedRotatingFileHandler {
    core: HandlerCore,
    target: FileTarget,
    schedule: RolloverSchedule,
    backup_count: u32,
    rollover_at: Mutex<DateTime<Utc>>,
}

impl TimedRotatingFileHandler {
    /// `when` is parsed as in [`When::from_str`]
    pub fn new(
        path: impl AsRef<Path>,
        mode: FileMode,
        when: &str,
        interval: u32,
        backup_count: u32,
        utc: bool,
    ) -> Result<Self> {
        Self::with_buffer(path, mode, 0, when, interval, backup_count, utc)
    }

    pub fn with_buffer(
        path: impl AsRef<Path>,
        mode: FileMode,
        buffer_size: usize,
        when: &str,
        interval: u32,
        backup_count: u32,
        utc: bool,
    ) -> Result<Self> {
        let schedule = RolloverSchedule::new(when.parse()?, interval, utc)?;
        let target = FileTarget::open(path.as_ref(), mode, buffer_size)?;
        let modified: DateTime<Utc> = fs::metadata(target.path())
            .and_then(|meta| meta.modified())
            .unwrap_or_else(|_| SystemTime::now())
            .into();

        Ok(Self {
            core: HandlerCore::new(target.path().display().to_string(), LogLevel::NOTSET),
            rollover_at: Mutex::new(schedule.next_after(modified)?),
            target,
            schedule,
            backup_count,
        })
    }

    pub fn path(&self) -> &Path {
        self.target.path()
    }

    pub fn schedule(&self) -> &RolloverSchedule {
        &self.schedule
    }

    /// The instant after which the next record triggers a rollover
    pub fn rollover_at(&self) -> DateTime<Utc> {
        *self.rollover_at.lock()
    }

    /// Archives beyond the newest `backup_count`, oldest first
    fn files_to_delete(&self) -> Result<Vec<std::path::PathBuf>> {
        let path = self.target.path();
        let (Some(dir), Some(base)) = (path.parent(), path.file_name()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{}.", base.to_string_lossy());

        let mut archives = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(suffix) = name.strip_prefix(&prefix) {
                if self.schedule.matches_suffix(suffix) {
                    archives.push(dir.join(&name));
                }
            }
        }
        // fixed-width timestamps sort chronologically
        archives.sort();

        let keep = self.backup_count as usize;
        if archives.len() <= keep {
            return Ok(Vec::new());
        }
        archives.truncate(archives.len() - keep);
        Ok(archives)
    }
}

impl Rollover for TimedRotatingFileHandler {
    fn target(&self) -> &FileTarget {
        &self.target
    }

    fn is_due(&self, _stream: &mut FileStream, _message: &str) -> Result<bool> {
        Ok(Utc::now() > *self.rollover_at.lock())
    }

    fn archive(&self) -> Result<()> {
        let now = Utc::now();
        let mut rollover_at = self.rollover_at.lock();
        let path = self.target.path();
        let dest = backup_path(path, &self.schedule.suffix_for(*rollover_at));

        rotate_file(path, &dest)?;

        if self.backup_count > 0 {
            for old in self.files_to_delete()? {
                if let Err(e) = fs::remove_file(&old) {
                    eprintln!("[LOGGER WARN] Failed to remove old archive '{}': {}", old.display(), e);
                }
            }
        }
        *rollover_at = self.schedule.next_after(now)?;
        Ok(())
    }
}

impl RotatingHandler for TimedRotatingFileHandler {
    fn should_rollover(&self, record: &LogRecord) -> Result<(bool, String)> {
        let message = self.format(record);
        Ok((Utc::now() > self.rollover_at(), message))
    }

    fn do_rollover(&self) -> Result<()> {
        let mut slot = self.target.lock();
        rollover_locked(self, &mut *slot)
    }
}

impl Handler for TimedRotatingFileHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let message = self.format(record);
        rollover_emit(self, &message)
    }

    fn flush(&self) -> Result<()> {
        self.target.flush()
    }

    fn close(&self) {
        if let Err(e) = self.target.close() {
            eprintln!("[LOGGER ERROR] Failed to close '{}': {}", self.path().display(), e);
        }
    }
}
