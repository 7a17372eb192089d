//! Log level definitions and the runtime-extensible level registry

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// An ordered severity value.
///
/// Any `u8` is a valid level; only registered values have a name. The
/// value 0 (`NOTSET`) means "inherit from the nearest ancestor".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogLevel(pub u8);

impl LogLevel {
    pub const NOTSET: LogLevel = LogLevel(0);
    pub const TRACE: LogLevel = LogLevel(5);
    pub const DEBUG: LogLevel = LogLevel(10);
    pub const INFO: LogLevel = LogLevel(20);
    pub const WARN: LogLevel = LogLevel(30);
    pub const ERROR: LogLevel = LogLevel(40);
    pub const FATAL: LogLevel = LogLevel(50);

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_notset(self) -> bool {
        self.0 == 0
    }

    /// Registered name, or `Level N` for unregistered values
    pub fn name(self) -> String {
        level_name(self)
    }

    /// Whether this level has a registered name
    pub fn is_registered(self) -> bool {
        lookup_level_name(self).is_some()
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match *self {
            l if l >= LogLevel::FATAL => BrightRed,
            l if l >= LogLevel::ERROR => Red,
            l if l >= LogLevel::WARN => Yellow,
            l if l >= LogLevel::INFO => Green,
            l if l >= LogLevel::DEBUG => Blue,
            _ => BrightBlack,
        }
    }
}

/// `record_level >= effective_level`
#[inline]
pub fn is_enabled_for(effective_level: LogLevel, record_level: LogLevel) -> bool {
    record_level >= effective_level
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match lookup_level_name(*self) {
            Some(name) => f.write_str(&name),
            None => write!(f, "Level {}", self.0),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        level_by_name(s).ok_or_else(|| format!("Invalid log level: '{}'", s))
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Bidirectional level/name mapping.
///
/// Reads vastly outnumber writes, which only happen at configuration time.
pub struct LevelRegistry {
    inner: RwLock<RegistryMaps>,
}

struct RegistryMaps {
    names: HashMap<LogLevel, String>,
    levels: HashMap<String, LogLevel>,
}

impl LevelRegistry {
    /// A registry pre-populated with the default levels
    pub fn new() -> Self {
        let registry = Self {
            inner: RwLock::new(RegistryMaps {
                names: HashMap::new(),
                levels: HashMap::new(),
            }),
        };
        for (level, name) in [
            (LogLevel::NOTSET, "NOTSET"),
            (LogLevel::TRACE, "TRACE"),
            (LogLevel::DEBUG, "DEBUG"),
            (LogLevel::INFO, "INFO"),
            (LogLevel::WARN, "WARN"),
            (LogLevel::ERROR, "ERROR"),
            (LogLevel::FATAL, "FATAL"),
        ] {
            registry.register(level, name);
        }
        {
            let mut maps = registry.inner.write();
            maps.levels.insert("WARNING".to_string(), LogLevel::WARN);
            maps.levels.insert("CRITICAL".to_string(), LogLevel::FATAL);
        }
        registry
    }

    /// The process-wide registry
    pub fn global() -> &'static LevelRegistry {
        static GLOBAL: OnceLock<LevelRegistry> = OnceLock::new();
        GLOBAL.get_or_init(LevelRegistry::new)
    }

    /// Associate `name` with `level`, overwriting any previous name
    pub fn register(&self, level: LogLevel, name: &str) {
        let mut maps = self.inner.write();
        let name = name.to_uppercase();
        maps.names.insert(level, name.clone());
        maps.levels.insert(name, level);
    }

    pub fn name_of(&self, level: LogLevel) -> Option<String> {
        self.inner.read().names.get(&level).cloned()
    }

    /// Case-insensitive reverse lookup
    pub fn level_of(&self, name: &str) -> Option<LogLevel> {
        self.inner.read().levels.get(&name.to_uppercase()).copied()
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register a level name in the process-wide registry
pub fn register_level(level: LogLevel, name: &str) {
    LevelRegistry::global().register(level, name);
}

/// Name of a level, `None` when it was never registered
pub fn lookup_level_name(level: LogLevel) -> Option<String> {
    LevelRegistry::global().name_of(level)
}

/// Name of a level with the `Level N` fallback
pub fn level_name(level: LogLevel) -> String {
    lookup_level_name(level).unwrap_or_else(|| format!("Level {}", level.0))
}

/// Level registered under `name` (case-insensitive)
pub fn level_by_name(name: &str) -> Option<LogLevel> {
    LevelRegistry::global().level_of(name)
}
