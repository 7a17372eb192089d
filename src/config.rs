//! Declarative configuration
//!
//! A JSON document describes filters, formatters, handlers and loggers;
//! applying it to an [`Environment`] builds the handlers through a
//! [`HandlerRegistry`] and wires everything onto the logger tree.
//!
//! ```json
//! {
//!     "version": 1,
//!     "filters": { "only_db": { "name": "app.db" } },
//!     "formatters": { "plain": { "format": "%(levelname)s %(message)s" } },
//!     "handlers": {
//!         "file": {
//!             "class": "FileHandler",
//!             "filename": "app.log",
//!             "mode": "O_APPEND",
//!             "formatter": "plain",
//!             "level": "INFO"
//!         }
//!     },
//!     "root": { "level": "WARN", "handlers": ["file"] },
//!     "loggers": { "app.db": { "level": "DEBUG", "filters": ["only_db"] } }
//! }
//! ```

use crate::core::{
    ConfigError, Environment, Filter, Formatter, Handler, LogLevel, Logger, LoggerError, NameFilter,
    Result, StandardFormatter, DEFAULT_DATE_FORMAT, DEFAULT_FORMAT,
};
use crate::handlers::{
    FileHandler, FileMode, MemoryHandler, NullHandler, QueueHandler, RotatingFileHandler,
    StdoutHandler, TimedRotatingFileHandler, DEFAULT_FLUSH_INTERVAL,
};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The only supported document version
pub const CONFIG_VERSION: u32 = 1;

/// Id → value pairs of one section, in document order.
///
/// Duplicate ids are remembered instead of silently overwritten so that
/// applying the configuration can reject them.
#[derive(Debug, Clone)]
pub struct Entries<T> {
    entries: Vec<(String, T)>,
    duplicates: Vec<String>,
}

impl<T> Entries<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, value)| (id.as_str(), value))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.iter().find(|(key, _)| key == id).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate ids: none empty, none repeated
    fn check_ids(&self, section: &'static str) -> Result<()> {
        if self.entries.iter().any(|(id, _)| id.is_empty()) {
            return Err(ConfigError::IdMissing(section).into());
        }
        if let Some(id) = self.duplicates.first() {
            return Err(ConfigError::IdAlreadyExists {
                section,
                id: id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

impl<T> Default for Entries<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<T> FromIterator<(String, T)> for Entries<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut result = Entries::default();
        let mut seen = HashSet::new();
        for (id, value) in iter {
            if !seen.insert(id.clone()) {
                result.duplicates.push(id);
                continue;
            }
            result.entries.push((id, value));
        }
        result
    }
}

struct EntriesVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
    type Value = Entries<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of ids to entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((id, value)) = access.next_entry::<String, T>()? {
            pairs.push((id, value));
        }
        Ok(pairs.into_iter().collect())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// Free-form key/value parameters of a handler or logger
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ConfMap(pub Map<String, Value>);

impl ConfMap {
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    fn value(&self, key: &str) -> Result<&Value> {
        self.0
            .get(key)
            .ok_or_else(|| ConfigError::NoSuchKey(key.to_string()).into())
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.value(key)?
            .as_bool()
            .ok_or_else(|| LoggerError::type_mismatch(key, "bool"))
    }

    pub fn get_u64(&self, key: &str) -> Result<u64> {
        self.value(key)?
            .as_u64()
            .ok_or_else(|| LoggerError::type_mismatch(key, "unsigned integer"))
    }

    pub fn get_u32(&self, key: &str) -> Result<u32> {
        u32::try_from(self.get_u64(key)?).map_err(|_| LoggerError::type_mismatch(key, "u32"))
    }

    pub fn get_u16(&self, key: &str) -> Result<u16> {
        u16::try_from(self.get_u64(key)?).map_err(|_| LoggerError::type_mismatch(key, "u16"))
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| LoggerError::type_mismatch(key, "string"))
    }

    /// An array of strings
    pub fn get_str_list(&self, key: &str) -> Result<Vec<&str>> {
        let items = self
            .value(key)?
            .as_array()
            .ok_or_else(|| LoggerError::type_mismatch(key, "array of strings"))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| LoggerError::type_mismatch(key, "array of strings"))
            })
            .collect()
    }

    /// A level given by name
    pub fn get_level(&self, key: &str) -> Result<LogLevel> {
        let name = self.get_str(key)?;
        name.parse()
            .map_err(|_| ConfigError::UnknownLevel(name.to_string()).into())
    }

    fn optional<'a, T>(
        &'a self,
        key: &str,
        get: impl FnOnce(&'a Self, &str) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.contains_key(key) {
            get(self, key).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatterConfig {
    pub format: Option<String>,
    pub datefmt: Option<String>,
}

/// A parsed configuration document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub filters: Entries<FilterConfig>,
    #[serde(default)]
    pub formatters: Entries<FormatterConfig>,
    #[serde(default)]
    pub handlers: Entries<ConfMap>,
    #[serde(default)]
    pub root: Option<ConfMap>,
    #[serde(default)]
    pub loggers: Entries<ConfMap>,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }
}

/// Components built so far while a configuration is applied
#[derive(Default)]
pub struct ConfigContext {
    filters: HashMap<String, Arc<dyn Filter>>,
    formatters: HashMap<String, Arc<dyn Formatter>>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    /// Handler ids in build order; a target always precedes its wrappers
    built: Vec<String>,
}

impl ConfigContext {
    pub fn handler(&self, id: &str) -> Result<Arc<dyn Handler>> {
        self.handlers
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::NoSuchHandler(id.to_string()).into())
    }

    pub fn formatter(&self, id: &str) -> Result<Arc<dyn Formatter>> {
        self.formatters
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::NoSuchFormatter(id.to_string()).into())
    }

    pub fn filter(&self, id: &str) -> Result<Arc<dyn Filter>> {
        self.filters
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigError::NoSuchFilter(id.to_string()).into())
    }

    /// Handlers in build order, targets before the handlers wrapping them
    pub fn handlers(&self) -> impl Iterator<Item = (&str, &Arc<dyn Handler>)> {
        self.built
            .iter()
            .filter_map(|id| self.handlers.get(id).map(|h| (id.as_str(), h)))
    }
}

/// Builds a handler from its parameters
pub type HandlerFactory =
    Arc<dyn Fn(&ConfMap, &ConfigContext) -> Result<Arc<dyn Handler>> + Send + Sync>;

/// Maps a handler `class` tag to the factory that builds it
#[derive(Clone)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// A registry without any classes
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with every built-in handler class
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("NullHandler", |_, _| Ok(Arc::new(NullHandler::new())));
        registry.register("StdoutHandler", |_, _| Ok(Arc::new(StdoutHandler::new())));
        registry.register("MemoryHandler", build_memory_handler);
        registry.register("QueueHandler", build_queue_handler);
        registry.register("FileHandler", build_file_handler);
        registry.register("RotatingFileHandler", build_rotating_file_handler);
        registry.register("TimedRotatingFileHandler", build_timed_rotating_file_handler);
        #[cfg(feature = "console")]
        registry.register("ConsoleHandler", |params, _| {
            let colors = params.optional("colors", ConfMap::get_bool)?.unwrap_or(true);
            Ok(Arc::new(crate::handlers::ConsoleHandler::with_colors(colors)))
        });
        #[cfg(feature = "network")]
        registry.register("SocketHandler", |params, _| {
            let host = params.get_str("host")?;
            let port = params.get_u16("port")?;
            Ok(Arc::new(crate::handlers::SocketHandler::new(host, port)))
        });
        registry
    }

    /// Add or replace the factory for `class`
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&ConfMap, &ConfigContext) -> Result<Arc<dyn Handler>> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Arc::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    pub fn build(&self, class: &str, params: &ConfMap, ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| ConfigError::UnknownHandlerClass(class.to_string()))?;
        factory(params, ctx)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_memory_handler(params: &ConfMap, ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
    let capacity = params.get_u64("capacity")?;
    let capacity = usize::try_from(capacity).map_err(|_| LoggerError::type_mismatch("capacity", "usize"))?;
    let mut handler = MemoryHandler::new(capacity);
    if let Some(level) = params.optional("flushLevel", ConfMap::get_level)? {
        handler = handler.with_flush_level(level);
    }
    if let Some(target) = params.optional("target", ConfMap::get_str)? {
        handler = handler.with_target(ctx.handler(target)?);
    }
    Ok(Arc::new(handler))
}

fn build_queue_handler(params: &ConfMap, ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
    let target = ctx.handler(params.get_str("target")?)?;
    let capacity = params.optional("capacity", ConfMap::get_u64)?.unwrap_or(1024);
    let flush_interval = params
        .optional("flushInterval", ConfMap::get_u64)?
        .map_or(DEFAULT_FLUSH_INTERVAL, Duration::from_millis);
    let capacity = usize::try_from(capacity).map_err(|_| LoggerError::type_mismatch("capacity", "usize"))?;
    Ok(Arc::new(QueueHandler::new(target, capacity, flush_interval)?))
}

fn file_mode(params: &ConfMap) -> Result<FileMode> {
    match params.optional("mode", ConfMap::get_str)? {
        Some(mode) => Ok(mode.parse::<FileMode>()?),
        None => Ok(FileMode::Append),
    }
}

fn build_file_handler(params: &ConfMap, _ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
    let filename = params.get_str("filename")?;
    Ok(Arc::new(FileHandler::with_options(filename, file_mode(params)?, 0)?))
}

fn build_rotating_file_handler(params: &ConfMap, _ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
    let filepath = params.get_str("filepath")?;
    let max_bytes = params.get_u64("maxBytes")?;
    let backup_count = params.get_u32("backupCount")?;
    Ok(Arc::new(RotatingFileHandler::new(
        filepath,
        file_mode(params)?,
        max_bytes,
        backup_count,
    )?))
}

fn build_timed_rotating_file_handler(params: &ConfMap, _ctx: &ConfigContext) -> Result<Arc<dyn Handler>> {
    let filepath = params.get_str("filepath")?;
    let when = params.get_str("when")?;
    let interval = params.get_u32("interval")?;
    let backup_count = params.get_u32("backupCount")?;
    let utc = params.optional("utc", ConfMap::get_bool)?.unwrap_or(false);
    Ok(Arc::new(TimedRotatingFileHandler::new(
        filepath,
        file_mode(params)?,
        when,
        interval,
        backup_count,
        utc,
    )?))
}

fn configure_handler(handler: &Arc<dyn Handler>, params: &ConfMap, ctx: &ConfigContext) -> Result<()> {
    if let Some(level) = params.optional("level", ConfMap::get_level)? {
        handler.set_level(level)?;
    }
    if let Some(id) = params.optional("formatter", ConfMap::get_str)? {
        handler.set_formatter(ctx.formatter(id)?);
    }
    for id in params.optional("filters", ConfMap::get_str_list)?.unwrap_or_default() {
        handler.add_filter(ctx.filter(id)?);
    }
    Ok(())
}

fn configure_logger(logger: &Logger, params: &ConfMap, is_root: bool, ctx: &ConfigContext) -> Result<()> {
    if let Some(level) = params.optional("level", ConfMap::get_level)? {
        logger.set_level(level)?;
    }
    // the root never propagates
    if !is_root {
        if let Some(propagate) = params.optional("propagate", ConfMap::get_bool)? {
            logger.set_propagate(propagate);
        }
    }
    for id in params.optional("handlers", ConfMap::get_str_list)?.unwrap_or_default() {
        logger.add_handler(ctx.handler(id)?);
    }
    for id in params.optional("filters", ConfMap::get_str_list)?.unwrap_or_default() {
        logger.add_filter(ctx.filter(id)?);
    }
    Ok(())
}

/// Build `id` after the handler its `target` names, depth first
fn build_handler(
    id: &str,
    config: &Config,
    registry: &HandlerRegistry,
    ctx: &mut ConfigContext,
    visiting: &mut Vec<String>,
) -> Result<()> {
    if ctx.handlers.contains_key(id) {
        return Ok(());
    }
    if visiting.iter().any(|v| v == id) {
        return Err(ConfigError::HandlerCycle(id.to_string()).into());
    }
    let Some(params) = config.handlers.get(id) else {
        return Err(ConfigError::NoSuchHandler(id.to_string()).into());
    };

    if let Some(target) = params.optional("target", ConfMap::get_str)? {
        // undeclared targets are reported by the factory lookup
        if config.handlers.get(target).is_some() {
            visiting.push(id.to_string());
            let built = build_handler(target, config, registry, ctx, visiting);
            visiting.pop();
            built?;
        }
    }

    let class = params
        .optional("class", ConfMap::get_str)?
        .ok_or_else(|| ConfigError::HandlerClassMissing(id.to_string()))?;
    let handler = registry.build(class, params, ctx)?;
    configure_handler(&handler, params, ctx)?;
    ctx.handlers.insert(id.to_string(), handler);
    ctx.built.push(id.to_string());
    Ok(())
}

fn build_context(config: &Config, registry: &HandlerRegistry) -> Result<ConfigContext> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(config.version).into());
    }
    config.filters.check_ids("filters")?;
    config.formatters.check_ids("formatters")?;
    config.handlers.check_ids("handlers")?;
    config.loggers.check_ids("loggers")?;

    let mut ctx = ConfigContext::default();
    for (id, filter) in config.filters.iter() {
        ctx.filters
            .insert(id.to_string(), Arc::new(NameFilter::new(filter.name.as_str())));
    }
    for (id, formatter) in config.formatters.iter() {
        let format = formatter.format.as_deref().unwrap_or(DEFAULT_FORMAT);
        let datefmt = formatter.datefmt.as_deref().unwrap_or(DEFAULT_DATE_FORMAT);
        ctx.formatters.insert(
            id.to_string(),
            Arc::new(StandardFormatter::with_date_format(format, datefmt)),
        );
    }

    let mut visiting = Vec::new();
    for (id, _) in config.handlers.iter() {
        build_handler(id, config, registry, &mut ctx, &mut visiting)?;
    }
    Ok(ctx)
}

impl Environment {
    /// Apply a configuration with the built-in handler classes
    pub fn apply_config(&self, config: &Config) -> Result<()> {
        self.apply_config_with(config, &HandlerRegistry::new())
    }

    /// Apply a configuration, resolving handler classes through `registry`.
    ///
    /// Every handler the document builds is tracked for shutdown, even those
    /// no logger references. Targets are tracked before their wrappers so
    /// that shutdown closes a wrapper before the handler it writes to.
    pub fn apply_config_with(&self, config: &Config, registry: &HandlerRegistry) -> Result<()> {
        let ctx = build_context(config, registry)?;
        for (_, handler) in ctx.handlers() {
            self.track_handler(handler);
        }

        if let Some(params) = &config.root {
            configure_logger(&self.root(), params, true, &ctx)?;
        }
        for (name, params) in config.loggers.iter() {
            configure_logger(&self.get_logger(name), params, false, &ctx)?;
        }
        Ok(())
    }

    pub fn apply_json_config_str(&self, json: &str) -> Result<()> {
        self.apply_config(&Config::from_json_str(json)?)
    }

    pub fn apply_json_config_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.apply_config(&Config::from_json_file(path)?)
    }
}

/// Apply a JSON configuration file to the default environment
pub fn apply_json_config_file(path: impl AsRef<Path>) -> Result<()> {
    crate::core::default_environment().apply_json_config_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(json: &str) -> Result<Environment> {
        let env = Environment::new();
        env.apply_json_config_str(json)?;
        Ok(env)
    }

    fn config_error(json: &str) -> ConfigError {
        match apply(json) {
            Err(LoggerError::Config(kind)) => kind,
            Err(other) => panic!("expected a configuration error, got {other}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_entries_keep_order_and_duplicates() {
        let entries: Entries<u32> = serde_json::from_str(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        let ids: Vec<&str> = entries.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(entries.get("b"), Some(&1));
        assert!(matches!(
            entries.check_ids("test"),
            Err(LoggerError::Config(ConfigError::IdAlreadyExists { section: "test", .. }))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        assert_eq!(config_error(r#"{"version": 2}"#), ConfigError::UnsupportedVersion(2));
        assert_eq!(config_error(r#"{}"#), ConfigError::UnsupportedVersion(0));
    }

    #[test]
    fn test_missing_and_duplicate_ids() {
        assert_eq!(
            config_error(r#"{"version": 1, "filters": {"": {"name": "a"}}}"#),
            ConfigError::IdMissing("filters")
        );
        assert_eq!(
            config_error(
                r#"{"version": 1, "handlers": {
                    "h": {"class": "NullHandler"},
                    "h": {"class": "StdoutHandler"}}}"#
            ),
            ConfigError::IdAlreadyExists {
                section: "handlers",
                id: "h".to_string()
            }
        );
    }

    #[test]
    fn test_handler_class_errors() {
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"h": {"level": "INFO"}}}"#),
            ConfigError::HandlerClassMissing("h".to_string())
        );
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"h": {"class": "CarrierPigeon"}}}"#),
            ConfigError::UnknownHandlerClass("CarrierPigeon".to_string())
        );
    }

    #[test]
    fn test_parameter_errors() {
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"m": {"class": "MemoryHandler"}}}"#),
            ConfigError::NoSuchKey("capacity".to_string())
        );
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"m": {"class": "MemoryHandler", "capacity": "ten"}}}"#),
            ConfigError::TypeMismatch {
                key: "capacity".to_string(),
                expected: "unsigned integer"
            }
        );
        assert_eq!(
            config_error(r#"{"version": 1, "root": {"level": "LOUD"}}"#),
            ConfigError::UnknownLevel("LOUD".to_string())
        );
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"f": {"class": "FileHandler", "filename": "x.log", "mode": "O_RDONLY"}}}"#),
            ConfigError::UnknownFileMode("O_RDONLY".to_string())
        );
    }

    #[test]
    fn test_reference_errors() {
        assert_eq!(
            config_error(r#"{"version": 1, "root": {"handlers": ["ghost"]}}"#),
            ConfigError::NoSuchHandler("ghost".to_string())
        );
        assert_eq!(
            config_error(r#"{"version": 1, "handlers": {"n": {"class": "NullHandler", "formatter": "ghost"}}}"#),
            ConfigError::NoSuchFormatter("ghost".to_string())
        );
        assert_eq!(
            config_error(r#"{"version": 1, "loggers": {"a": {"filters": ["ghost"]}}}"#),
            ConfigError::NoSuchFilter("ghost".to_string())
        );
    }

    #[test]
    fn test_wrapping_handler_declared_before_target() {
        let env = apply(
            r#"{
                "version": 1,
                "formatters": {"short": {"format": "%(name)s:%(message)s"}},
                "handlers": {
                    "buffer": {"class": "MemoryHandler", "capacity": 100, "target": "sink"},
                    "sink": {"class": "MemoryHandler", "capacity": 100, "formatter": "short"}
                },
                "root": {"level": "INFO", "handlers": ["buffer"]}
            }"#,
        )
        .unwrap();

        env.get_logger("svc").error("down");
        let root_handlers = env.root().handlers();
        assert_eq!(root_handlers.len(), 1);
        assert_eq!(env.closer().len(), 2);
    }

    #[test]
    fn test_wrapper_chains_resolve_in_dependency_order() {
        let config = Config::from_json_str(
            r#"{
                "version": 1,
                "handlers": {
                    "outer": {"class": "MemoryHandler", "capacity": 10, "target": "inner"},
                    "inner": {"class": "MemoryHandler", "capacity": 10, "target": "sink"},
                    "sink": {"class": "NullHandler"}
                }
            }"#,
        )
        .unwrap();
        let ctx = build_context(&config, &HandlerRegistry::new()).unwrap();

        let order: Vec<&str> = ctx.handlers().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["sink", "inner", "outer"]);
    }

    #[test]
    fn test_target_cycles_are_rejected() {
        assert_eq!(
            config_error(
                r#"{"version": 1, "handlers": {
                    "a": {"class": "MemoryHandler", "capacity": 1, "target": "b"},
                    "b": {"class": "MemoryHandler", "capacity": 1, "target": "a"}}}"#
            ),
            ConfigError::HandlerCycle("a".to_string())
        );
        assert_eq!(
            config_error(
                r#"{"version": 1, "handlers": {
                    "self": {"class": "QueueHandler", "target": "self"}}}"#
            ),
            ConfigError::HandlerCycle("self".to_string())
        );
        assert_eq!(
            config_error(
                r#"{"version": 1, "handlers": {
                    "q": {"class": "QueueHandler", "target": "nowhere"}}}"#
            ),
            ConfigError::NoSuchHandler("nowhere".to_string())
        );
    }

    #[test]
    fn test_loggers_are_wired() {
        let env = apply(
            r#"{
                "version": 1,
                "filters": {"db_only": {"name": "app.db"}},
                "handlers": {"null": {"class": "NullHandler", "level": "ERROR"}},
                "root": {"level": "WARN", "propagate": true},
                "loggers": {
                    "app": {"level": "DEBUG", "propagate": false, "handlers": ["null"], "filters": ["db_only"]}
                }
            }"#,
        )
        .unwrap();

        let app = env.get_logger("app");
        assert_eq!(app.level(), LogLevel::DEBUG);
        assert!(!app.propagate());
        assert_eq!(app.handlers().len(), 1);
        assert_eq!(app.handlers()[0].level(), LogLevel::ERROR);
        assert!(!env.root().propagate());
    }

    #[test]
    fn test_custom_registry_class() {
        let mut registry = HandlerRegistry::empty();
        registry.register("Sink", |params, _| {
            let capacity = params.get_u64("capacity")? as usize;
            Ok(Arc::new(MemoryHandler::new(capacity)))
        });
        assert!(registry.contains("Sink"));
        assert!(!registry.contains("NullHandler"));

        let config = Config::from_json_str(
            r#"{"version": 1, "handlers": {"s": {"class": "Sink", "capacity": 4}}, "root": {"handlers": ["s"]}}"#,
        )
        .unwrap();
        let env = Environment::new();
        env.apply_config_with(&config, &registry).unwrap();
        assert_eq!(env.root().handlers().len(), 1);
    }
}
