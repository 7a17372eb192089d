//! The name-indexed logger hierarchy
//!
//! Loggers can be requested in any order. Requesting `"a.b.c"` before
//! `"a.b"` exists leaves placeholders for `"a.b"` and `"a"` that remember
//! the waiting descendants; when a real logger later takes a placeholder's
//! name, those descendants are re-parented onto it.

use super::{
    environment::HandlerCloser,
    filter::NameFilter,
    level::LogLevel,
    logger::Logger,
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Builds the logger for a newly requested name
pub type LoggerFactory = Arc<dyn Fn(&str) -> Logger + Send + Sync>;

fn default_factory() -> LoggerFactory {
    Arc::new(|name: &str| Logger::new(name, LogLevel::NOTSET))
}

/// Stand-in for an ancestor name that has no logger yet
struct PlaceHolder {
    loggers: Vec<Arc<Logger>>,
}

impl PlaceHolder {
    fn new(logger: &Arc<Logger>) -> Self {
        Self {
            loggers: vec![Arc::clone(logger)],
        }
    }

    fn append(&mut self, logger: &Arc<Logger>) {
        if !self.loggers.iter().any(|l| Arc::ptr_eq(l, logger)) {
            self.loggers.push(Arc::clone(logger));
        }
    }
}

enum Node {
    Logger(Arc<Logger>),
    PlaceHolder(PlaceHolder),
}

/// Owner of the logger tree of one environment
pub struct Manager {
    root: Arc<Logger>,
    nodes: Mutex<HashMap<String, Node>>,
    factory: RwLock<LoggerFactory>,
    closer: Arc<HandlerCloser>,
    self_ref: Weak<Manager>,
}

impl Manager {
    /// A manager whose root has `root_level` and its own handler closer
    pub fn new(root_level: LogLevel) -> Arc<Self> {
        Self::with_closer(root_level, Arc::new(HandlerCloser::new()))
    }

    pub fn with_closer(root_level: LogLevel, closer: Arc<HandlerCloser>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Manager>| {
            let root = Arc::new(Logger::new("", root_level).with_propagate(false));
            root.set_manager(weak.clone());
            Self {
                root,
                nodes: Mutex::new(HashMap::new()),
                factory: RwLock::new(default_factory()),
                closer,
                self_ref: weak.clone(),
            }
        })
    }

    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.root)
    }

    pub fn closer(&self) -> &Arc<HandlerCloser> {
        &self.closer
    }

    /// Replace the function that builds loggers for new names.
    ///
    /// The factory runs without the tree lock, so it may request other
    /// loggers, but never the name it is building. A logger it returns under
    /// a different name is renamed to the requested one.
    pub fn set_logger_factory<F>(&self, factory: F)
    where
        F: Fn(&str) -> Logger + Send + Sync + 'static,
    {
        *self.factory.write() = Arc::new(factory);
    }

    /// The logger for `name`, created on first request; `""` is the root.
    ///
    /// The whole placeholder and parent fix-up runs under the manager lock.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if name.is_empty() {
            return self.root();
        }

        if let Some(Node::Logger(logger)) = self.nodes.lock().get(name) {
            return Arc::clone(logger);
        }

        let factory = self.factory.read().clone();
        let built = factory(name).renamed(name);

        let mut nodes = self.nodes.lock();
        // another thread may have registered the name meanwhile
        if let Some(Node::Logger(logger)) = nodes.get(name) {
            return Arc::clone(logger);
        }
        let placeholder = match nodes.remove(name) {
            Some(Node::PlaceHolder(placeholder)) => Some(placeholder),
            _ => None,
        };
        let logger = Arc::new(built);
        logger.set_manager(self.self_ref.clone());
        nodes.insert(name.to_string(), Node::Logger(Arc::clone(&logger)));

        if let Some(placeholder) = placeholder {
            Self::fixup_children(&placeholder, &logger);
        }
        self.fixup_parents(&mut nodes, &logger);
        logger
    }

    /// Make sure every ancestor name maps to a logger or a placeholder and
    /// attach `logger` to its nearest existing ancestor logger.
    fn fixup_parents(&self, nodes: &mut HashMap<String, Node>, logger: &Arc<Logger>) {
        let name = logger.name();
        let mut parent = None;
        let mut index = name.rfind('.');

        while let Some(end) = index.filter(|&i| i > 0) {
            let prefix = &name[..end];
            match nodes.get_mut(prefix) {
                None => {
                    nodes.insert(prefix.to_string(), Node::PlaceHolder(PlaceHolder::new(logger)));
                }
                Some(Node::PlaceHolder(placeholder)) => placeholder.append(logger),
                Some(Node::Logger(existing)) => {
                    parent = Some(Arc::clone(existing));
                    break;
                }
            }
            index = prefix.rfind('.');
        }

        logger.set_parent(parent.as_ref().unwrap_or(&self.root));
    }

    /// Re-point descendants that waited on a placeholder to the logger that
    /// replaced it, unless they already hang below it.
    fn fixup_children(placeholder: &PlaceHolder, logger: &Arc<Logger>) {
        let within = NameFilter::new(logger.name());
        for child in &placeholder.loggers {
            let routed = child
                .parent()
                .is_some_and(|parent| within.allows(parent.name()));
            if !routed {
                child.set_parent(logger);
            }
        }
    }

    /// Names of every real logger, excluding the root
    pub fn logger_names(&self) -> Vec<String> {
        let nodes = self.nodes.lock();
        let mut names: Vec<String> = nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::Logger(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether `name` is currently held by a placeholder
    pub fn is_placeholder(&self, name: &str) -> bool {
        matches!(self.nodes.lock().get(name), Some(Node::PlaceHolder(_)))
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("root_level", &self.root.level())
            .field("nodes", &self.nodes.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent_name(logger: &Logger) -> Option<String> {
        logger.parent().map(|p| p.name().to_string())
    }

    #[test]
    fn test_root_properties() {
        let manager = Manager::new(LogLevel::WARN);
        let root = manager.get_logger("");
        assert_eq!(root.name(), "");
        assert!(!root.propagate());
        assert!(root.parent().is_none());
        assert_eq!(root.level(), LogLevel::WARN);
    }

    #[test]
    fn test_identity_is_stable() {
        let manager = Manager::new(LogLevel::WARN);
        let a = manager.get_logger("a.b");
        let b = manager.get_logger("a.b");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_child_before_parent_is_reparented() {
        let manager = Manager::new(LogLevel::WARN);
        let abc = manager.get_logger("a.b.c");
        assert_eq!(parent_name(&abc).as_deref(), Some(""));
        assert!(manager.is_placeholder("a.b"));
        assert!(manager.is_placeholder("a"));

        let a = manager.get_logger("a");
        assert_eq!(parent_name(&abc).as_deref(), Some("a"));
        assert_eq!(parent_name(&a).as_deref(), Some(""));

        let ab = manager.get_logger("a.b");
        assert_eq!(parent_name(&abc).as_deref(), Some("a.b"));
        assert_eq!(parent_name(&ab).as_deref(), Some("a"));
        assert!(!manager.is_placeholder("a"));
    }

    #[test]
    fn test_parent_found_past_placeholders() {
        let manager = Manager::new(LogLevel::WARN);
        manager.get_logger("x");
        let deep = manager.get_logger("x.y.z");
        assert_eq!(parent_name(&deep).as_deref(), Some("x"));
        assert!(manager.is_placeholder("x.y"));
    }

    #[test]
    fn test_already_routed_child_keeps_parent() {
        let manager = Manager::new(LogLevel::WARN);
        let d = manager.get_logger("a.b.c.d");
        manager.get_logger("a.b.c");
        // "a.b" placeholder still remembers "a.b.c.d", now routed via "a.b.c"
        manager.get_logger("a.b");
        assert_eq!(parent_name(&d).as_deref(), Some("a.b.c"));
    }

    #[test]
    fn test_effective_level_inherits() {
        let manager = Manager::new(LogLevel::WARN);
        let child = manager.get_logger("svc.db");
        assert_eq!(child.effective_level(), LogLevel::WARN);

        let svc = manager.get_logger("svc");
        svc.set_level(LogLevel::DEBUG).unwrap();
        assert_eq!(child.effective_level(), LogLevel::DEBUG);
    }

    #[test]
    fn test_custom_factory() {
        let manager = Manager::new(LogLevel::WARN);
        manager.set_logger_factory(|name| Logger::new(name, LogLevel::ERROR).with_propagate(false));
        let logger = manager.get_logger("custom");
        assert_eq!(logger.level(), LogLevel::ERROR);
        assert!(!logger.propagate());
    }

    #[test]
    fn test_factory_name_is_overridden() {
        let manager = Manager::new(LogLevel::WARN);
        manager.set_logger_factory(|_| Logger::new("wrong", LogLevel::NOTSET));

        let ab = manager.get_logger("a.b");
        let abc = manager.get_logger("a.b.c");
        assert_eq!(ab.name(), "a.b");
        assert_eq!(parent_name(&abc).as_deref(), Some("a.b"));
        assert!(Arc::ptr_eq(&ab, &manager.get_logger("a.b")));
        assert_eq!(manager.logger_names(), vec!["a.b", "a.b.c"]);
    }

    #[test]
    fn test_factory_may_request_other_loggers() {
        let manager = Manager::new(LogLevel::WARN);
        let weak = Arc::downgrade(&manager);
        manager.set_logger_factory(move |name| {
            if name != "audit" {
                if let Some(manager) = weak.upgrade() {
                    manager.get_logger("audit");
                }
            }
            Logger::new(name, LogLevel::NOTSET)
        });

        manager.get_logger("svc");
        assert_eq!(manager.logger_names(), vec!["audit", "svc"]);
    }

    #[test]
    fn test_get_child() {
        let manager = Manager::new(LogLevel::WARN);
        let abc = manager.get_logger("abc");
        let child = abc.get_child("def.ghi").unwrap();
        assert_eq!(child.name(), "abc.def.ghi");
        assert!(Arc::ptr_eq(&child, &manager.get_logger("abc.def.ghi")));

        let top = manager.root().get_child("top").unwrap();
        assert_eq!(top.name(), "top");
    }

    #[test]
    fn test_logger_names_excludes_placeholders() {
        let manager = Manager::new(LogLevel::WARN);
        manager.get_logger("p.q.r");
        manager.get_logger("m");
        assert_eq!(manager.logger_names(), vec!["m".to_string(), "p.q.r".to_string()]);
    }
}
