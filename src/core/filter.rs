//! Record filters and the filter chain shared by loggers and handlers

use super::record::LogRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Arbitrary accept/reject predicate over records
pub trait Filter: Send + Sync {
    fn filter(&self, record: &LogRecord) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&LogRecord) -> bool + Send + Sync,
{
    fn filter(&self, record: &LogRecord) -> bool {
        self(record)
    }
}

/// Allows records from a channel and everything below it.
///
/// A filter built with `"A.B"` allows `"A.B"`, `"A.B.C"` and `"A.B.D.E"`,
/// but not `"A.BB"` or `"B.A.B"`. An empty name allows everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    name: String,
}

impl NameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dot-bounded prefix match on a channel name
    pub fn allows(&self, channel: &str) -> bool {
        if self.name.is_empty() || self.name == channel {
            return true;
        }
        match channel.strip_prefix(self.name.as_str()) {
            Some(rest) => rest.starts_with('.'),
            None => false,
        }
    }
}

impl Filter for NameFilter {
    fn filter(&self, record: &LogRecord) -> bool {
        self.allows(&record.name)
    }
}

fn same_filter(a: &Arc<dyn Filter>, b: &Arc<dyn Filter>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Ordered set of filters; a record passes when every filter accepts it
#[derive(Default)]
pub struct Filterer {
    filters: RwLock<Vec<Arc<dyn Filter>>>,
}

impl Filterer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; adding the same filter twice is a no-op
    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        let mut filters = self.filters.write();
        if !filters.iter().any(|f| same_filter(f, &filter)) {
            filters.push(filter);
        }
    }

    /// Remove a filter; removing an unknown filter is a no-op
    pub fn remove_filter(&self, filter: &Arc<dyn Filter>) {
        self.filters.write().retain(|f| !same_filter(f, filter));
    }

    /// 1 if every filter accepts the record, 0 on the first rejection
    pub fn filter(&self, record: &LogRecord) -> u32 {
        let filters = self.filters.read();
        u32::from(filters.iter().all(|f| f.filter(record)))
    }

    pub fn filters(&self) -> Vec<Arc<dyn Filter>> {
        self.filters.read().clone()
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}
