//! Handler metrics for observability
//!
//! Counters describing what a handler did with the records it was offered:
//! how many reached the sink, how many its filters rejected, and how many
//! emits failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-handler counters
///
/// # Example
///
/// ```
/// use rust_channel_logger::core::HandlerMetrics;
///
/// let metrics = HandlerMetrics::new();
/// metrics.record_handled();
/// metrics.record_emit_error();
///
/// assert_eq!(metrics.handled(), 1);
/// assert_eq!(metrics.emit_errors(), 1);
/// ```
#[derive(Debug)]
pub struct HandlerMetrics {
    /// Records passed to `emit`
    handled: AtomicU64,

    /// Records rejected by the handler's own filters
    filtered: AtomicU64,

    /// Emits that returned an error
    emit_errors: AtomicU64,
}

impl HandlerMetrics {
    pub const fn new() -> Self {
        Self {
            handled: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            emit_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn emit_errors(&self) -> u64 {
        self.emit_errors.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_handled(&self) -> u64 {
        self.handled.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_emit_error(&self) -> u64 {
        self.emit_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed emits as a percentage of handled records (0.0 - 100.0)
    pub fn error_rate(&self) -> f64 {
        let handled = self.handled() as f64;
        if handled == 0.0 {
            0.0
        } else {
            (self.emit_errors() as f64 / handled) * 100.0
        }
    }

    pub fn reset(&self) {
        self.handled.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.emit_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for HandlerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for HandlerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            handled: AtomicU64::new(self.handled()),
            filtered: AtomicU64::new(self.filtered()),
            emit_errors: AtomicU64::new(self.emit_errors()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = HandlerMetrics::new();
        assert_eq!(metrics.handled(), 0);
        assert_eq!(metrics.filtered(), 0);
        assert_eq!(metrics.emit_errors(), 0);
    }

    #[test]
    fn test_record_returns_previous_value() {
        let metrics = HandlerMetrics::new();
        assert_eq!(metrics.record_filtered(), 0);
        assert_eq!(metrics.record_filtered(), 1);
        assert_eq!(metrics.filtered(), 2);
    }

    #[test]
    fn test_error_rate() {
        let metrics = HandlerMetrics::new();
        assert_eq!(metrics.error_rate(), 0.0);

        for _ in 0..4 {
            metrics.record_handled();
        }
        metrics.record_emit_error();
        assert_eq!(metrics.error_rate(), 25.0);
    }

    #[test]
    fn test_clone_is_snapshot() {
        let metrics = HandlerMetrics::new();
        metrics.record_handled();

        let snapshot = metrics.clone();
        metrics.record_handled();
        metrics.reset();

        assert_eq!(snapshot.handled(), 1);
        assert_eq!(metrics.handled(), 0);
    }
}
