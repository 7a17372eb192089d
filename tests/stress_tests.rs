//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - Concurrent logger creation yields a single consistent tree
//! - No record is lost or torn when many threads share a handler
//! - Size rotation stays within bounds under contention
//! - The queue handler drains everything on close

use rust_channel_logger::core::{HandlerCore, LogLevel, LogRecord};
use rust_channel_logger::handlers::{
    FileHandler, FileMode, Handler, MemoryHandler, QueueHandler, RotatingFileHandler,
};
use rust_channel_logger::Environment;
use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

/// Counts emits and detects overlapping calls
struct Overlap {
    core: HandlerCore,
    busy: AtomicBool,
    emitted: AtomicUsize,
    overlapped: AtomicUsize,
}

impl Handler for Overlap {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, _record: &Arc<LogRecord>) -> rust_channel_logger::Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.fetch_add(1, Ordering::SeqCst);
        }
        thread::yield_now();
        self.emitted.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_concurrent_get_logger_builds_one_tree() {
    let env = Arc::new(Environment::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let env = Arc::clone(&env);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Each thread walks the names in a different order
                let mut names = vec!["a.b.c.d", "a.b", "a", "a.b.c", "a.x", "a.b.y"];
                names.rotate_left(t % 6);
                names
                    .into_iter()
                    .map(|name| (name, env.get_logger(name)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in &results {
        for (name, logger) in result {
            assert!(Arc::ptr_eq(logger, &env.get_logger(name)));
        }
    }

    let parent_of = |name: &str| env.get_logger(name).parent().unwrap().name().to_string();
    assert_eq!(parent_of("a.b.c.d"), "a.b.c");
    assert_eq!(parent_of("a.b.c"), "a.b");
    assert_eq!(parent_of("a.b.y"), "a.b");
    assert_eq!(parent_of("a.b"), "a");
    assert_eq!(parent_of("a.x"), "a");
    assert_eq!(parent_of("a"), "");
}

#[test]
fn test_handler_never_sees_concurrent_emits() {
    let env = Arc::new(Environment::with_root_level(LogLevel::DEBUG));
    let handler = Arc::new(Overlap {
        core: HandlerCore::new("overlap", LogLevel::NOTSET),
        busy: AtomicBool::new(false),
        emitted: AtomicUsize::new(0),
        overlapped: AtomicUsize::new(0),
    });
    env.root().add_handler(handler.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = env.get_logger(&format!("worker.{}", t));
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("{}", i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(handler.emitted.load(Ordering::SeqCst), THREADS * PER_THREAD);
    assert_eq!(handler.overlapped.load(Ordering::SeqCst), 0);
}

#[test]
fn test_shared_file_handler_keeps_lines_whole() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("shared.log");

    let env = Arc::new(Environment::with_root_level(LogLevel::DEBUG));
    let handler = Arc::new(FileHandler::with_options(&log_file, FileMode::Truncate, 8192).unwrap());
    env.root().add_handler(handler);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = env.get_logger(&format!("thread{}", t));
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.warn(format!("thread{}-message{:04}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    env.shutdown();

    let content = fs::read_to_string(&log_file).unwrap();
    let lines: HashSet<&str> = content.lines().collect();
    assert_eq!(content.lines().count(), THREADS * PER_THREAD);
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    for t in 0..THREADS {
        assert!(lines.contains(format!("thread{}-message{:04}", t, PER_THREAD - 1).as_str()));
    }
}

#[test]
fn test_rotation_under_contention_stays_bounded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("busy.log");
    let max_bytes = 2048;
    let backups = 3;

    let env = Arc::new(Environment::with_root_level(LogLevel::DEBUG));
    let handler = Arc::new(
        RotatingFileHandler::new(&log_file, FileMode::Truncate, max_bytes, backups).unwrap(),
    );
    env.root().add_handler(handler);

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = env.get_logger(&format!("rot.{}", t));
            thread::spawn(move || {
                for i in 0..200 {
                    logger.info(format!("t{}-{:05}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    env.shutdown();

    let mut files = vec![log_file.clone()];
    for i in 1..=backups {
        files.push(temp_dir.path().join(format!("busy.log.{}", i)));
    }
    for file in &files {
        let len = fs::metadata(file).unwrap().len();
        assert!(len <= max_bytes, "{} has {} bytes", file.display(), len);
        // every file holds whole records only
        assert!(fs::read_to_string(file).unwrap().ends_with('\n'));
    }
    assert!(!temp_dir.path().join("busy.log.4").exists());
}

#[test]
fn test_queue_drains_every_record_on_close() {
    let sink = Arc::new(MemoryHandler::new(2 * THREADS * PER_THREAD));
    let buffer = Arc::new(MemoryHandler::new(2 * THREADS * PER_THREAD).with_target(sink.clone()));
    let queue = Arc::new(QueueHandler::new(buffer.clone(), 64, Duration::from_millis(5)).unwrap());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let record = LogRecord::new(format!("q{}", t), LogLevel::INFO, format!("{}", i));
                    queue.handle(&Arc::new(record));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    queue.close();
    assert_eq!(sink.records().len(), THREADS * PER_THREAD);
    assert_eq!(queue.pending(), 0);
}
