//! File logging example
//!
//! Demonstrates plain, size-rotated and time-rotated file handlers, and a
//! queue handler that moves file I/O off the logging thread.
//!
//! Run with: cargo run --example file_logging

use rust_channel_logger::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Channel Logger - File Logging Example ===\n");

    let env = Environment::with_root_level(LogLevel::DEBUG);
    let formatter = Arc::new(StandardFormatter::new(
        "%(asctime)s %(levelname)s [%(thread)s] %(name)s - %(message)s",
    ));

    // Everything goes to application.log
    let plain: Arc<dyn Handler> = Arc::new(FileHandler::with_options(
        "logs/application.log",
        FileMode::Truncate,
        8192,
    )?);
    plain.set_formatter(formatter.clone());
    env.root().add_handler(plain);

    // Warnings and above, rotated every 4 KiB with three backups
    let rotating: Arc<dyn Handler> = Arc::new(RotatingFileHandler::new(
        "logs/warnings.log",
        FileMode::Append,
        4096,
        3,
    )?);
    rotating.set_level(LogLevel::WARN)?;
    rotating.set_formatter(formatter.clone());
    env.root().add_handler(rotating);

    // The job logger writes through a queue into a file rotated at midnight
    let daily: Arc<dyn Handler> = Arc::new(TimedRotatingFileHandler::new(
        "logs/jobs.log",
        FileMode::Append,
        "midnight",
        1,
        7,
        false,
    )?);
    daily.set_formatter(formatter);
    let queued = Arc::new(QueueHandler::new(daily, 1024, Duration::from_millis(200))?);
    env.get_logger("jobs").add_handler(queued);

    println!("1. Logging application events:");
    let app = env.get_logger("app");
    app.info("Application started");
    app.debug("Loading configuration...");
    app.warn("Using default settings for some options");
    app.error("Failed to load optional plugin");

    println!("2. Running jobs:");
    let jobs = env.get_logger("jobs.nightly");
    for i in 1..=5 {
        jobs.info(format!("Processing item {}/5", i));
        if i == 3 {
            jobs.warn("Item 3 took longer than expected");
        }
    }

    // Flushes and closes every handler, draining the queue first
    env.shutdown();

    println!("\n=== Example completed successfully! ===");
    println!("Check the 'logs' directory for the output");

    Ok(())
}
