//! Basic logger usage example
//!
//! Demonstrates the logger hierarchy, level inheritance and propagation
//! with a stdout handler on the root.
//!
//! Run with: cargo run --example basic_usage

use rust_channel_logger::prelude::*;
use rust_channel_logger::{info, warn};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Channel Logger - Basic Usage Example ===\n");

    let env = Environment::with_root_level(LogLevel::INFO);

    let stdout: Arc<dyn Handler> = Arc::new(StdoutHandler::new());
    stdout.set_formatter(Arc::new(StandardFormatter::new(
        "[%(levelname)s] %(name)s: %(message)s",
    )));
    env.root().add_handler(stdout);

    println!("1. Loggers inherit the root level (INFO):");
    let app = env.get_logger("app");
    app.debug("This is a debug message (hidden)");
    app.info("This is an info message");
    app.warn("This is a warning message");

    println!("\n2. A child with its own level:");
    let db = env.get_logger("app.db");
    db.set_level(LogLevel::DEBUG)?;
    db.debug("Connection pool warmed up");
    info!(db, "{} connections open", 4);

    println!("\n3. Stopping propagation:");
    let audit = env.get_logger("audit");
    audit.set_propagate(false);
    audit.error("Nobody sees this: 'audit' has no handler and does not propagate");
    warn!(env.get_logger("audit.login"), "Neither does its child");

    println!("\n4. Custom level names:");
    let notice = LogLevel(25);
    rust_channel_logger::core::register_level(notice, "NOTICE");
    app.log(notice, "Registered levels render by name");
    app.log(LogLevel(35), "Unregistered levels render numerically");

    env.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
