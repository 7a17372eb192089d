//! Declarative configuration example
//!
//! Builds the whole logging setup from a JSON document, including a
//! handler class registered by the application.
//!
//! Run with: cargo run --example config_logging

use rust_channel_logger::config::ConfMap;
use rust_channel_logger::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "version": 1,
    "filters": {
        "db_only": { "name": "app.db" }
    },
    "formatters": {
        "detailed": {
            "format": "%(asctime)s %(levelname)s %(name)s %(filename)s:%(lineno)d %(message)s",
            "datefmt": "%H:%M:%S"
        },
        "short": { "format": "%(levelname)s %(message)s" }
    },
    "handlers": {
        "stdout": { "class": "StdoutHandler", "formatter": "detailed" },
        "db_file": {
            "class": "RotatingFileHandler",
            "filepath": "logs/db.log",
            "mode": "O_APPEND",
            "maxBytes": 1048576,
            "backupCount": 2,
            "formatter": "short",
            "filters": ["db_only"]
        },
        "tagged": { "class": "TaggedStdout", "tag": "AUDIT", "level": "WARN" }
    },
    "root": { "level": "INFO", "handlers": ["stdout"] },
    "loggers": {
        "app.db": { "level": "DEBUG", "handlers": ["db_file"] },
        "audit": { "propagate": false, "handlers": ["tagged"] }
    }
}"#;

fn main() -> Result<()> {
    println!("=== Rust Channel Logger - Configuration Example ===\n");

    let mut registry = HandlerRegistry::new();
    registry.register("TaggedStdout", |params: &ConfMap, _| {
        let tag = params.get_str("tag")?;
        let handler: Arc<dyn Handler> = Arc::new(StdoutHandler::new());
        handler.set_formatter(Arc::new(StandardFormatter::new(&format!(
            "<{}> %(levelname)s %(message)s",
            tag
        ))));
        Ok(handler)
    });

    let env = Environment::new();
    let config = Config::from_json_str(CONFIG)?;
    env.apply_config_with(&config, &registry)?;

    env.get_logger("app").info("Configured from JSON");
    env.get_logger("app.db").debug("Query plan cached");
    env.get_logger("audit").info("Below the tagged handler level");
    env.get_logger("audit").warn("Privilege change");

    // Unknown classes are reported, not ignored
    match env.apply_json_config_str(r#"{"version": 1, "handlers": {"x": {"class": "Syslog"}}}"#) {
        Err(e) => println!("\nRejected configuration: {}", e),
        Ok(()) => println!("\nUnexpectedly accepted configuration"),
    }

    env.shutdown();
    println!("\n=== Example completed successfully! ===");

    Ok(())
}
