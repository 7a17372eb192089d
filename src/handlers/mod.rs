//! Handler implementations

pub mod file;
pub mod memory;
pub mod null;
pub mod queue;
pub mod rotating_file;
pub mod stream;
pub mod timed_rotating_file;

#[cfg(feature = "console")]
pub mod console;

#[cfg(feature = "network")]
pub mod socket;

pub use file::{FileHandler, FileMode, FileStream};
pub use memory::MemoryHandler;
pub use null::NullHandler;
pub use queue::{QueueHandler, DEFAULT_FLUSH_INTERVAL};
pub use rotating_file::{RotatingFileHandler, RotatingHandler};
pub use stream::{StderrStream, StdoutHandler, StdoutStream, Stream, StreamHandler};
pub use timed_rotating_file::{RolloverSchedule, TimedRotatingFileHandler, When};

#[cfg(feature = "console")]
pub use console::ConsoleHandler;

#[cfg(feature = "network")]
pub use socket::{SocketHandler, WireRecord};

// Re-export the contract for convenience
pub use crate::core::{Handler, HandlerCore};
