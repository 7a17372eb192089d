//! Asynchronous handler wrapper backed by a worker thread

use crate::core::{Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Default interval between forced flushes of the target
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(500);

enum Message {
    Record(Arc<LogRecord>),
    /// Barrier: acked once everything queued before it is written and the
    /// target flushed
    Flush(Sender<Result<()>>),
    Stop,
}

/// Hands records to a dedicated worker thread that writes them to the
/// wrapped handler.
///
/// Records are drained strictly in FIFO order. When the queue is full,
/// `emit` blocks until the worker catches up. The worker also flushes the
/// target every `flush_interval`, even when idle.
///
/// # Example
///
/// ```no_run
/// use rust_channel_logger::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let file = Arc::new(FileHandler::new("/tmp/app.log").unwrap());
/// let queued = QueueHandler::new(file, 1024, Duration::from_millis(200)).unwrap();
/// ```
pub struct QueueHandler {
    core: HandlerCore,
    target: Arc<dyn Handler>,
    sender: Mutex<Option<Sender<Message>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl QueueHandler {
    /// Start the worker; `capacity` is the queue bound
    pub fn new(target: Arc<dyn Handler>, capacity: usize, flush_interval: Duration) -> Result<Self> {
        let (sender, receiver) = bounded(capacity.max(1));
        let worker_target = Arc::clone(&target);
        let worker = thread::Builder::new()
            .name(format!("log-queue-{}", target.name()))
            .spawn(move || Self::run(worker_target, receiver, flush_interval))
            .map_err(|e| LoggerError::io_operation("spawn queue worker", "Failed to start thread", e))?;

        Ok(Self {
            core: HandlerCore::new(format!("queue({})", target.name()), LogLevel::NOTSET),
            target,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn target(&self) -> &Arc<dyn Handler> {
        &self.target
    }

    /// Records waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.lock().as_ref().map_or(0, Sender::len)
    }

    fn run(target: Arc<dyn Handler>, receiver: Receiver<Message>, flush_interval: Duration) {
        let ticker = tick(flush_interval);
        loop {
            select! {
                recv(receiver) -> message => match message {
                    Ok(Message::Record(record)) => {
                        if record.level >= target.level() {
                            target.handle(&record);
                        }
                    }
                    Ok(Message::Flush(ack)) => {
                        let _ = ack.send(target.flush());
                    }
                    // stop signal or every sender dropped
                    Ok(Message::Stop) | Err(_) => break,
                },
                recv(ticker) -> _ => {
                    if let Err(e) = target.flush() {
                        eprintln!("[LOGGER ERROR] Queue worker failed to flush '{}': {}", target.name(), e);
                    }
                }
            }
        }
    }
}

impl Handler for QueueHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let sender = self.sender.lock().clone();
        let sender = sender.ok_or_else(|| LoggerError::HandlerClosed(self.name()))?;
        sender
            .send(Message::Record(Arc::clone(record)))
            .map_err(|_| LoggerError::HandlerClosed(self.name()))
    }

    /// Blocks until every record queued before the call has reached the
    /// target and the target is flushed
    fn flush(&self) -> Result<()> {
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            // worker already drained and stopped by close
            return self.target.flush();
        };
        let (ack, done) = bounded(1);
        sender
            .send(Message::Flush(ack))
            .map_err(|_| LoggerError::HandlerClosed(self.name()))?;
        done.recv()
            .map_err(|_| LoggerError::HandlerClosed(self.name()))?
    }

    /// Drain the queue, stop the worker, then flush and close the target
    fn close(&self) {
        if let Some(sender) = self.sender.lock().take() {
            // the worker drains everything queued before the stop signal
            let _ = sender.send(Message::Stop);
        }
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                eprintln!("[LOGGER ERROR] Queue worker of '{}' panicked", self.name());
            }
        }
        if let Err(e) = self.target.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush '{}' on close: {}", self.target.name(), e);
        }
        self.target.close();
    }
}

impl Drop for QueueHandler {
    fn drop(&mut self) {
        // Stop the worker even when close was never called
        if let Some(sender) = self.sender.get_mut().take() {
            let _ = sender.send(Message::Stop);
        }
        if let Some(worker) = self.worker.get_mut().take() {
            let _ = worker.join();
        }
    }
}
