//! TCP handler shipping records as JSON lines

use crate::core::{ErrorRetry, Handler, HandlerCore, LogLevel, LogRecord, LoggerError, Result, Retry};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

/// Timeout for a single connection attempt
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
/// Initial pause between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Connection attempts stop once this much time has passed
pub const DEFAULT_RETRY_DEADLINE: Duration = Duration::from_secs(30);

/// One record on the wire
#[derive(Debug, Serialize)]
pub struct WireRecord<'a> {
    pub name: &'a str,
    pub level: u8,
    pub levelname: String,
    pub created: String,
    pub pathname: &'a str,
    pub filename: &'a str,
    pub lineno: u32,
    pub funcname: &'a str,
    pub thread: &'a str,
    pub message: &'a str,
    /// The record as rendered by the handler's formatter
    pub formatted: String,
}

impl<'a> WireRecord<'a> {
    pub fn new(record: &'a LogRecord, formatted: String) -> Self {
        Self {
            name: &record.name,
            level: record.level.value(),
            levelname: record.level.name(),
            created: record.created.to_rfc3339(),
            pathname: &record.caller.path_name,
            filename: &record.caller.file_name,
            lineno: record.caller.line_no,
            funcname: &record.caller.func_name,
            thread: record.thread_label(),
            message: record.message(),
            formatted,
        }
    }
}

/// Sends every record as one JSON object per line over TCP.
///
/// The connection is opened lazily on the first emit, retrying through an
/// [`ErrorRetry`] policy. A failed send drops the connection so the next
/// emit reconnects.
///
/// # Example
///
/// ```no_run
/// use rust_channel_logger::handlers::SocketHandler;
///
/// let handler = SocketHandler::new("127.0.0.1", 9020);
/// ```
pub struct SocketHandler {
    core: HandlerCore,
    host: String,
    port: u16,
    connect_timeout: Duration,
    retry: Arc<dyn Retry>,
    conn: Mutex<Option<TcpStream>>,
}

impl SocketHandler {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let retry = ErrorRetry::new()
            .with_delay(DEFAULT_RETRY_DELAY)
            .with_deadline(DEFAULT_RETRY_DEADLINE)
            .on_error(|e| matches!(e, LoggerError::IoError(_) | LoggerError::IoOperation { .. }));
        Self {
            core: HandlerCore::new(format!("{}:{}", host, port), LogLevel::NOTSET),
            host,
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry: Arc::new(retry),
            conn: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: Arc<dyn Retry>) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.conn.lock().is_some()
    }

    fn connect_once(&self) -> Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        let mut last = None;
        for addr in &addrs {
            match TcpStream::connect_timeout(addr, self.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last = Some(e),
            }
        }
        Err(match last {
            Some(e) => LoggerError::io_operation("connect", format!("Failed to connect to {}", self.address()), e),
            None => LoggerError::other(format!("{} resolved to no address", self.address())),
        })
    }

    fn connect(&self) -> Result<TcpStream> {
        let mut connected = None;
        self.retry.run(&mut || {
            connected = Some(self.connect_once()?);
            Ok(())
        })?;
        connected.ok_or_else(|| LoggerError::other("connection attempt produced no stream"))
    }

    /// Serialize `record` as a newline-terminated JSON object
    pub fn marshal(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let wire = WireRecord::new(record, self.format(record));
        let mut bytes = serde_json::to_vec(&wire)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Handler for SocketHandler {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn emit(&self, record: &Arc<LogRecord>) -> Result<()> {
        let bytes = self.marshal(record)?;
        let mut conn = self.conn.lock();
        if conn.is_none() {
            *conn = Some(self.connect()?);
        }
        match conn.as_mut() {
            Some(stream) => Ok(stream.write_all(&bytes)?),
            None => Err(LoggerError::HandlerClosed(self.name())),
        }
    }

    /// Drop the connection; the next emit reconnects
    fn handle_error(&self, _record: &Arc<LogRecord>, _error: &LoggerError) {
        self.conn.lock().take();
    }

    fn flush(&self) -> Result<()> {
        if let Some(stream) = self.conn.lock().as_mut() {
            stream.flush()?;
        }
        Ok(())
    }

    fn close(&self) {
        self.conn.lock().take();
    }
}
