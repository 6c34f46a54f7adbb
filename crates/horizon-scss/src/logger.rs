//! Log sinks the compiler reports through.

use std::sync::Arc;

use parking_lot::Mutex;

/// Receives compiler messages.
///
/// Errors are also kept so the host can decide after a compile whether it
/// failed.
pub trait Logger: Send + Sync {
    /// Informational message.
    fn log(&self, message: &str);

    /// Non-fatal problem.
    fn warning(&self, message: &str);

    /// Fatal problem.
    fn error(&self, message: &str);

    /// Every error reported so far.
    fn errors(&self) -> Vec<String>;
}

/// Forwards messages to `tracing` and remembers errors.
#[derive(Debug, Default)]
pub struct TracingLogger {
    errors: Mutex<Vec<String>>,
}

impl TracingLogger {
    /// Create a logger with no recorded errors.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::debug!(target: "horizon_scss", "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(target: "horizon_scss", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "horizon_scss", "{}", message);
        self.errors.lock().push(message.to_string());
    }

    fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

/// Severity of a recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Log,
    Warning,
    Error,
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Records every message in memory.
///
/// Clones share the same record, so a host can keep one handle and give
/// another to the compiler.
#[derive(Debug, Clone, Default)]
pub struct CollectingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CollectingLogger {
    /// Create an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, level: LogLevel, message: &str) {
        self.entries.lock().push(LogEntry {
            level,
            message: message.to_string(),
        });
    }

    /// All messages in the order they were reported.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Messages of one level.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Recorded warnings.
    pub fn warnings(&self) -> Vec<String> {
        self.messages(LogLevel::Warning)
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for CollectingLogger {
    fn log(&self, message: &str) {
        self.record(LogLevel::Log, message);
    }

    fn warning(&self, message: &str) {
        self.record(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }

    fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }
}
