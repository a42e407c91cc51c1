//! Named loggers, their handlers, and the registry that hands them out

use super::{
    error::RelayError,
    log_context::LogContext,
    log_level::LogLevel,
    record::{ErrorReport, LogRecord},
    sink::{self, SinkHandler},
};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Something attached to a logger that receives every record it emits
pub trait LogHandler: Send + Sync {
    fn emit(&self, record: LogRecord);
    fn name(&self) -> &str;
}

/// Handles records inline on the emitting thread by forwarding to a sink.
///
/// This is the ordinary, synchronous way of attaching a sink to a logger;
/// installing a relay replaces these handlers.
pub struct SyncHandler {
    name: String,
    sink: Mutex<Box<dyn SinkHandler>>,
}

impl SyncHandler {
    pub fn new<S: SinkHandler + 'static>(sink: S) -> Self {
        Self {
            name: format!("sync:{}", sink.name()),
            sink: Mutex::new(Box::new(sink)),
        }
    }
}

impl LogHandler for SyncHandler {
    fn emit(&self, record: LogRecord) {
        let mut sink = self.sink.lock();
        if let Err(e) = sink::offer(sink.as_mut(), &record) {
            let prefix = match e {
                RelayError::SinkPanicked { .. } => "RELAY CRITICAL",
                _ => "RELAY ERROR",
            };
            eprintln!("[{}] {} (sync)", prefix, e);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct LoggerInner {
    name: String,
    level: RwLock<LogLevel>,
    handlers: RwLock<Vec<Arc<dyn LogHandler>>>,
}

/// Shared handle to a named logger.
///
/// Cloning is cheap; all clones refer to the same threshold and handler list.
#[derive(Clone)]
pub struct LoggerHandle {
    inner: Arc<LoggerInner>,
}

impl LoggerHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: RwLock::new(LogLevel::Info),
                handlers: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn level(&self) -> LogLevel {
        *self.inner.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.inner.level.write() = level;
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.level().admits(level)
    }

    /// Snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<Arc<dyn LogHandler>> {
        self.inner.handlers.read().clone()
    }

    pub fn add_handler(&self, handler: Arc<dyn LogHandler>) {
        self.inner.handlers.write().push(handler);
    }

    /// Detach `handler`; returns whether it was attached
    pub fn remove_handler(&self, handler: &Arc<dyn LogHandler>) -> bool {
        let mut handlers = self.inner.handlers.write();
        let before = handlers.len();
        handlers.retain(|h| !same_handler(h, handler));
        handlers.len() != before
    }

    /// Atomically detach every handler and attach `handler` as the only one.
    ///
    /// Returns the handlers that were detached.
    pub fn replace_handlers(&self, handler: Arc<dyn LogHandler>) -> Vec<Arc<dyn LogHandler>> {
        let mut handlers = self.inner.handlers.write();
        std::mem::replace(&mut *handlers, vec![handler])
    }

    /// Send a prebuilt record to every handler, bypassing the threshold
    pub fn emit(&self, record: LogRecord) {
        let handlers = self.handlers();
        if let Some((last, rest)) = handlers.split_last() {
            for handler in rest {
                handler.emit(record.clone());
            }
            last.emit(record);
        }
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.emit(LogRecord::new(self.name(), level, message));
    }

    /// Log with structured context fields
    pub fn log_with_context(&self, level: LogLevel, message: impl AsRef<str>, context: LogContext) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.emit(LogRecord::new(self.name(), level, message).with_context(context));
    }

    /// Log with an attached error report
    pub fn log_error(&self, level: LogLevel, message: impl AsRef<str>, error: ErrorReport) {
        if !self.is_enabled_for(level) {
            return;
        }
        self.emit(LogRecord::new(self.name(), level, message).with_error(error));
    }

    /// Log `err` at error level with its type, cause chain and backtrace.
    ///
    /// Accepts trait objects too, e.g. `logger.exception("failed", &*boxed)`.
    pub fn exception<E>(&self, message: impl AsRef<str>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        if !self.is_enabled_for(LogLevel::Error) {
            return;
        }
        self.log_error(LogLevel::Error, message, ErrorReport::from_error(err));
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }
}

impl fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .handlers()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        f.debug_struct("LoggerHandle")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("handlers", &names)
            .finish()
    }
}

fn same_handler(a: &Arc<dyn LogHandler>, b: &Arc<dyn LogHandler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Hands out one [`LoggerHandle`] per name.
///
/// A registry is an ordinary value owned by the host; there is no
/// process-wide instance.
#[derive(Default)]
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, LoggerHandle>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The logger called `name`, created on first request
    pub fn get_logger(&self, name: &str) -> LoggerHandle {
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }

        self.loggers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| LoggerHandle::new(name))
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;

    #[test]
    fn test_registry_returns_same_logger() {
        let registry = LoggerRegistry::new();
        let a = registry.get_logger("app");
        let b = registry.get_logger("app");

        a.set_level(LogLevel::Debug);
        assert_eq!(b.level(), LogLevel::Debug);
        assert!(registry.contains("app"));
        assert_eq!(registry.names(), vec!["app".to_string()]);
    }

    #[test]
    fn test_threshold_filters_before_record_creation() {
        let logger = LoggerHandle::new("app");
        let sink = MemorySink::new();
        logger.add_handler(Arc::new(SyncHandler::new(sink.clone())));

        logger.debug("hidden");
        logger.info("shown");

        assert_eq!(sink.messages(), vec!["shown".to_string()]);
    }

    #[test]
    fn test_remove_handler_by_identity() {
        let logger = LoggerHandle::new("app");
        let first: Arc<dyn LogHandler> = Arc::new(SyncHandler::new(MemorySink::new()));
        let second: Arc<dyn LogHandler> = Arc::new(SyncHandler::new(MemorySink::new()));
        logger.add_handler(Arc::clone(&first));
        logger.add_handler(Arc::clone(&second));

        assert!(logger.remove_handler(&first));
        assert!(!logger.remove_handler(&first));
        assert_eq!(logger.handlers().len(), 1);
    }

    #[test]
    fn test_replace_handlers_returns_detached() {
        let logger = LoggerHandle::new("app");
        logger.add_handler(Arc::new(SyncHandler::new(MemorySink::new())));
        logger.add_handler(Arc::new(SyncHandler::new(MemorySink::new())));

        let replacement: Arc<dyn LogHandler> = Arc::new(SyncHandler::new(MemorySink::new()));
        let removed = logger.replace_handlers(Arc::clone(&replacement));

        assert_eq!(removed.len(), 2);
        let handlers = logger.handlers();
        assert_eq!(handlers.len(), 1);
        assert!(same_handler(&handlers[0], &replacement));
    }

    #[test]
    fn test_exception_attaches_report() {
        let logger = LoggerHandle::new("app");
        let sink = MemorySink::new();
        logger.add_handler(Arc::new(SyncHandler::new(sink.clone())));

        let err = "abc".parse::<u32>().unwrap_err();
        logger.exception("bad input", &err);

        let records = sink.records();
        let error = records[0].error.as_ref().expect("error attached");
        assert_eq!(error.kind, "ParseIntError");
        assert_eq!(records[0].level, LogLevel::Error);
    }

    #[test]
    fn test_exception_accepts_boxed_error() {
        let logger = LoggerHandle::new("app");
        let sink = MemorySink::new();
        logger.add_handler(Arc::new(SyncHandler::new(sink.clone())));

        let boxed: Box<dyn std::error::Error + Send + Sync> =
            "abc".parse::<u32>().unwrap_err().into();
        logger.exception("bad input", &*boxed);

        let records = sink.records();
        let error = records[0].error.as_ref().expect("error attached");
        assert_eq!(error.message, "invalid digit found in string");
        assert!(error.trace.is_some());
    }
}
