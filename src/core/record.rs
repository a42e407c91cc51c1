//! Log record and attached error report

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::fmt::Write as _;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Error details carried alongside a record
///
/// `kind` and `status_code` are what trace-exclusion rules match on;
/// `trace` is the detailed context that the exception policy decides
/// whether to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl ErrorReport {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            status_code: None,
            trace: None,
        }
    }

    /// Build a report from an error value.
    ///
    /// The kind is the short type name of `E`. The trace lists the
    /// `source()` chain, followed by a backtrace when `RUST_BACKTRACE`
    /// enables capture.
    ///
    /// For a trait object (`&*boxed` from a `Box<dyn Error>`) the concrete
    /// type is unknown and the kind is just `Error`; use
    /// [`from_dyn_error`](ErrorReport::from_dyn_error) to name it.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::build(short_type_name(std::any::type_name::<E>()), err)
    }

    /// Build a report from a type-erased error with a caller-chosen kind
    pub fn from_dyn_error(kind: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::build(kind.into(), err)
    }

    fn build<E>(kind: String, err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let message = err.to_string();

        let mut trace = format!("{}: {}", kind, message);
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(trace, "\n  caused by: {}", cause);
            source = cause.source();
        }
        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            let _ = write!(trace, "\nstack backtrace:\n{}", backtrace);
        }

        Self {
            kind,
            message,
            status_code: None,
            trace: Some(trace),
        }
    }

    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }
}

/// `core::num::error::ParseIntError` -> `ParseIntError`
fn short_type_name(full: &str) -> String {
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    /// Name of the logger that produced the record
    pub logger: String,
    pub timestamp: DateTime<Utc>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub module_path: Option<String>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(logger: impl Into<String>, level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            logger: logger.into(),
            timestamp: Utc::now(),
            file: None,
            line: None,
            module_path: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            context: None,
            error: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self.module_path = Some(module_path.to_string());
        self
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_error(mut self, error: ErrorReport) -> Self {
        self.error = Some(error);
        self
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error's trace text, if the record carries one
    pub fn trace(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.trace.as_deref())
    }

    /// Same record with the error's trace removed
    pub(crate) fn without_trace(mut self) -> Self {
        if let Some(ref mut error) = self.error {
            error.trace = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("core::num::error::ParseIntError"), "ParseIntError");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
        assert_eq!(short_type_name("dyn core::error::Error"), "Error");
    }

    #[test]
    fn test_report_from_error_walks_source_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out"));
        let report = ErrorReport::from_error(&err);

        assert_eq!(report.kind, "Outer");
        assert_eq!(report.message, "request failed");
        let trace = report.trace.expect("trace captured");
        assert!(trace.starts_with("Outer: request failed"));
        assert!(trace.contains("caused by: upstream timed out"));
    }

    #[test]
    fn test_report_from_boxed_dyn_error() {
        let boxed: Box<dyn std::error::Error> = Box::new(Outer(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such row",
        )));

        let anonymous = ErrorReport::from_error(&*boxed);
        assert_eq!(anonymous.kind, "Error");
        assert_eq!(anonymous.message, "request failed");
        assert!(anonymous.trace.unwrap().contains("caused by: no such row"));

        let named = ErrorReport::from_dyn_error("DatabaseError", boxed.as_ref());
        assert_eq!(named.kind, "DatabaseError");
        assert!(named.trace.unwrap().starts_with("DatabaseError: request failed"));
    }

    #[test]
    fn test_without_trace_keeps_error_details() {
        let record = LogRecord::new("app", LogLevel::Error, "boom").with_error(
            ErrorReport::new("Timeout", "slow")
                .with_status(504)
                .with_trace("Timeout: slow"),
        );
        assert_eq!(record.trace(), Some("Timeout: slow"));

        let stripped = record.without_trace();
        let error = stripped.error.expect("error kept");
        assert_eq!(error.status_code, Some(504));
        assert!(error.trace.is_none());
    }

    #[test]
    fn test_message_is_sanitized() {
        let record = LogRecord::new("app", LogLevel::Info, "a\nb\tc");
        assert_eq!(record.message, "a\\nb\\tc");
        assert_eq!(record.logger, "app");
    }
}
