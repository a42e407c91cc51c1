//! When an error attached to a record is logged with its full trace
//!
//! Decision order for a record carrying an [`ErrorReport`]:
//! 1. a matching [`TraceExclusion`] always omits the trace;
//! 2. otherwise a configured [`TraceClassifier`] decides;
//! 3. otherwise [`LogExceptions`] decides, using the logger threshold for
//!    `OnlyWhenDebugEnabled`.

use super::{
    error::Result,
    log_level::LogLevel,
    record::{ErrorReport, LogRecord},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Base policy for attaching trace information to error records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogExceptions {
    #[default]
    Always,
    /// Only while the target logger's threshold is at or below debug
    #[serde(rename = "debug", alias = "only_when_debug_enabled")]
    OnlyWhenDebugEnabled,
    Never,
}

impl fmt::Display for LogExceptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogExceptions::Always => write!(f, "always"),
            LogExceptions::OnlyWhenDebugEnabled => write!(f, "debug"),
            LogExceptions::Never => write!(f, "never"),
        }
    }
}

/// An error that never gets its trace logged, by status code or by kind.
///
/// Deserializes from a bare JSON number (status code) or string (kind), so a
/// config can say `"disable_stack_trace": [404, "ValidationError"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceExclusion {
    StatusCode(u16),
    ErrorKind(String),
}

impl TraceExclusion {
    pub fn matches(&self, report: &ErrorReport) -> bool {
        match self {
            TraceExclusion::StatusCode(code) => report.status_code == Some(*code),
            TraceExclusion::ErrorKind(kind) => report.kind == *kind,
        }
    }
}

impl From<u16> for TraceExclusion {
    fn from(code: u16) -> Self {
        TraceExclusion::StatusCode(code)
    }
}

impl From<&str> for TraceExclusion {
    fn from(kind: &str) -> Self {
        TraceExclusion::ErrorKind(kind.to_string())
    }
}

impl From<String> for TraceExclusion {
    fn from(kind: String) -> Self {
        TraceExclusion::ErrorKind(kind)
    }
}

/// Custom include/omit decision for a record's trace
pub type TraceClassifier = Arc<dyn Fn(&LogRecord, &ErrorReport) -> bool + Send + Sync>;

/// Replaces dispatch to sinks for records that carry an error.
///
/// Receives the record and, when the policy includes it, the trace text.
pub type ExceptionLoggingHandler =
    Arc<dyn Fn(&LogRecord, Option<&str>) -> Result<()> + Send + Sync>;

/// Immutable trace-inclusion policy read by the drain worker
#[derive(Clone, Default)]
pub struct ExceptionPolicy {
    log_exceptions: LogExceptions,
    disable_stack_trace: HashSet<TraceExclusion>,
    classifier: Option<TraceClassifier>,
}

impl ExceptionPolicy {
    pub fn new(log_exceptions: LogExceptions) -> Self {
        Self {
            log_exceptions,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_exclusion(mut self, exclusion: impl Into<TraceExclusion>) -> Self {
        self.disable_stack_trace.insert(exclusion.into());
        self
    }

    #[must_use]
    pub fn with_exclusions<I>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = TraceExclusion>,
    {
        self.disable_stack_trace.extend(exclusions);
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: TraceClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn log_exceptions(&self) -> LogExceptions {
        self.log_exceptions
    }

    pub fn exclusions(&self) -> &HashSet<TraceExclusion> {
        &self.disable_stack_trace
    }

    pub fn is_excluded(&self, report: &ErrorReport) -> bool {
        self.disable_stack_trace.iter().any(|e| e.matches(report))
    }

    /// Whether `record`'s error should keep its trace, given the threshold
    /// of the logger the record was emitted on. Records without an error
    /// never include a trace.
    pub fn should_include_trace(&self, record: &LogRecord, logger_threshold: LogLevel) -> bool {
        let Some(report) = record.error.as_ref() else {
            return false;
        };

        if self.is_excluded(report) {
            return false;
        }

        if let Some(ref classifier) = self.classifier {
            return classifier(record, report);
        }

        match self.log_exceptions {
            LogExceptions::Always => true,
            LogExceptions::Never => false,
            LogExceptions::OnlyWhenDebugEnabled => logger_threshold <= LogLevel::Debug,
        }
    }
}

impl fmt::Debug for ExceptionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionPolicy")
            .field("log_exceptions", &self.log_exceptions)
            .field("disable_stack_trace", &self.disable_stack_trace)
            .field("classifier", &self.classifier.is_some())
            .finish()
    }
}
