//! Core relay types and traits

pub mod adapter;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod exception_policy;
pub mod lifecycle;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod overflow_policy;
pub mod queue;
pub mod record;
pub mod relay;
pub mod sink;
pub mod timestamp;
pub mod worker;

pub use adapter::QueueHandler;
pub use config::{RelayConfig, DEFAULT_LOGGER_NAME};
pub use diagnostics::DiagnosticCallback;
pub use error::{RelayError, Result};
pub use exception_policy::{
    ExceptionLoggingHandler, ExceptionPolicy, LogExceptions, TraceClassifier, TraceExclusion,
};
pub use lifecycle::ShutdownHandle;
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use logger::{LogHandler, LoggerHandle, LoggerRegistry, SyncHandler};
pub use metrics::RelayMetrics;
pub use output_format::{format_json, format_text, OutputFormat};
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use queue::{Popped, RelayQueue};
pub use record::{ErrorReport, LogRecord};
pub use relay::{GetLogger, Relay, RelayBuilder};
pub use sink::SinkHandler;
pub use timestamp::TimestampFormat;
pub use worker::{DrainWorker, WorkerState};
