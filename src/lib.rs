//! # Log Relay
//!
//! Moves log I/O off the calling thread. A relay swaps a logger's handlers
//! for a single enqueue adapter and runs a background drain worker that
//! hands every queued record to the real sinks, in order.
//!
//! ## Features
//!
//! - **Non-blocking emit**: producers only push onto a queue
//! - **Ordered, lossless shutdown**: stopping drains everything queued first
//! - **Exception policy**: per-status and per-kind control over error traces
//! - **Fault isolation**: a failing or panicking sink never takes down the worker
//!
//! ## Example
//!
//! ```
//! use log_relay::prelude::*;
//!
//! let registry = LoggerRegistry::new();
//! let sink = MemorySink::new();
//!
//! let shutdown = Relay::builder()
//!     .logger_name("api")
//!     .sink(sink.clone())
//!     .configure_logger(&registry)
//!     .unwrap();
//!
//! let logger = registry.get_logger("api");
//! log_relay::info!(logger, "listening on port {}", 8080);
//!
//! shutdown.stop().unwrap();
//! assert_eq!(sink.messages(), vec!["listening on port 8080"]);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
    pub use crate::sinks::MemorySink;
    pub use crate::core::{
        ErrorReport, FieldValue, LogContext, LogExceptions, LogHandler, LogLevel, LogRecord,
        LoggerHandle, LoggerRegistry, OutputFormat, OverflowPolicy, Relay, RelayBuilder,
        RelayConfig, RelayError, RelayMetrics, Result, ShutdownHandle, SinkHandler,
        SyncHandler, TimestampFormat, TraceExclusion, WorkerState,
    };
}

#[cfg(feature = "console")]
pub use sinks::ConsoleSink;
#[cfg(feature = "file")]
pub use sinks::FileSink;
pub use sinks::MemorySink;
pub use core::{
    DiagnosticCallback, DrainWorker, ErrorReport, ExceptionLoggingHandler, ExceptionPolicy,
    FieldValue, GetLogger, LogContext, LogExceptions, LogHandler, LogLevel, LogRecord,
    LoggerHandle, LoggerRegistry, OutputFormat, OverflowCallback, OverflowPolicy, QueueHandler,
    Relay, RelayBuilder, RelayConfig, RelayError, RelayMetrics, RelayQueue, Result,
    ShutdownHandle, SinkHandler, SyncHandler, TimestampFormat, TraceClassifier, TraceExclusion,
    WorkerState, DEFAULT_LOGGER_NAME,
};
