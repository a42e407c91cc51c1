//! Error types for the log relay

use std::time::Duration;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// `start()` called while the drain worker is already running
    #[error("Relay for logger '{logger}' is already running")]
    AlreadyRunning { logger: String },

    /// The drain worker thread could not be spawned
    #[error("Failed to spawn drain worker: {source}")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    /// The drain worker thread panicked and could not be joined cleanly
    #[error("Drain worker panicked: {message}")]
    WorkerPanicked { message: String },

    /// `start()` or `stop()` called on the drain worker's own thread
    #[error("{operation}() called from the drain worker of logger '{logger}'")]
    CalledFromWorker {
        logger: String,
        operation: &'static str,
    },

    /// The drain worker did not exit within the allotted time
    #[error("Drain worker did not finish within {timeout:?}")]
    ShutdownTimedOut { timeout: Duration },

    /// A sink returned an error while handling a record
    #[error("Sink '{sink}' failed: {message}")]
    SinkFailed { sink: String, message: String },

    /// A sink panicked while handling a record
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// The custom exception logging handler failed
    #[error("Exception logging handler failed: {message}")]
    ExceptionHandlerFailed { message: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RelayError {
    pub fn already_running(logger: impl Into<String>) -> Self {
        RelayError::AlreadyRunning {
            logger: logger.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn sink_failed(sink: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::SinkFailed {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        RelayError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn worker_panicked(message: impl Into<String>) -> Self {
        RelayError::WorkerPanicked {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        RelayError::Other(msg.into())
    }

    /// Whether this error came out of a sink or the exception handler
    /// rather than the relay's own lifecycle.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            RelayError::SinkFailed { .. }
                | RelayError::SinkPanicked { .. }
                | RelayError::ExceptionHandlerFailed { .. }
        )
    }
}

/// Extract a printable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
