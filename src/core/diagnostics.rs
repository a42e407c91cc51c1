//! Fallback channel for the relay's own failures
//!
//! Sink failures cannot be logged through the relay itself, so they go to
//! stderr and, optionally, to a user callback.

use super::error::RelayError;
use std::sync::Arc;

/// Callback invoked for every failure reported on the diagnostic channel
pub type DiagnosticCallback = Arc<dyn Fn(&RelayError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Diagnostics {
    callback: Option<DiagnosticCallback>,
}

impl Diagnostics {
    pub fn new(callback: Option<DiagnosticCallback>) -> Self {
        Self { callback }
    }

    pub fn report(&self, err: &RelayError) {
        let prefix = match err {
            RelayError::SinkPanicked { .. } | RelayError::WorkerPanicked { .. } => {
                "RELAY CRITICAL"
            }
            RelayError::ShutdownTimedOut { .. } => "RELAY WARNING",
            _ => "RELAY ERROR",
        };
        eprintln!("[{}] {}", prefix, err);

        if let Some(ref callback) = self.callback {
            callback(err);
        }
    }
}
