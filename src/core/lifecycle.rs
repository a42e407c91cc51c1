//! Lifecycle binding: the shutdown hook handed to the host application

use super::{
    error::Result,
    worker::{DrainWorker, WorkerState},
};
use std::time::Duration;

/// Token whose [`stop`](ShutdownHandle::stop) is registered with the host's
/// shutdown sequence.
///
/// Stopping through the handle returns only once every record queued at the
/// time of the call has been dispatched. Calling it on a relay that was never
/// started, or more than once, is a no-op.
///
/// # Example
///
/// ```
/// use log_relay::prelude::*;
///
/// let registry = LoggerRegistry::new();
/// let relay = Relay::builder()
///     .logger_name("app")
///     .sink(MemorySink::new())
///     .build(&registry)
///     .unwrap();
///
/// let shutdown = relay.start().unwrap();
/// registry.get_logger("app").info("handled in the background");
///
/// shutdown.stop().unwrap();
/// assert_eq!(shutdown.state(), WorkerState::Stopped);
/// ```
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    worker: DrainWorker,
}

impl ShutdownHandle {
    pub(crate) fn new(worker: DrainWorker) -> Self {
        Self { worker }
    }

    /// Stop the relay, waiting without limit for the final drain
    pub fn stop(&self) -> Result<()> {
        self.worker.stop()
    }

    /// Stop the relay, giving up after `timeout`
    pub fn stop_timeout(&self, timeout: Duration) -> Result<()> {
        self.worker.stop_timeout(timeout)
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Adapt the handle to a host callback that receives an application
    /// context value. The context is ignored.
    pub fn lifespan_hook<A>(&self) -> impl Fn(&A) -> Result<()> + Send + Sync + 'static {
        let handle = self.clone();
        move |_app: &A| handle.stop()
    }

    /// Stop the relay from async code without blocking the runtime
    #[cfg(feature = "async-hooks")]
    pub async fn stop_async(&self) -> Result<()> {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || handle.stop())
            .await
            .map_err(|e| super::error::RelayError::worker_panicked(e.to_string()))?
    }
}
