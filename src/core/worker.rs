//! Drain worker: the background thread that empties the relay queue

use super::{
    adapter::Installation,
    diagnostics::Diagnostics,
    error::{panic_message, RelayError, Result},
    exception_policy::{ExceptionLoggingHandler, ExceptionPolicy},
    logger::LoggerHandle,
    metrics::RelayMetrics,
    queue::{Popped, RelayQueue},
    record::LogRecord,
    sink::{self, SinkHandler},
};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Running,
    /// Stop requested; the worker is finishing the records queued at that moment
    Stopping,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Stopped => write!(f, "Stopped"),
            WorkerState::Running => write!(f, "Running"),
            WorkerState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Per-record dispatch: exception policy, then sinks or the exception handler
pub(crate) struct Dispatcher {
    sinks: Mutex<Vec<Box<dyn SinkHandler>>>,
    policy: ExceptionPolicy,
    exception_handler: Option<ExceptionLoggingHandler>,
    logger: LoggerHandle,
    metrics: Arc<RelayMetrics>,
    diagnostics: Diagnostics,
}

impl Dispatcher {
    pub(crate) fn new(
        sinks: Vec<Box<dyn SinkHandler>>,
        policy: ExceptionPolicy,
        exception_handler: Option<ExceptionLoggingHandler>,
        logger: LoggerHandle,
        metrics: Arc<RelayMetrics>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            sinks: Mutex::new(sinks),
            policy,
            exception_handler,
            logger,
            metrics,
            diagnostics,
        }
    }

    fn dispatch(&self, record: LogRecord) {
        let record = if record.has_error() {
            self.apply_exception_policy(record)
        } else {
            record
        };

        if record.has_error() {
            if let Some(ref handler) = self.exception_handler {
                self.run_exception_handler(handler, &record);
                self.metrics.record_dispatched();
                return;
            }
        }

        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            if let Err(e) = sink::offer(sink.as_mut(), &record) {
                self.fail(&e);
            }
        }
        self.metrics.record_dispatched();
    }

    fn apply_exception_policy(&self, record: LogRecord) -> LogRecord {
        if self.policy.should_include_trace(&record, self.logger.level()) {
            return record;
        }
        if record.trace().is_some() {
            self.metrics.record_trace_suppressed();
        }
        record.without_trace()
    }

    fn run_exception_handler(&self, handler: &ExceptionLoggingHandler, record: &LogRecord) {
        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(record, record.trace())));

        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(panic_info) => format!("panicked: {}", panic_message(panic_info.as_ref())),
        };
        self.fail(&RelayError::ExceptionHandlerFailed { message: failure });
    }

    fn flush(&self) {
        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            if let Err(e) = sink::flush_isolated(sink.as_mut()) {
                self.fail(&e);
            }
        }
    }

    fn fail(&self, err: &RelayError) {
        self.metrics.record_sink_failure();
        self.diagnostics.report(err);
    }
}

/// Body of the worker thread
fn run(queue: Arc<RelayQueue>, dispatcher: Arc<Dispatcher>, stop: Receiver<()>) {
    loop {
        match queue.pop(&stop) {
            Popped::Record(record) => {
                dispatcher.dispatch(record);
                if queue.is_empty() {
                    dispatcher.flush();
                }
            }
            Popped::Stop => break,
        }
    }

    for record in queue.drain_remaining() {
        dispatcher.dispatch(record);
    }
    dispatcher.flush();
}

#[derive(Default)]
struct WorkerSlot {
    handle: Option<thread::JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
}

struct WorkerControl {
    logger_name: String,
    state: RwLock<WorkerState>,
    /// Held for the whole of every start/stop, so transitions never interleave
    slot: Mutex<WorkerSlot>,
    /// Id of the running worker thread, readable without `slot`
    worker_thread: RwLock<Option<ThreadId>>,
    queue: Arc<RelayQueue>,
    dispatcher: Arc<Dispatcher>,
    /// Adapter binding undone when the last handle drops
    installation: Mutex<Option<Installation>>,
}

impl WorkerControl {
    /// Start/stop from a sink or exception handler runs on the worker thread,
    /// which can neither join itself nor wait on `slot` while a concurrent
    /// stop holds it to join this thread.
    fn reject_worker_thread(&self, operation: &'static str) -> Result<()> {
        if *self.worker_thread.read() == Some(thread::current().id()) {
            return Err(RelayError::CalledFromWorker {
                logger: self.logger_name.clone(),
                operation,
            });
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.reject_worker_thread("start")?;
        let mut slot = self.slot.lock();
        if slot.handle.is_some() {
            return Err(RelayError::already_running(&self.logger_name));
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let queue = Arc::clone(&self.queue);
        let dispatcher = Arc::clone(&self.dispatcher);

        let handle = thread::Builder::new()
            .name(format!("log-relay-{}", self.logger_name))
            .spawn(move || run(queue, dispatcher, stop_rx))
            .map_err(|source| RelayError::WorkerSpawn { source })?;

        *self.worker_thread.write() = Some(handle.thread().id());
        slot.handle = Some(handle);
        slot.stop_tx = Some(stop_tx);
        *self.state.write() = WorkerState::Running;
        Ok(())
    }

    /// Signal the worker and wait for it; `None` waits without limit
    fn stop(&self, timeout: Option<Duration>) -> Result<()> {
        self.reject_worker_thread("stop")?;
        let mut slot = self.slot.lock();
        // The worker may have called in before `start` recorded its id
        if let Some(ref handle) = slot.handle {
            if handle.thread().id() == thread::current().id() {
                return Err(RelayError::CalledFromWorker {
                    logger: self.logger_name.clone(),
                    operation: "stop",
                });
            }
        }
        let Some(handle) = slot.handle.take() else {
            return Ok(());
        };

        *self.state.write() = WorkerState::Stopping;
        drop(slot.stop_tx.take());

        if let Some(timeout) = timeout {
            let start = Instant::now();
            while !handle.is_finished() {
                if start.elapsed() >= timeout {
                    slot.handle = Some(handle);
                    return Err(RelayError::ShutdownTimedOut { timeout });
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        let joined = handle.join();
        *self.worker_thread.write() = None;
        *self.state.write() = WorkerState::Stopped;
        joined.map_err(|payload| RelayError::worker_panicked(panic_message(payload.as_ref())))
    }
}

impl Drop for WorkerControl {
    fn drop(&mut self) {
        if let Err(e) = self.stop(None) {
            self.dispatcher.diagnostics.report(&e);
        }

        if let Some(installation) = self.installation.lock().take() {
            installation.uninstall();
        }

        let pending = self.queue.len();
        if pending > 0 {
            eprintln!(
                "[RELAY WARNING] Relay for '{}' dropped with {} undispatched records",
                self.logger_name, pending
            );
        }
    }
}

/// Handle to the single background thread draining one relay queue.
///
/// Clones share the same thread and state. When the last clone is dropped
/// a running worker is stopped, draining what was queued, and the relay's
/// adapter is detached from its logger.
#[derive(Clone)]
pub struct DrainWorker {
    control: Arc<WorkerControl>,
}

impl DrainWorker {
    pub(crate) fn new(
        logger_name: impl Into<String>,
        queue: Arc<RelayQueue>,
        dispatcher: Dispatcher,
        installation: Option<Installation>,
    ) -> Self {
        Self {
            control: Arc::new(WorkerControl {
                logger_name: logger_name.into(),
                state: RwLock::new(WorkerState::Stopped),
                slot: Mutex::new(WorkerSlot::default()),
                worker_thread: RwLock::new(None),
                queue,
                dispatcher: Arc::new(dispatcher),
                installation: Mutex::new(installation),
            }),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.control.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Spawn the worker thread.
    ///
    /// Fails with [`RelayError::AlreadyRunning`] unless the worker is
    /// stopped; a second thread is never spawned.
    pub fn start(&self) -> Result<()> {
        self.control.start()
    }

    /// Stop the worker after it has dispatched every record queued at the
    /// time of the call. Waits without limit. No-op when already stopped.
    ///
    /// Fails with [`RelayError::CalledFromWorker`] when called from a sink
    /// or exception handler, leaving the worker running.
    pub fn stop(&self) -> Result<()> {
        self.control.stop(None)
    }

    /// Like [`stop`](DrainWorker::stop) but gives up after `timeout`,
    /// leaving the worker in [`WorkerState::Stopping`]. A later `stop`
    /// completes the shutdown.
    pub fn stop_timeout(&self, timeout: Duration) -> Result<()> {
        self.control.stop(Some(timeout))
    }
}

impl fmt::Debug for DrainWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrainWorker")
            .field("logger", &self.control.logger_name)
            .field("state", &self.state())
            .finish()
    }
}
