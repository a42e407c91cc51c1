//! The assembled relay and its builder

use super::{
    adapter::{Installation, QueueHandler},
    config::RelayConfig,
    diagnostics::{DiagnosticCallback, Diagnostics},
    error::Result,
    exception_policy::{
        ExceptionLoggingHandler, ExceptionPolicy, LogExceptions, TraceClassifier, TraceExclusion,
    },
    lifecycle::ShutdownHandle,
    logger::{LoggerHandle, LoggerRegistry},
    metrics::RelayMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    queue::RelayQueue,
    sink::SinkHandler,
    worker::{Dispatcher, DrainWorker, WorkerState},
};
use std::sync::Arc;

/// Factory used to look up the logger a relay attaches to
pub type GetLogger = Arc<dyn Fn(&str) -> LoggerHandle + Send + Sync>;

/// Queue, enqueue adapter and drain worker for one logger.
///
/// Building a relay installs its adapter on the logger right away, so records
/// emitted before [`start`](Relay::start) are queued, not lost. Once the relay
/// and every [`ShutdownHandle`] are dropped, the worker is stopped, the adapter
/// is detached and the logger gets its previous handlers back.
pub struct Relay {
    logger: LoggerHandle,
    queue: Arc<RelayQueue>,
    adapter: Arc<QueueHandler>,
    worker: DrainWorker,
    metrics: Arc<RelayMetrics>,
}

impl Relay {
    /// Create a builder for Relay
    #[must_use]
    pub fn builder() -> RelayBuilder {
        RelayBuilder::new()
    }

    /// Start draining in the background and return the shutdown hook
    pub fn start(&self) -> Result<ShutdownHandle> {
        self.worker.start()?;
        Ok(self.shutdown_handle())
    }

    /// The shutdown hook, usable whether or not the relay was started
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.worker.clone())
    }

    pub fn stop(&self) -> Result<()> {
        self.worker.stop()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn logger(&self) -> &LoggerHandle {
        &self.logger
    }

    pub fn queue(&self) -> &Arc<RelayQueue> {
        &self.queue
    }

    pub fn adapter(&self) -> &Arc<QueueHandler> {
        &self.adapter
    }

    pub fn worker(&self) -> &DrainWorker {
        &self.worker
    }

    /// Get the relay metrics for detailed observability
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }
}

/// Builder for constructing a [`Relay`] with a fluent API
///
/// # Example
/// ```
/// use log_relay::prelude::*;
///
/// let registry = LoggerRegistry::new();
/// let relay = Relay::builder()
///     .logger_name("api")
///     .log_exceptions(LogExceptions::OnlyWhenDebugEnabled)
///     .disable_stack_trace(404_u16)
///     .sink(MemorySink::new().with_threshold(LogLevel::Warn))
///     .build(&registry)
///     .unwrap();
///
/// assert_eq!(relay.logger().name(), "api");
/// assert_eq!(relay.state(), WorkerState::Stopped);
/// ```
pub struct RelayBuilder {
    config: RelayConfig,
    sinks: Vec<Box<dyn SinkHandler>>,
    get_logger: Option<GetLogger>,
    exception_logging_handler: Option<ExceptionLoggingHandler>,
    classifier: Option<TraceClassifier>,
    on_diagnostic: Option<DiagnosticCallback>,
    on_overflow: Option<OverflowCallback>,
}

impl RelayBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
            sinks: Vec::new(),
            get_logger: None,
            exception_logging_handler: None,
            classifier: None,
            on_diagnostic: None,
            on_overflow: None,
        }
    }

    /// Replace all serializable settings at once
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.config.logger_name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_exceptions(mut self, policy: LogExceptions) -> Self {
        self.config.log_exceptions = policy;
        self
    }

    /// Never log traces for this status code or error kind
    #[must_use = "builder methods return a new value"]
    pub fn disable_stack_trace(mut self, exclusion: impl Into<TraceExclusion>) -> Self {
        self.config.disable_stack_trace.insert(exclusion.into());
        self
    }

    /// Bound the queue; see [`overflow_policy`](RelayBuilder::overflow_policy)
    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Add a sink
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: SinkHandler + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_sink(mut self, sink: Box<dyn SinkHandler>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Look loggers up through `factory` instead of the registry
    #[must_use = "builder methods return a new value"]
    pub fn get_logger(mut self, factory: GetLogger) -> Self {
        self.get_logger = Some(factory);
        self
    }

    /// Route records carrying an error to `handler` instead of the sinks
    #[must_use = "builder methods return a new value"]
    pub fn exception_logging_handler(mut self, handler: ExceptionLoggingHandler) -> Self {
        self.exception_logging_handler = Some(handler);
        self
    }

    /// Decide trace inclusion with `classifier` instead of `log_exceptions`
    #[must_use = "builder methods return a new value"]
    pub fn trace_classifier(mut self, classifier: TraceClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Also send sink failures to `callback`
    #[must_use = "builder methods return a new value"]
    pub fn on_diagnostic(mut self, callback: DiagnosticCallback) -> Self {
        self.on_diagnostic = Some(callback);
        self
    }

    /// Set a callback for overflow notifications on a bounded queue
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Resolve the logger through `registry` (or the `get_logger` factory)
    /// and build the relay
    pub fn build(mut self, registry: &LoggerRegistry) -> Result<Relay> {
        self.config.validate()?;
        let logger = match self.get_logger.take() {
            Some(factory) => factory(&self.config.logger_name),
            None => registry.get_logger(&self.config.logger_name),
        };
        self.build_with_logger(logger)
    }

    /// Build the relay for an explicitly supplied logger.
    ///
    /// The logger's existing handlers are replaced by the relay's adapter
    /// until the relay is dropped.
    pub fn build_with_logger(self, logger: LoggerHandle) -> Result<Relay> {
        self.config.validate()?;

        let metrics = Arc::new(RelayMetrics::new());
        let queue = match self.config.queue_capacity {
            Some(capacity) => RelayQueue::bounded(
                capacity,
                self.config.overflow_policy,
                self.on_overflow,
                Arc::clone(&metrics),
            )?,
            None => RelayQueue::unbounded(Arc::clone(&metrics)),
        };
        let queue = Arc::new(queue);

        let mut policy = ExceptionPolicy::new(self.config.log_exceptions)
            .with_exclusions(self.config.disable_stack_trace);
        if let Some(classifier) = self.classifier {
            policy = policy.with_classifier(classifier);
        }

        let dispatcher = Dispatcher::new(
            self.sinks,
            policy,
            self.exception_logging_handler,
            logger.clone(),
            Arc::clone(&metrics),
            Diagnostics::new(self.on_diagnostic),
        );
        let (adapter, detached) = QueueHandler::install(&logger, Arc::clone(&queue));
        let installation = Installation::new(logger.clone(), Arc::clone(&adapter), detached);
        let worker = DrainWorker::new(
            logger.name(),
            Arc::clone(&queue),
            dispatcher,
            Some(installation),
        );

        Ok(Relay {
            logger,
            queue,
            adapter,
            worker,
            metrics,
        })
    }

    /// Build, install and start in one step, returning only the shutdown
    /// hook. The relay lives on inside the hook and the logger's adapter.
    pub fn configure_logger(self, registry: &LoggerRegistry) -> Result<ShutdownHandle> {
        self.build(registry)?.start()
    }
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
