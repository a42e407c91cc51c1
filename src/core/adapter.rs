//! Enqueue adapter: the logger-side handler that feeds the relay queue

use super::{
    logger::{LogHandler, LoggerHandle},
    queue::RelayQueue,
    record::LogRecord,
};
use std::sync::Arc;

/// Logger handler that pushes every record onto a [`RelayQueue`] instead of
/// processing it on the emitting thread.
pub struct QueueHandler {
    name: String,
    queue: Arc<RelayQueue>,
}

impl QueueHandler {
    pub fn new(queue: Arc<RelayQueue>) -> Self {
        Self {
            name: "relay-queue".to_string(),
            queue,
        }
    }

    /// Make a queue handler the sole handler of `logger`.
    ///
    /// Every previously attached handler is detached in the same step, so no
    /// record can reach a synchronous handler once this returns. The detached
    /// handlers are returned to the caller.
    pub fn install(
        logger: &LoggerHandle,
        queue: Arc<RelayQueue>,
    ) -> (Arc<QueueHandler>, Vec<Arc<dyn LogHandler>>) {
        let handler = Arc::new(QueueHandler::new(queue));
        let detached = logger.replace_handlers(Arc::clone(&handler) as Arc<dyn LogHandler>);
        (handler, detached)
    }

    pub fn queue(&self) -> &Arc<RelayQueue> {
        &self.queue
    }
}

/// An installed adapter and the handlers it displaced
pub(crate) struct Installation {
    logger: LoggerHandle,
    adapter: Arc<dyn LogHandler>,
    detached: Vec<Arc<dyn LogHandler>>,
}

impl Installation {
    pub(crate) fn new(
        logger: LoggerHandle,
        adapter: Arc<QueueHandler>,
        detached: Vec<Arc<dyn LogHandler>>,
    ) -> Self {
        Self {
            logger,
            adapter: adapter as Arc<dyn LogHandler>,
            detached,
        }
    }

    /// Detach the adapter and reattach the displaced handlers.
    ///
    /// If the adapter was already removed by someone else, the logger's
    /// handlers are left as they are. Returns whether the adapter was
    /// detached here.
    pub(crate) fn uninstall(self) -> bool {
        if !self.logger.remove_handler(&self.adapter) {
            return false;
        }
        for handler in self.detached {
            self.logger.add_handler(handler);
        }
        true
    }
}

impl LogHandler for QueueHandler {
    fn emit(&self, record: LogRecord) {
        self.queue.push(record);
    }

    fn name(&self) -> &str {
        &self.name
    }
}
