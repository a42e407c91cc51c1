//! In-memory sink, mostly useful for tests and diagnostics

use crate::core::{LogLevel, LogRecord, Result, SinkHandler};
use parking_lot::Mutex;
use std::sync::Arc;

/// Collects records in a shared buffer.
///
/// Clones share the same buffer, so one clone can be handed to the relay
/// while another is kept to inspect what was dispatched.
#[derive(Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
    threshold: LogLevel,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            threshold: LogLevel::Trace,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, level: LogLevel) -> Self {
        self.threshold = level;
        self
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkHandler for MemorySink {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn threshold(&self) -> LogLevel {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();

        writer.handle(&LogRecord::new("app", LogLevel::Info, "one")).unwrap();
        writer.handle(&LogRecord::new("app", LogLevel::Info, "two")).unwrap();

        assert_eq!(sink.messages(), vec!["one", "two"]);
        sink.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_threshold_filters_in_accepts() {
        let sink = MemorySink::new().with_threshold(LogLevel::Warn);
        assert!(!sink.accepts(&LogRecord::new("app", LogLevel::Info, "skip")));
        assert!(sink.accepts(&LogRecord::new("app", LogLevel::Error, "keep")));
    }
}
