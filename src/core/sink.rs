//! Sink trait for downstream record consumers

use super::{
    error::{panic_message, RelayError, Result},
    log_level::LogLevel,
    record::LogRecord,
};

/// A downstream consumer of relayed records (console, file, network, ...).
///
/// The drain worker calls [`accepts`](SinkHandler::accepts) for every record
/// and [`handle`](SinkHandler::handle) only for the ones it accepts.
pub trait SinkHandler: Send {
    fn handle(&mut self, record: &LogRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Minimum severity this sink wants to see
    fn threshold(&self) -> LogLevel {
        LogLevel::Trace
    }

    fn accepts(&self, record: &LogRecord) -> bool {
        self.threshold().admits(record.level)
    }
}

/// Offer `record` to `sink` with panic isolation.
///
/// Returns `Ok(true)` if the sink accepted and handled the record,
/// `Ok(false)` if it declined it.
pub(crate) fn offer(sink: &mut dyn SinkHandler, record: &LogRecord) -> Result<bool> {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        if sink.accepts(record) {
            sink.handle(record).map(|()| true)
        } else {
            Ok(false)
        }
    }));

    match outcome {
        Ok(Ok(handled)) => Ok(handled),
        Ok(Err(e)) => Err(RelayError::sink_failed(sink.name(), e.to_string())),
        Err(panic_info) => Err(RelayError::sink_panicked(
            sink.name(),
            panic_message(panic_info.as_ref()),
        )),
    }
}

/// Flush `sink` with panic isolation
pub(crate) fn flush_isolated(sink: &mut dyn SinkHandler) -> Result<()> {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.flush()));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RelayError::sink_failed(
            sink.name(),
            format!("flush failed: {}", e),
        )),
        Err(panic_info) => Err(RelayError::sink_panicked(
            sink.name(),
            format!("during flush: {}", panic_message(panic_info.as_ref())),
        )),
    }
}
