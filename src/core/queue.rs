//! Relay queue: the FIFO channel between producers and the drain worker

use super::{
    error::{RelayError, Result},
    metrics::RelayMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    record::LogRecord,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::Arc;

/// Outcome of a blocking [`RelayQueue::pop`]
#[derive(Debug)]
pub enum Popped {
    Record(LogRecord),
    /// The stop signal was observed before another record arrived
    Stop,
}

/// Thread-safe FIFO of records awaiting dispatch.
///
/// Any number of producers may [`push`](RelayQueue::push) concurrently; only
/// the drain worker calls [`pop`](RelayQueue::pop) and
/// [`drain_remaining`](RelayQueue::drain_remaining). The queue keeps both ends
/// of its channel, so it never disconnects while any handle to it is alive.
pub struct RelayQueue {
    sender: Sender<LogRecord>,
    receiver: Receiver<LogRecord>,
    capacity: Option<usize>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    metrics: Arc<RelayMetrics>,
}

impl RelayQueue {
    /// Unbounded queue: `push` never blocks and never drops
    pub fn unbounded(metrics: Arc<RelayMetrics>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            capacity: None,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
            metrics,
        }
    }

    /// Bounded queue governed by `overflow_policy` once `capacity` is reached
    pub fn bounded(
        capacity: usize,
        overflow_policy: OverflowPolicy,
        on_overflow: Option<OverflowCallback>,
        metrics: Arc<RelayMetrics>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(RelayError::config(
                "RelayQueue",
                "capacity must be greater than zero",
            ));
        }

        let (sender, receiver) = bounded(capacity);
        Ok(Self {
            sender,
            receiver,
            capacity: Some(capacity),
            overflow_policy,
            on_overflow,
            metrics,
        })
    }

    /// Enqueue a record. Never fails from the caller's point of view.
    pub fn push(&self, record: LogRecord) {
        self.metrics.record_enqueued();

        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => self.handle_overflow(record),
            // Unreachable while `self.receiver` is alive
            Err(TrySendError::Disconnected(_)) => {
                self.metrics.record_dropped();
            }
        }
    }

    fn handle_overflow(&self, record: LogRecord) {
        match self.overflow_policy {
            OverflowPolicy::Block => {
                // Only fails on disconnect, which cannot happen here
                let _ = self.sender.send(record);
            }

            OverflowPolicy::Reject => self.alert_and_drop(),

            OverflowPolicy::DropOldest => {
                let mut record = record;
                loop {
                    if self.receiver.try_recv().is_ok() {
                        self.alert_and_drop();
                    }
                    match self.sender.try_send(record) {
                        Ok(()) => break,
                        Err(TrySendError::Full(returned)) => record = returned,
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
            }
        }
    }

    fn alert_and_drop(&self) {
        let dropped = self.metrics.record_dropped() + 1;

        // Alert on first drop and every thousandth thereafter
        if dropped == 1 || dropped % 1000 == 0 {
            eprintln!(
                "[RELAY WARNING] Queue full ({} records, policy {}), {} records dropped.",
                self.capacity.unwrap_or_default(),
                self.overflow_policy,
                dropped
            );

            if let Some(ref callback) = self.on_overflow {
                callback(dropped);
            }
        }
    }

    /// Block until a record is available or `stop` fires.
    ///
    /// `stop` fires on a message or on disconnection of its sender. A pending
    /// stop signal wins over queued records; those are left for
    /// [`drain_remaining`](RelayQueue::drain_remaining).
    pub fn pop(&self, stop: &Receiver<()>) -> Popped {
        match stop.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => return Popped::Stop,
        }

        select! {
            recv(self.receiver) -> msg => match msg {
                Ok(record) => Popped::Record(record),
                Err(_) => Popped::Stop,
            },
            recv(stop) -> _ => Popped::Stop,
        }
    }

    /// Remove and return every record queued at the time of the call
    pub fn drain_remaining(&self) -> Vec<LogRecord> {
        let pending = self.receiver.len();
        self.receiver.try_iter().take(pending).collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// `None` for an unbounded queue
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }
}
