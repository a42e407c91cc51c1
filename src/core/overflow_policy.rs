//! Overflow policies for a bounded relay queue
//!
//! The relay queue is unbounded unless a capacity is configured. When it is
//! bounded, one of these policies decides what happens to a record pushed
//! into a full queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Policy for handling a push into a full bounded queue
///
/// # Example
///
/// ```
/// use log_relay::OverflowPolicy;
///
/// // Default: evict the oldest queued record
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::DropOldest);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait until the worker makes room
    ///
    /// Warning: this applies backpressure to the producer, which gives up
    /// the non-blocking enqueue guarantee.
    Block,

    /// Evict the oldest queued record and enqueue the new one
    #[default]
    DropOldest,

    /// Discard the new record and keep the queue as is
    Reject,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::DropOldest => write!(f, "DropOldest"),
            OverflowPolicy::Reject => write!(f, "Reject"),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when records are dropped due to queue overflow.
/// The parameter is the total count of dropped records so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::Block.to_string(), "Block");
        assert_eq!(OverflowPolicy::DropOldest.to_string(), "DropOldest");
        assert_eq!(OverflowPolicy::Reject.to_string(), "Reject");
    }

    #[test]
    fn test_overflow_policy_serde_names() {
        let policy: OverflowPolicy = serde_json::from_str("\"drop_oldest\"").unwrap();
        assert_eq!(policy, OverflowPolicy::DropOldest);
        assert_eq!(serde_json::to_string(&OverflowPolicy::Reject).unwrap(), "\"reject\"");
    }
}
