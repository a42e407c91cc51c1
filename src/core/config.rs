//! Serializable relay configuration

use super::{
    error::{RelayError, Result},
    exception_policy::{LogExceptions, TraceExclusion},
    overflow_policy::OverflowPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_LOGGER_NAME: &str = "app";

/// The data half of a relay's configuration.
///
/// Everything that can live in a config file lives here; callbacks and sinks
/// are supplied through [`RelayBuilder`](crate::RelayBuilder).
///
/// # Example
///
/// ```
/// use log_relay::{LogExceptions, RelayConfig, TraceExclusion};
///
/// let config = RelayConfig::from_json_str(
///     r#"{ "log_exceptions": "debug", "disable_stack_trace": [404, "ValidationError"] }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.log_exceptions, LogExceptions::OnlyWhenDebugEnabled);
/// assert!(config.disable_stack_trace.contains(&TraceExclusion::StatusCode(404)));
/// assert_eq!(config.queue_capacity, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Name of the logger whose traffic is relayed
    pub logger_name: String,
    pub log_exceptions: LogExceptions,
    /// Status codes and error kinds whose traces are never logged
    pub disable_stack_trace: HashSet<TraceExclusion>,
    /// `None` for an unbounded queue
    pub queue_capacity: Option<usize>,
    /// Only consulted when `queue_capacity` is set
    pub overflow_policy: OverflowPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            logger_name: DEFAULT_LOGGER_NAME.to_string(),
            log_exceptions: LogExceptions::Always,
            disable_stack_trace: HashSet::new(),
            queue_capacity: None,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl RelayConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(
                "RelayConfig",
                format!("cannot read '{}': {}", path.display(), e),
            )
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logger_name.trim().is_empty() {
            return Err(RelayError::config("RelayConfig", "logger_name must not be empty"));
        }
        if self.queue_capacity == Some(0) {
            return Err(RelayError::config(
                "RelayConfig",
                "queue_capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}
