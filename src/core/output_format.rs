//! Line formats used by the reference sinks
//!
//! - Text: `[2025-01-08T10:30:45.123Z] [INFO ] app main - Request processed`
//! - Json: one JSON object per line

use super::record::LogRecord;
use super::timestamp::TimestampFormat;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn format(&self, record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => format_text(record, timestamp_format),
            OutputFormat::Json => format_json(record, timestamp_format),
        }
    }
}

/// Text line, with the error and its trace (if kept) on following lines
pub fn format_text(record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
    let thread = record.thread_name.as_ref().unwrap_or(&record.thread_id);

    let mut line = format!(
        "[{}] [{:5}] {} {} - {}",
        timestamp_format.format(&record.timestamp),
        record.level.to_str(),
        record.logger,
        thread,
        record.message
    );

    if let Some(ref context) = record.context {
        if !context.is_empty() {
            line.push(' ');
            line.push_str(&context.format_fields());
        }
    }

    if let Some(ref error) = record.error {
        match error.status_code {
            Some(code) => line.push_str(&format!(
                " | {} ({}): {}",
                error.kind, code, error.message
            )),
            None => line.push_str(&format!(" | {}: {}", error.kind, error.message)),
        }
        if let Some(ref trace) = error.trace {
            line.push('\n');
            line.push_str(trace);
        }
    }

    line
}

pub fn format_json(record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
    let mut obj = serde_json::Map::new();

    obj.insert(
        "timestamp".to_string(),
        timestamp_format.to_json_value(&record.timestamp),
    );
    obj.insert("level".to_string(), record.level.to_str().into());
    obj.insert("logger".to_string(), record.logger.clone().into());
    obj.insert("message".to_string(), record.message.clone().into());
    obj.insert("thread_id".to_string(), record.thread_id.clone().into());
    if let Some(ref name) = record.thread_name {
        obj.insert("thread_name".to_string(), name.clone().into());
    }

    if let Some(ref file) = record.file {
        obj.insert("file".to_string(), file.clone().into());
    }
    if let Some(line) = record.line {
        obj.insert("line".to_string(), line.into());
    }

    if let Some(ref context) = record.context {
        for (key, value) in context.fields() {
            obj.insert(key.clone(), value.to_json_value());
        }
    }

    if let Some(ref error) = record.error {
        if let Ok(value) = serde_json::to_value(error) {
            obj.insert("error".to_string(), value);
        }
    }

    serde_json::to_string(&serde_json::Value::Object(obj)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorReport, LogContext, LogLevel};

    #[test]
    fn test_text_format_with_context() {
        let context = LogContext::new()
            .with_field("user_id", 123)
            .with_field("action", "login");
        let record = LogRecord::new("auth", LogLevel::Info, "User logged in").with_context(context);

        let result = OutputFormat::Text.format(&record, &TimestampFormat::Iso8601);

        assert!(result.contains("[INFO ] auth"));
        assert!(result.contains("User logged in action=login user_id=123"));
    }

    #[test]
    fn test_text_format_with_error_and_trace() {
        let record = LogRecord::new("api", LogLevel::Error, "request failed").with_error(
            ErrorReport::new("Timeout", "upstream slow")
                .with_status(504)
                .with_trace("Timeout: upstream slow\n  caused by: io"),
        );

        let result = format_text(&record, &TimestampFormat::Iso8601);
        let lines: Vec<&str> = result.lines().collect();

        assert!(lines[0].ends_with("request failed | Timeout (504): upstream slow"));
        assert_eq!(lines[1], "Timeout: upstream slow");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_format() {
        let context = LogContext::new().with_field("latency_ms", 42);
        let record = LogRecord::new("api", LogLevel::Error, "Error occurred")
            .with_context(context)
            .with_error(ErrorReport::new("Timeout", "slow"));

        let result = OutputFormat::Json.format(&record, &TimestampFormat::UnixMillis);
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(parsed["level"], "ERROR");
        assert_eq!(parsed["logger"], "api");
        assert_eq!(parsed["latency_ms"], 42);
        assert_eq!(parsed["error"]["kind"], "Timeout");
        assert!(parsed["error"].get("trace").is_none());
        assert!(parsed["timestamp"].is_number());
    }
}
