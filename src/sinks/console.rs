//! Console sink implementation

use crate::core::{
    format_text, LogLevel, LogRecord, OutputFormat, Result, SinkHandler, TimestampFormat,
};
use colored::Colorize;

pub struct ConsoleSink {
    use_colors: bool,
    threshold: LogLevel,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            threshold: LogLevel::Trace,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set the output format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use log_relay::sinks::ConsoleSink;
    /// use log_relay::OutputFormat;
    ///
    /// let sink = ConsoleSink::new().with_output_format(OutputFormat::Json);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, level: LogLevel) -> Self {
        self.threshold = level;
        self
    }

    fn render(&self, record: &LogRecord) -> String {
        match self.output_format {
            OutputFormat::Text if self.use_colors => self.format_colored(record),
            OutputFormat::Text => format_text(record, &self.timestamp_format),
            OutputFormat::Json => self.output_format.format(record, &self.timestamp_format),
        }
    }

    /// Text layout with the level painted in its color
    fn format_colored(&self, record: &LogRecord) -> String {
        let plain = format_text(record, &self.timestamp_format);
        let level = format!("{:5}", record.level.to_str());
        let painted = level.color(record.level.color_code()).to_string();
        plain.replacen(&format!("[{}]", level), &format!("[{}]", painted), 1)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkHandler for ConsoleSink {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        let output = self.render(record);

        // Route Error and Fatal levels to stderr, others to stdout
        match record.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }

    fn threshold(&self) -> LogLevel {
        self.threshold
    }
}
