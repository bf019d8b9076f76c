//! Output formatting and writing utilities
//!
//! Results are written to stdout in the selected format; status messages
//! only appear in human mode so structured output stays parseable.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use polyglot_core::Response;
use serde::Serialize;
use std::io::{self, Write};

/// Trait for formatting output with specialized support for translation results
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a batch of responses
    ///
    /// Plain batches become a list of strings; annotated batches keep the
    /// whole response so scores and ranges survive.
    fn format_responses(&self, responses: &[Response], annotated: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_responses(&self, responses: &[Response], annotated: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_responses_human(responses)),
            _ if annotated => self.format(&responses),
            _ => {
                let targets: Vec<&str> = responses.iter().map(|r| r.target.as_str()).collect();
                self.format(&targets)
            }
        }
    }
}

fn format_responses_human(responses: &[Response]) -> String {
    let mut out = String::new();

    for response in responses {
        out.push_str(&response.target);
        out.push('\n');

        if let Some(scores) = &response.quality_scores {
            let scores: Vec<String> = scores.iter().map(|s| format!("{:.2}", s)).collect();
            out.push_str(&format!("  scores: {}\n", scores.join(" ")));
        }
        if let Some(alignments) = &response.alignments {
            let pairs: Vec<String> = alignments
                .iter()
                .map(|a| format!("{}:{}-{}", a.sentence, a.source, a.target))
                .collect();
            out.push_str(&format!("  alignment: {}\n", pairs.join(" ")));
        }
        if let Some(mappings) = &response.sentence_mappings {
            let ranges: Vec<String> = mappings
                .iter()
                .map(|m| {
                    format!(
                        "[{}..{}]->[{}..{}]",
                        m.source.begin, m.source.end, m.target.begin, m.target.end
                    )
                })
                .collect();
            out.push_str(&format!("  sentences: {}\n", ranges.join(" ")));
        }
    }

    out
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an informational message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a serializable value in the selected format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a batch of translation responses
    pub fn responses(&mut self, responses: &[Response], annotated: bool) -> Result<()> {
        let formatted = self.format.format_responses(responses, annotated)?;
        match self.format {
            OutputFormat::Human => self.write(&formatted),
            _ => self.writeln(formatted.trim_end()),
        }
    }
}
