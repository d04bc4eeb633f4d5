//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use clap::ValueEnum;
use ofeed_core::circular_log::LogItem;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::time::Duration;

/// How command results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}

impl OutputFormat {
    /// Whether JSON output was requested
    #[must_use]
    pub fn is_json(self) -> bool {
        self == Self::Json
    }
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => Status::error(&format!("Failed to serialize output: {e}")),
    }
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print an aligned `key: value` line
    pub fn field(key: &str, value: &str) {
        println!("  {:<18} {}", format!("{key}:").dimmed(), value);
    }

    /// Print log entries, newest first, with dimmed timestamps
    pub fn log(entries: &[LogItem]) {
        if entries.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for item in entries {
            println!("  {} {}", item.time.dimmed(), item.text);
        }
    }
}

/// Format a duration for display
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
