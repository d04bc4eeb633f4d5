//! Progress indicators
//!
//! Spinners are hidden when stderr is not a terminal, so piped and JSON
//! output stays clean.

use crate::output::Status;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    if !Term::stderr().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish a spinner with a success message
///
/// The message is printed as a plain status line when the spinner is hidden.
pub fn finish_success(pb: &ProgressBar, message: &str) {
    if pb.is_hidden() {
        pb.finish();
        Status::success(message);
    } else {
        pb.finish_with_message(format!("{} {message}", "✓".green()));
    }
}

/// Finish a spinner with an error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    if pb.is_hidden() {
        pb.finish();
        Status::error(message);
    } else {
        pb.finish_with_message(format!("{} {message}", "✗".red()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let pb = spinner("Pinging SI-Droid...");
        finish_success(&pb, "SI-Droid is running");
        assert!(pb.is_finished());
    }

    #[test]
    fn test_finish_error() {
        let pb = spinner("Uploading...");
        finish_error(&pb, "Upload failed");
        assert!(pb.is_finished());
    }
}
