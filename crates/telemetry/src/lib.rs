//! Logging and tracing setup for the OFeed connector
//!
//! - Structured logging with tracing, as compact text or JSON lines
//! - A per-process session id for correlating log lines
//! - Operation timing

#![warn(missing_docs)]

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize the telemetry system
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
///
/// `RUST_LOG` takes precedence over [`TelemetryConfig::log_level`].
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_file(config.show_file)
                    .with_line_number(config.show_line_number)
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_file(config.show_file)
                    .with_line_number(config.show_line_number)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json: bool,
    /// Include the module path of each event
    pub show_target: bool,
    /// Include the id of the emitting thread
    pub show_thread_ids: bool,
    /// Include the source file of each event
    pub show_file: bool,
    /// Include the source line of each event
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TelemetryConfig {
    /// Debug level with targets shown
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            log_level: "debug".to_string(),
            show_target: true,
            ..Self::default()
        }
    }

    /// Builder-style method to switch to JSON output
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[must_use]
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Time elapsed so far
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = self.name,
            duration_ms = duration.as_millis(),
            "Timer completed"
        );
        duration
    }
}
