//! Terminal output helpers for the OFeed connector
//!
//! Provides shared CLI functionality:
//! - Status messages and key/value listings
//! - Text or JSON output selection
//! - Spinners for network calls

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{OutputFormat, Status};
