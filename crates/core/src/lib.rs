//! Core utilities for the OFeed SI-Droid connector
//!
//! This crate provides the pieces shared by the API client and the connector binary:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Settings**: TOML-based connector settings with environment overrides and validation
//! - **Retry policy**: Exponential backoff configuration for HTTP calls
//! - **Circular log**: Bounded, timestamped, thread-safe log buffers
//! - **HTTP status meanings**: Plain-text descriptions of status codes
//! - **IOF XML**: Id stamping for IOF XML 3.0 result lists
//!
//! # Example
//!
//! ```rust,no_run
//! use ofeed_core::config::Config;
//! use ofeed_core::iof;
//!
//! let config = Config::load(None).expect("Failed to load settings");
//! if !config.settings.is_valid() {
//!     eprintln!("Connector is not configured");
//! }
//!
//! let xml = "<ResultList><PersonResult><Person><Name/></Person></PersonResult></ResultList>";
//! let stamped = iof::update_or_insert_ids(xml).expect("Malformed XML");
//! assert!(stamped.contains("<Id>1</Id>"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod circular_log;
pub mod config;
pub mod error;
pub mod iof;
pub mod retry;
pub mod status_codes;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::circular_log::{CircularLog, LogItem};
    pub use crate::config::{Config, Settings};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::RetryConfig;
    pub use crate::validation::{ValidationResult, Validator};
}
