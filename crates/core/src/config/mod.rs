//! Connector settings
//!
//! Settings live in a TOML file and may be overridden by environment variables.

mod loader;
mod schema;

pub use loader::{default_config_path, Config, CONFIG_FILE_CANDIDATES};
pub use schema::*;
