//! CLI command implementations

pub mod check;
pub mod config;
pub mod ping;
pub mod run;
pub mod stamp;
pub mod status_code;

use anyhow::Result;
use ofeed_cli::OutputFormat;
use ofeed_core::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Options shared by every command
pub struct Globals {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Globals {
    /// Settings for commands that read them
    pub fn load(&self) -> Result<Config> {
        Ok(Config::load(self.config.as_deref())?)
    }

    /// Settings for commands that write them; a missing file is created on save
    pub fn load_for_update(&self) -> Result<Config> {
        Ok(Config::load_or_default(self.config.as_deref())?)
    }
}

/// Convert one of the `exit_codes` constants
pub fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
