//! Status code lookup command

use super::Globals;
use anyhow::Result;
use ofeed_cli::output::print_json;
use ofeed_core::status_codes;
use std::process::ExitCode;

pub fn run(globals: &Globals, code: u16) -> Result<ExitCode> {
    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "code": code,
            "meaning": status_codes::lookup(code),
        }));
    } else {
        println!("{}", status_codes::meaning(code));
    }
    Ok(ExitCode::SUCCESS)
}
