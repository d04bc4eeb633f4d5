//! Settings validation command

use super::{Globals, exit_code};
use anyhow::Result;
use ofeed_api_client::ServerUrl;
use ofeed_cli::Status;
use ofeed_cli::output::{format_count, print_json};
use ofeed_core::config::format_interval;
use ofeed_core::error::exit_codes;
use std::process::ExitCode;

pub fn run(globals: &Globals) -> Result<ExitCode> {
    let config = globals.load()?;
    let settings = &config.settings;
    let validation = settings.validate();

    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "config": config.path,
            "valid": validation.is_valid(),
            "errors": validation.errors(),
            "warnings": validation.warnings(),
        }));
    } else {
        Status::header("Settings check");
        Status::field(
            "Config file",
            &config
                .path
                .as_ref()
                .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string()),
        );

        for error in validation.errors() {
            Status::error(&error.to_string());
        }
        for warning in validation.warnings() {
            Status::warning(&warning.to_string());
        }

        if validation.is_valid() {
            let server = ServerUrl::parse(&settings.ofeed.server)
                .map_or_else(|_| settings.ofeed.server.clone(), |url| url.display());
            Status::success(&format!(
                "Ready to upload event {} to {} every {}",
                settings.ofeed.event_id,
                server,
                format_interval(settings.upload.interval_secs)
            ));
        } else {
            Status::info(&format!(
                "{} to fix",
                format_count(validation.errors().len(), "problem", "problems")
            ));
        }
    }

    Ok(if validation.is_valid() {
        ExitCode::SUCCESS
    } else {
        exit_code(exit_codes::VALIDATION_ERROR)
    })
}
