//! Settings commands

use super::Globals;
use anyhow::{Result, bail};
use ofeed_api_client::{ServerUrl, parse_credentials_link};
use ofeed_cli::Status;
use ofeed_cli::output::print_json;
use ofeed_core::config::{
    Config, MAX_UPLOAD_INTERVAL_SECS, MIN_UPLOAD_INTERVAL_SECS, Settings, format_interval,
};
use std::process::ExitCode;
use tracing::info;

pub fn show(globals: &Globals) -> Result<ExitCode> {
    let config = globals.load()?;
    let settings = config.settings.redacted();

    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "path": config.path,
            "settings": settings,
        }));
        return Ok(ExitCode::SUCCESS);
    }

    let server = ServerUrl::parse(&settings.ofeed.server)
        .map_or_else(|_| settings.ofeed.server.clone(), |url| url.display());

    Status::header("Settings");
    Status::field(
        "Config file",
        &config
            .path
            .as_ref()
            .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string()),
    );
    Status::field("SI-Droid port", &settings.sidroid.port.to_string());
    Status::field("OFeed server", &server);
    Status::field("Event id", &settings.ofeed.event_id);
    Status::field("Event password", &settings.ofeed.event_password);
    Status::field("Upload interval", &format_interval(settings.upload.interval_secs));
    Status::field("Connect timeout", &timeout(settings.http.connect_timeout_secs));
    Status::field("Read timeout", &timeout(settings.http.read_timeout_secs));
    Status::field("Call timeout", &timeout(settings.http.call_timeout_secs));
    Status::field("Log capacity", &settings.log.capacity.to_string());

    Ok(ExitCode::SUCCESS)
}

fn timeout(secs: u64) -> String {
    if secs == 0 {
        "none".to_string()
    } else {
        format!("{secs} s")
    }
}

pub fn path(globals: &Globals) -> Result<ExitCode> {
    let path = globals.load_for_update()?.target_path();

    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "path": path,
            "exists": path.exists(),
        }));
    } else {
        println!("{}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

pub fn init(globals: &Globals, force: bool) -> Result<ExitCode> {
    let mut config = globals.load_for_update()?;
    let path = config.target_path();
    if path.exists() && !force {
        bail!("{} already exists; use --force to overwrite it", path.display());
    }

    config.settings = Settings::default();
    let written = config.save()?;
    Status::success(&format!("Wrote default settings to {}", written.display()));
    Ok(ExitCode::SUCCESS)
}

pub fn set_credentials(globals: &Globals, link: &str) -> Result<ExitCode> {
    let credentials = parse_credentials_link(link)?;
    let server = ServerUrl::parse(&credentials.server)?;

    update(globals, |settings| {
        settings.ofeed.server = server.full();
        settings.ofeed.event_id = credentials.event_id.clone();
        settings.ofeed.event_password = credentials.password.clone();
    })?;

    info!(event_id = %credentials.event_id, server = %server, "Credentials stored");
    Status::success(&format!(
        "Saved credentials for event {} on {}",
        credentials.event_id,
        server.display()
    ));
    Ok(ExitCode::SUCCESS)
}

pub fn set_server(globals: &Globals, url: &str) -> Result<ExitCode> {
    let server = ServerUrl::parse(url)?;
    if !server.is_https() {
        bail!("OFeed server must use https: {}", server.full());
    }

    update(globals, |settings| settings.ofeed.server = server.full())?;
    Status::success(&format!("OFeed server set to {}", server.full()));
    Ok(ExitCode::SUCCESS)
}

pub fn set_interval(globals: &Globals, secs: u64) -> Result<ExitCode> {
    if !(MIN_UPLOAD_INTERVAL_SECS..=MAX_UPLOAD_INTERVAL_SECS).contains(&secs) {
        bail!(
            "Upload interval must be between {} and {}",
            format_interval(MIN_UPLOAD_INTERVAL_SECS),
            format_interval(MAX_UPLOAD_INTERVAL_SECS)
        );
    }

    update(globals, |settings| settings.upload.interval_secs = secs)?;
    Status::success(&format!("Upload interval set to {}", format_interval(secs)));
    Ok(ExitCode::SUCCESS)
}

pub fn reset_timeouts(globals: &Globals) -> Result<ExitCode> {
    update(globals, Settings::reset_http_timeouts)?;
    Status::success("HTTP timeouts restored to defaults");
    Ok(ExitCode::SUCCESS)
}

/// Load, modify and save the settings file
fn update<F>(globals: &Globals, change: F) -> Result<Config>
where
    F: FnOnce(&mut Settings),
{
    let mut config = globals.load_for_update()?;
    change(&mut config.settings);
    config.save()?;
    Ok(config)
}
