//! Results upload command

use super::{Globals, exit_code};
use crate::service::{CycleCounts, ResultsService, ServiceHandle, UpdateStatus};
use anyhow::Result;
use ofeed_api_client::{ClientConfig, ServerUrl};
use ofeed_cli::output::print_json;
use ofeed_cli::{Status, progress};
use ofeed_core::circular_log::LogItem;
use ofeed_core::config::format_interval;
use ofeed_core::error::exit_codes;
use ofeed_core::retry::RetryConfig;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

/// Summary printed when the command ends
#[derive(Serialize)]
struct RunReport {
    running: bool,
    status: Option<UpdateStatus>,
    counts: CycleCounts,
    server_log: Vec<LogItem>,
    http_log: Vec<LogItem>,
}

pub async fn run(
    globals: &Globals,
    once: bool,
    retries: u32,
    startup_delay: Duration,
) -> Result<ExitCode> {
    let settings = globals.load()?.settings;
    let validation = settings.validate();
    if !globals.format.is_json() {
        for warning in validation.warnings() {
            Status::warning(&warning.to_string());
        }
    }
    validation.to_result()?;

    let client_config =
        ClientConfig::from_settings(&settings).with_retry(RetryConfig::with_attempts(retries));
    let service = ResultsService::new(&settings, client_config)?.with_startup_delay(startup_delay);
    let handle = service.handle();
    let text = !globals.format.is_json();

    if text {
        let pb = progress::spinner("Contacting SI-Droid Event...");
        if service.ping_sidroid().await {
            progress::finish_success(&pb, "SI-Droid Event is running");
        } else {
            progress::finish_error(
                &pb,
                &format!("SI-Droid Event is not answering on port {}", settings.sidroid.port),
            );
            Status::warning("Starting anyway; results are fetched once SI-Droid Event is up");
        }
    }

    if once {
        let status = service.run_cycle().await;
        report(globals, &handle);
        return Ok(if status.is_success() {
            ExitCode::SUCCESS
        } else {
            exit_code(exit_codes::FAILURE)
        });
    }

    if text {
        let server = ServerUrl::parse(&settings.ofeed.server)
            .map_or_else(|_| settings.ofeed.server.clone(), |url| url.display());
        Status::info(&format!(
            "Uploading event {} to {} every {}; press Ctrl-C to stop",
            settings.ofeed.event_id,
            server,
            format_interval(settings.upload.interval_secs)
        ));
        spawn_status_printer(&handle);
    }

    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            signal_handle.shutdown();
        }
    });

    service.run().await;
    report(globals, &handle);

    Ok(ExitCode::SUCCESS)
}

/// Print each cycle status as it arrives
fn spawn_status_printer(handle: &ServiceHandle) {
    let mut updates = handle.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let latest = updates.borrow_and_update().clone();
            if let Some(status) = latest {
                print_status(&status);
            }
        }
    });
}

fn print_status(status: &UpdateStatus) {
    if status.is_success() {
        Status::success(&status.to_string());
    } else {
        Status::error(&status.to_string());
    }
}

fn report(globals: &Globals, handle: &ServiceHandle) {
    let report = RunReport {
        running: handle.is_running(),
        status: handle.latest_status(),
        counts: handle.counts(),
        server_log: handle.server_log(),
        http_log: handle.http_log(),
    };

    if globals.format.is_json() {
        print_json(&report);
        return;
    }

    Status::header("Latest status");
    match &report.status {
        Some(status) => print_status(status),
        None => Status::info("No update has run"),
    }
    Status::field("Service", if report.running { "running" } else { "stopped" });
    Status::field("Cycles", &report.counts.cycles.to_string());
    Status::field("Uploads", &report.counts.uploads.to_string());
    Status::field("Failures", &report.counts.failures.to_string());

    Status::header("Server log");
    Status::log(&report.server_log);

    if globals.verbose {
        Status::header("HTTP log");
        Status::log(&report.http_log);
    }
}
