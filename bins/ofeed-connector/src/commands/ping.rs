//! SI-Droid liveness check

use super::{Globals, exit_code};
use anyhow::Result;
use ofeed_api_client::{ClientConfig, ConnectorClient};
use ofeed_cli::output::{format_duration, print_json};
use ofeed_cli::{Status, progress};
use ofeed_core::error::exit_codes;
use std::process::ExitCode;
use std::time::Instant;

pub async fn run(globals: &Globals) -> Result<ExitCode> {
    let settings = globals.load()?.settings;
    let client = ConnectorClient::with_config(ClientConfig::from_settings(&settings))?;
    let url = settings.sidroid_ping_url();

    let spinner = (!globals.format.is_json())
        .then(|| progress::spinner(&format!("Contacting SI-Droid Event at {url}...")));

    let start = Instant::now();
    let reachable = client.sidroid().ping(&url).await;
    let elapsed = start.elapsed();

    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "url": url,
            "reachable": reachable,
            "elapsed_ms": elapsed.as_millis(),
        }));
    } else if let Some(pb) = spinner {
        if reachable {
            progress::finish_success(
                &pb,
                &format!(
                    "SI-Droid Event is answering on port {} ({})",
                    settings.sidroid.port,
                    format_duration(elapsed)
                ),
            );
        } else {
            progress::finish_error(
                &pb,
                &format!("SI-Droid Event is not answering on port {}", settings.sidroid.port),
            );
            Status::info("Start the Result Service in SI-Droid Event, or check sidroid.port");
        }
    }

    Ok(if reachable {
        ExitCode::SUCCESS
    } else {
        exit_code(exit_codes::NETWORK_ERROR)
    })
}
