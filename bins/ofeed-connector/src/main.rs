//! OFeed SI-Droid connector
//!
//! Pulls IOF XML 3.0 results from the SI-Droid Event Result Service running on
//! this machine and uploads them to OFeed at a fixed interval.

use clap::{Parser, Subcommand};
use ofeed_api_client::ApiError;
use ofeed_cli::OutputFormat;
use ofeed_cli::output::print_json;
use ofeed_core::error::exit_codes;
use ofeed_telemetry::TelemetryConfig;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod service;
#[cfg(test)]
mod test_support;

use commands::{Globals, check, config, ping, run, stamp, status_code};

/// Upload SI-Droid Event results to OFeed
#[derive(Parser)]
#[command(name = "ofeed-connector")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (searched in the working directory, then the user config directory)
    #[arg(short, long, global = true, env = "OFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload results at the configured interval until interrupted
    Run {
        /// Run a single update cycle and exit
        #[arg(long)]
        once: bool,

        /// Attempts per request for connection errors and 5xx responses
        #[arg(short, long, default_value = "1")]
        retries: u32,

        /// Seconds to wait before the first update
        #[arg(long, default_value = "3")]
        delay: u64,
    },

    /// Check that SI-Droid Event answers on the configured port
    Ping,

    /// Validate the settings
    Check,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Insert person ids into an IOF XML file, as done before each upload
    Stamp {
        /// IOF XML 3.0 result list
        file: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Explain an HTTP status code
    StatusCode {
        /// Numeric status code
        code: u16,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings (password masked)
    Show,

    /// Print the settings file path
    Path,

    /// Write default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Store server, event id and password from an OFeed credentials link
    SetCredentials {
        /// Link such as https://stigning.se/ofeed?url=...&id=...&pwd=...
        link: String,
    },

    /// Store the OFeed server URL
    SetServer {
        /// Host, or full URL of the upload endpoint
        url: String,
    },

    /// Store the upload interval
    SetInterval {
        /// Seconds between uploads (5 to 659)
        secs: u64,
    },

    /// Restore the default HTTP timeouts
    ResetTimeouts,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose || cli.format.is_json() {
        let telemetry = if cli.verbose {
            TelemetryConfig::verbose()
        } else {
            TelemetryConfig {
                log_level: "warn".to_string(),
                ..TelemetryConfig::default()
            }
        };
        if let Err(e) = ofeed_telemetry::init_with_config(telemetry.with_json(cli.format.is_json()))
        {
            eprintln!("{} {e}", "Warning:".yellow().bold());
        }
    }

    let globals = Globals {
        config: cli.config,
        format: cli.format,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Run {
            once,
            retries,
            delay,
        } => run::run(&globals, once, retries, Duration::from_secs(delay)).await,
        Commands::Ping => ping::run(&globals).await,
        Commands::Check => check::run(&globals),
        Commands::Config { action } => match action {
            ConfigAction::Show => config::show(&globals),
            ConfigAction::Path => config::path(&globals),
            ConfigAction::Init { force } => config::init(&globals, force),
            ConfigAction::SetCredentials { link } => config::set_credentials(&globals, &link),
            ConfigAction::SetServer { url } => config::set_server(&globals, &url),
            ConfigAction::SetInterval { secs } => config::set_interval(&globals, secs),
            ConfigAction::ResetTimeouts => config::reset_timeouts(&globals),
        },
        Commands::Stamp { file, output } => stamp::run(&globals, &file, output.as_deref()),
        Commands::StatusCode { code } => status_code::run(&globals, code),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            match e.downcast_ref::<ofeed_core::Error>() {
                Some(core) if globals.format.is_json() => print_json(&core.to_report()),
                _ => eprintln!("{} {e:#}", "Error:".red().bold()),
            }
            commands::exit_code(error_exit_code(&e))
        }
    }
}

/// Map a failure to one of the documented exit codes
fn error_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<ofeed_core::Error>() {
        return match e.code.code() {
            3000..=3999 => exit_codes::CONFIG_ERROR,
            6000..=6999 => exit_codes::VALIDATION_ERROR,
            _ => exit_codes::FAILURE,
        };
    }
    if let Some(e) = err.downcast_ref::<ApiError>() {
        return match e {
            ApiError::InvalidUrl(_) | ApiError::InvalidCredentials(_) => {
                exit_codes::VALIDATION_ERROR
            }
            ApiError::Config(_) => exit_codes::CONFIG_ERROR,
            _ => exit_codes::NETWORK_ERROR,
        };
    }
    exit_codes::FAILURE
}
