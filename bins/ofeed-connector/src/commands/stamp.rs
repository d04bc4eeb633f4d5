//! Offline id stamping
//!
//! Applies the same `<Person>` renumbering as an upload cycle to a local file,
//! for checking what OFeed will receive.

use super::Globals;
use anyhow::{Context, Result};
use ofeed_cli::Status;
use ofeed_cli::output::{format_count, print_json};
use ofeed_core::{Error, iof};
use std::path::Path;
use std::process::ExitCode;
use tracing::debug;

pub fn run(globals: &Globals, file: &Path, output: Option<&Path>) -> Result<ExitCode> {
    if !file.exists() {
        return Err(Error::file_not_found(file).into());
    }
    let xml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if !iof::has_person_results(&xml) {
        Status::warning("No <PersonResult> found; an upload cycle would skip this document");
    }

    let stamped = iof::stamp_ids(&xml).with_context(|| format!("Stamping {}", file.display()))?;
    debug!(persons = stamped.persons, "Ids stamped");

    let Some(output) = output else {
        print!("{}", stamped.xml);
        return Ok(ExitCode::SUCCESS);
    };

    std::fs::write(output, &stamped.xml)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if globals.format.is_json() {
        print_json(&serde_json::json!({
            "input": file,
            "output": output,
            "persons": stamped.persons,
        }));
    } else {
        Status::success(&format!(
            "Numbered {} in {}",
            format_count(stamped.persons as usize, "person", "persons"),
            output.display()
        ));
    }

    Ok(ExitCode::SUCCESS)
}
