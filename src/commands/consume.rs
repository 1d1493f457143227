//! Consume command - process notifications from a file or stdin

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;

use crate::inbound::{process_batch, BatchReport};

use super::{read_input, Runtime};

/// Process every notification in `file` (or stdin) and print a summary.
pub fn execute(runtime: &Runtime, file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let report = process_batch(&runtime.orchestrator, &text)?;
    print_report(&report);

    if report.failed() > 0 {
        bail!(
            "{} of {} notifications failed",
            report.failed(),
            report.messages.len()
        );
    }
    Ok(())
}

pub(crate) fn print_report(report: &BatchReport) {
    for message in &report.messages {
        let job_id = message.job_id.as_deref().unwrap_or("<no jobID>");
        match &message.result {
            Ok(outcome) => println!("{} {job_id}: {outcome:?}", "✓".green().bold()),
            Err(e) => println!("{} {job_id}: {e}", "✗".red().bold()),
        }
    }
}
