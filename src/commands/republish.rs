//! Republish command - re-send the current stage request of a job

use anyhow::{Context, Result};
use colored::Colorize;

use super::Runtime;

pub fn execute(runtime: &Runtime, job_id: &str) -> Result<()> {
    let request = runtime
        .orchestrator
        .republish(job_id)
        .with_context(|| format!("Failed to republish job {job_id}"))?;
    println!(
        "{} Requested {} for job {}",
        "✓".green().bold(),
        request.stage.bold(),
        job_id
    );
    Ok(())
}
