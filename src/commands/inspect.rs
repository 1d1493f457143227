//! Read-only job views: status, results and logs, printed as JSON

use anyhow::{Context, Result};
use serde::Serialize;

use super::Runtime;

pub fn status(runtime: &Runtime, job_id: &str) -> Result<()> {
    let view = runtime
        .orchestrator
        .repository()
        .job_status(job_id)
        .with_context(|| format!("Failed to load status of job {job_id}"))?;
    print_json(&view)
}

pub fn results(runtime: &Runtime, job_id: &str) -> Result<()> {
    let view = runtime
        .orchestrator
        .repository()
        .job_result(job_id)
        .with_context(|| format!("Failed to load results of job {job_id}"))?;
    print_json(&view)
}

pub fn logs(runtime: &Runtime, job_id: &str) -> Result<()> {
    let repository = runtime.orchestrator.repository();
    // Distinguish an unknown job from one without log entries
    repository
        .fetch_job(job_id)
        .with_context(|| format!("Failed to load job {job_id}"))?;
    let entries = repository
        .job_logs(job_id)
        .with_context(|| format!("Failed to load logs of job {job_id}"))?;
    print_json(&entries)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode JSON")?;
    println!("{json}");
    Ok(())
}
