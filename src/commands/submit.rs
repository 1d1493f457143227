//! Submit command - create a job and enqueue its entry notification

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use crate::models::Notification;

use super::{read_input, Runtime};

/// Create a job for `process_id`/`version` with the inputs in `inputs_file`.
///
/// # Arguments
///
/// * `inputs_file` - JSON job inputs, or stdin when `-`
/// * `inline` - Process the entry notification now instead of enqueueing it
pub fn execute(
    runtime: &Runtime,
    process_id: &str,
    version: &str,
    inputs_file: &Path,
    inline: bool,
) -> Result<()> {
    let text = read_input(Some(inputs_file))?;
    let inputs: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse job inputs {}", inputs_file.display()))?;

    let submission = runtime
        .orchestrator
        .submit(process_id, version, inputs)
        .context("Failed to submit job")?;
    let job_id = &submission.job.job_id;

    if inline {
        let outcome = runtime
            .orchestrator
            .process_update(&submission.entry)
            .with_context(|| format!("Failed to start job {job_id}"))?;
        println!("{} Job {} started: {outcome:?}", "✓".green().bold(), job_id.bold());
    } else {
        let path = enqueue(&runtime.inbox_dir(), &submission.entry)?;
        println!(
            "{} Job {} accepted, entry queued at {}",
            "✓".green().bold(),
            job_id.bold(),
            path.display()
        );
    }
    println!("{job_id}");
    Ok(())
}

/// Write a notification into the inbox so the watcher picks it up.
///
/// The file is written under a temporary name and renamed into place, so a
/// watcher never sees a partial document.
pub fn enqueue(inbox: &Path, notification: &Notification) -> Result<PathBuf> {
    fs::create_dir_all(inbox)
        .with_context(|| format!("Failed to create inbox {}", inbox.display()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".enqueue-")
        .suffix(".tmp")
        .tempfile_in(inbox)
        .context("Failed to create inbox file")?;
    staged
        .write_all(notification.to_value().to_string().as_bytes())
        .context("Failed to write inbox file")?;

    let path = inbox.join(format!("{}.json", notification.job_id()));
    staged
        .persist(&path)
        .with_context(|| format!("Failed to move notification to {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::runtime;
    use crate::models::JobStatus;
    use serde_json::json;

    fn write_inputs(dir: &Path, flags: &[bool]) -> PathBuf {
        let path = dir.join("inputs.json");
        fs::write(&path, json!({"executingStageFlags": flags}).to_string()).unwrap();
        path
    }

    #[test]
    fn test_submit_enqueues_entry_notification() {
        let (temp, runtime) = runtime();
        let inputs = write_inputs(temp.path(), &[true, true]);

        execute(&runtime, "hydro", "1.0", &inputs, false).unwrap();

        let queued: Vec<PathBuf> = fs::read_dir(runtime.inbox_dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(queued.len(), 1);
        let entry: Value = serde_json::from_str(&fs::read_to_string(&queued[0]).unwrap()).unwrap();
        assert_eq!(entry["stage"], "PRE_PROCESSED");
        assert_eq!(entry["status"], "SUCCESSFUL");
        assert_eq!(entry["message"], "Requesting to start this job");

        let job_id = entry["jobID"].as_str().unwrap();
        let job = runtime.orchestrator.repository().fetch_job(job_id).unwrap();
        assert_eq!(job.status, JobStatus::Accepted);
    }

    #[test]
    fn test_submit_inline_starts_job() {
        let (temp, runtime) = runtime();
        let inputs = write_inputs(temp.path(), &[true, false]);

        execute(&runtime, "hydro", "1.0", &inputs, true).unwrap();

        let outbox = fs::read_to_string(runtime.config.outbox_path()).unwrap();
        let request: Value = serde_json::from_str(outbox.lines().next().unwrap()).unwrap();
        assert_eq!(request["stage"], "LIS");
        assert!(!runtime.inbox_dir().exists() || fs::read_dir(runtime.inbox_dir()).unwrap().count() == 0);
    }

    #[test]
    fn test_submit_rejects_unknown_process() {
        let (temp, runtime) = runtime();
        let inputs = write_inputs(temp.path(), &[true]);
        assert!(execute(&runtime, "nope", "1.0", &inputs, false).is_err());
    }
}
