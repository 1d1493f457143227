use chrono::Utc;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::constants::{
    JOB_TYPE_PROCESS, OUTPUT_NAMESPACE_SEPARATOR, PROGRESS_COMPLETE, UNSET_TIMESTAMP,
};

use super::types::{Job, JobOutput, JobStatus};

/// Key of the per-stage-group run flags inside job inputs.
pub const EXECUTING_STAGE_FLAGS: &str = "executingStageFlags";

impl Job {
    /// Create a freshly ACCEPTED job for a process.
    pub fn new(process_id: String, process_version: String, inputs: Value) -> Self {
        Self {
            job_id: Self::generate_id(),
            process_id,
            process_version,
            job_type: JOB_TYPE_PROCESS.to_string(),
            status: JobStatus::Accepted,
            progress: 0.0,
            created: Utc::now().timestamp(),
            started: UNSET_TIMESTAMP,
            finished: UNSET_TIMESTAMP,
            updated: UNSET_TIMESTAMP,
            message: String::new(),
            inputs,
            outputs: Vec::new(),
            current_stage: None,
            version: 0,
        }
    }

    /// `<uuid-v4>-<UTC timestamp with microseconds>`
    pub fn generate_id() -> String {
        format!(
            "{}-{}",
            uuid::Uuid::new_v4(),
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the job has finished (successfully or not).
    pub fn is_in_flight(&self) -> bool {
        self.finished == UNSET_TIMESTAMP
    }

    /// Per-stage-group run flags from the job inputs.
    pub fn executing_stage_flags(&self) -> Result<Vec<bool>> {
        let flags = self
            .inputs
            .get(EXECUTING_STAGE_FLAGS)
            .ok_or_else(|| Error::invalid_inputs(EXECUTING_STAGE_FLAGS, "missing"))?
            .as_array()
            .ok_or_else(|| Error::invalid_inputs(EXECUTING_STAGE_FLAGS, "expected an array"))?;

        flags
            .iter()
            .enumerate()
            .map(|(idx, flag)| {
                flag.as_bool().ok_or_else(|| {
                    Error::invalid_inputs(
                        format!("{EXECUTING_STAGE_FLAGS}[{idx}]"),
                        "expected a boolean",
                    )
                })
            })
            .collect()
    }

    /// Append worker outputs, prefixing each name with the producing stage.
    pub fn append_stage_outputs(&mut self, stage: &str, outputs: &[JobOutput]) {
        self.outputs.extend(outputs.iter().map(|output| JobOutput {
            name: format!("{stage}{OUTPUT_NAMESPACE_SEPARATOR}{}", output.name),
            value: output.value.clone(),
        }));
    }

    /// Outputs produced by `stage`, already namespaced.
    pub fn outputs_for_stage(&self, stage: &str) -> Vec<JobOutput> {
        let prefix = format!("{stage}{OUTPUT_NAMESPACE_SEPARATOR}");
        self.outputs
            .iter()
            .filter(|output| output.name.starts_with(&prefix))
            .cloned()
            .collect()
    }

    pub fn touch(&mut self, now: i64) {
        self.updated = now;
    }

    /// Mark the job FAILED at the given progress.
    pub fn fail(&mut self, progress: f64, message: String, now: i64) -> Result<()> {
        self.try_transition(JobStatus::Failed)?;
        self.progress = progress;
        self.message = message;
        self.finished = now;
        self.updated = now;
        Ok(())
    }

    /// Mark the job SUCCESSFUL with full progress.
    pub fn succeed(&mut self, message: String, now: i64) -> Result<()> {
        self.try_transition(JobStatus::Successful)?;
        self.progress = PROGRESS_COMPLETE;
        self.message = message;
        self.finished = now;
        self.updated = now;
        if self.started == UNSET_TIMESTAMP {
            self.started = now;
        }
        Ok(())
    }

    /// Mark the job RUNNING, stamping `started`.
    pub fn start(&mut self, now: i64) -> Result<()> {
        self.try_transition(JobStatus::Running)?;
        self.started = now;
        Ok(())
    }
}

impl JobOutput {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Error helper shared by the transition guard.
pub(super) fn invalid_transition(from: JobStatus, to: JobStatus) -> Error {
    Error::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}
