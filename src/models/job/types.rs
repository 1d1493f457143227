use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::constants::JOB_TYPE_PROCESS;

/// One execution instance of a process.
///
/// Field names follow the document-store schema shared with the REST front
/// door, so they are renamed to camelCase (and `jobID`/`processID`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "jobID")]
    pub job_id: String,
    #[serde(rename = "processID")]
    pub process_id: String,
    pub process_version: String,
    #[serde(rename = "type", default = "default_job_type")]
    pub job_type: String,
    pub status: JobStatus,
    /// Percentage in [0, 100]; fractional while heartbeats arrive.
    pub progress: f64,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
    pub updated: i64,
    #[serde(default)]
    pub message: String,
    /// The original input payload, including `executingStageFlags`.
    pub inputs: Value,
    /// Accumulated outputs, each name prefixed with its producing sub-process.
    #[serde(default)]
    pub outputs: Vec<JobOutput>,
    /// Sub-process most recently dispatched to a worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    /// Optimistic concurrency counter, bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

fn default_job_type() -> String {
    JOB_TYPE_PROCESS.to_string()
}

/// Status of a job in its lifecycle.
///
/// State machine transitions:
/// - `Accepted` -> `Running` (pipeline-entry result dispatches the first sub-process)
/// - `Accepted` -> `Successful` (no stage-group enabled, or everything cached)
/// - `Accepted` | `Running` -> `Failed`
/// - `Running` -> `Successful`
/// - `Successful` and `Failed` are terminal states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    /// Created, waiting for the pipeline-entry notification.
    Accepted,
    /// At least one sub-process has been dispatched.
    Running,
    /// Every enabled sub-process finished; terminal.
    Successful,
    /// A sub-process failed or broke an invariant; terminal.
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Accepted => write!(f, "ACCEPTED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Successful => write!(f, "SUCCESSFUL"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A namespaced stage output, e.g. `{name: "RRR__DATA", value: "s3://..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobOutput {
    pub name: String,
    pub value: String,
}

/// Append-only audit record, one per processed notification step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobLogEntry {
    /// Unique key of the entry, assigned when appended.
    #[serde(rename = "logID", default)]
    pub id: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub stage: String,
    pub message: String,
    pub updated: i64,
}
