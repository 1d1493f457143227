use crate::error::Error;
use crate::models::{Job, JobLogEntry, StageRequest};

/// What processing one notification did to its job.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// A heartbeat moved progress within the current sub-process.
    Progressed { progress: f64 },
    /// The next sub-process was requested, after absorbing `cached` cache hits.
    Dispatched {
        stage: String,
        progress: f64,
        cached: usize,
    },
    /// The job reached SUCCESSFUL.
    Succeeded { cached: usize },
    /// The job reached FAILED.
    Failed,
    /// The job was already terminal; nothing changed.
    Ignored,
}

/// The complete effect of one notification, computed before anything is
/// written so the job write can be retried as a unit.
#[derive(Debug)]
pub(super) struct JobChange {
    pub job: Job,
    pub logs: Vec<JobLogEntry>,
    pub request: Option<StageRequest>,
    /// Invariant broken by the notification; reported after the job is saved.
    pub violation: Option<Error>,
    pub outcome: UpdateOutcome,
}

impl JobChange {
    pub fn new(job: Job, outcome: UpdateOutcome) -> Self {
        Self {
            job,
            logs: Vec::new(),
            request: None,
            violation: None,
            outcome,
        }
    }

    pub fn log(&mut self, stage: &str, message: impl Into<String>, now: i64) {
        self.logs.push(JobLogEntry {
            id: String::new(),
            job_id: self.job.job_id.clone(),
            stage: stage.to_string(),
            message: message.into(),
            updated: now,
        });
    }
}
