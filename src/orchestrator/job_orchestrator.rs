//! Main JobOrchestrator struct and public interface

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::logging::notification_span;
use crate::models::constants::DEFAULT_CACHING_JOBS;
use crate::models::{Notification, StageRequest};
use crate::pipeline::StageGraph;
use crate::publish::Publisher;
use crate::store::JobRepository;
use crate::utils::now_unix;

use super::change::{JobChange, UpdateOutcome};
use super::result_handler::StageResult;

/// Configuration for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// How many prior finished jobs are examined for a cache hit (0 disables caching)
    pub caching_jobs: usize,
    /// Extra attempts after a job write loses a version race
    pub max_conflict_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            caching_jobs: DEFAULT_CACHING_JOBS,
            max_conflict_retries: 3,
        }
    }
}

/// Consumes stage notifications and advances jobs through their pipeline.
pub struct JobOrchestrator {
    pub(super) config: OrchestratorConfig,
    pub(super) repository: JobRepository,
    pub(super) publisher: Arc<dyn Publisher>,
}

impl JobOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        repository: JobRepository,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            repository,
            publisher,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn repository(&self) -> &JobRepository {
        &self.repository
    }

    /// Validate a raw JSON envelope and process it.
    pub fn process_value(&self, value: &Value) -> Result<UpdateOutcome> {
        let notification = Notification::from_value(value)?;
        self.process_update(&notification)
    }

    /// Apply one notification to its job.
    ///
    /// The whole effect is computed from a fresh read of the job, then written
    /// only if nobody else wrote the job meanwhile; a lost race re-reads and
    /// recomputes. Log entries are appended and the next-stage request is
    /// published only after the write succeeded.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown job or process definition
    /// - `Configuration` for a malformed stage layout
    /// - `Validation` for a stage name outside the layout
    /// - `InvariantViolation` for a successful result without outputs; the
    ///   job has already been persisted as FAILED
    /// - `Conflict` when the retries are exhausted
    /// - `Publish` when the request could not be sent; the job state is
    ///   already persisted and [`JobOrchestrator::republish`] re-sends it
    pub fn process_update(&self, notification: &Notification) -> Result<UpdateOutcome> {
        let job_id = notification.job_id();
        let _span = notification_span(job_id, notification.message_type(), notification.stage())
            .entered();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let job = self.repository.fetch_job(job_id)?;
            if job.is_terminal() {
                warn!(
                    job_id,
                    status = %job.status,
                    message_type = notification.message_type(),
                    stage = notification.stage(),
                    "Ignoring notification for finished job"
                );
                return Ok(UpdateOutcome::Ignored);
            }

            let definition = self
                .repository
                .fetch_process(&job.process_id, &job.process_version)?;
            let graph = StageGraph::configure(&definition)?;
            let now = now_unix();

            let mut change = match notification {
                Notification::Update { stage, message, .. } => {
                    self.apply_update(job, &graph, stage, message, now)?
                }
                Notification::Result {
                    stage,
                    status,
                    message,
                    outputs,
                    ..
                } => {
                    let result = StageResult {
                        stage,
                        status: *status,
                        message: message.as_deref(),
                        outputs: outputs.as_deref(),
                    };
                    self.apply_result(job, &graph, &result, now)?
                }
            };

            match self.repository.save_job(&mut change.job) {
                Ok(()) => return self.commit(change),
                Err(Error::VersionConflict { .. })
                    if attempts <= self.config.max_conflict_retries =>
                {
                    warn!(job_id, attempts, "Job changed concurrently, retrying");
                }
                Err(Error::VersionConflict { job_id, .. }) => {
                    return Err(Error::VersionConflict { job_id, attempts })
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Record the side effects of a persisted change.
    fn commit(&self, change: JobChange) -> Result<UpdateOutcome> {
        for entry in &change.logs {
            self.repository.append_log(entry)?;
        }

        if let Some(violation) = change.violation {
            error!(job_id = %change.job.job_id, error = %violation, "Job failed on broken invariant");
            return Err(violation);
        }

        if let Some(request) = &change.request {
            self.publisher.publish(request)?;
        }

        debug!(job_id = %change.job.job_id, version = change.job.version, outcome = ?change.outcome, "Notification applied");
        Ok(change.outcome)
    }

    /// Re-send the request for the job's current sub-process.
    ///
    /// Used after a publish failure: the job was already moved to the stage,
    /// so the request is rebuilt from the stored job.
    pub fn republish(&self, job_id: &str) -> Result<StageRequest> {
        let job = self.repository.fetch_job(job_id)?;
        if job.is_terminal() {
            return Err(Error::Validation {
                subject: "job",
                field: "status".to_string(),
                message: format!("job is {}; there is no stage to request", job.status),
            });
        }
        let stage = job.current_stage.as_deref().ok_or_else(|| Error::Validation {
            subject: "job",
            field: "currentStage".to_string(),
            message: "no sub-process has been dispatched yet".to_string(),
        })?;

        let request = StageRequest::new(&job.job_id, stage, job.inputs.clone(), job.outputs.clone());
        self.publisher.publish(&request)?;
        info!(job_id, stage, "Republished stage request");
        Ok(request)
    }
}
