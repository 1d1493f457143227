use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Job, JobLogEntry, JobOutput, JobResultView, JobStatusView, ProcessDefinition};

use super::{JobStore, WritePrecondition, WriteResult};

/// Orchestrator-facing lookups over a [`JobStore`].
///
/// Turns absent documents into `NotFound` errors, failed compare-and-swap
/// writes into [`Error::VersionConflict`], and implements cache-candidate
/// selection.
#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn JobStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Fetch a job by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JobNotFound`] if no such job exists.
    pub fn fetch_job(&self, job_id: &str) -> Result<Job> {
        self.store
            .get_job(job_id)?
            .ok_or_else(|| Error::JobNotFound {
                job_id: job_id.to_string(),
            })
    }

    /// Fetch a process definition by ID and version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessNotFound`] if no such definition exists.
    pub fn fetch_process(&self, process_id: &str, version: &str) -> Result<ProcessDefinition> {
        self.store
            .get_process(process_id, version)?
            .ok_or_else(|| Error::ProcessNotFound {
                process_id: process_id.to_string(),
                version: version.to_string(),
            })
    }

    /// Store a brand-new job; fails if the ID is already taken.
    pub fn create_job(&self, job: &mut Job) -> Result<()> {
        match self.store.put_job(job, WritePrecondition::DoesNotExist)? {
            WriteResult::Success { version } => {
                job.version = version;
                Ok(())
            }
            WriteResult::PreconditionFailed { .. } => Err(Error::Validation {
                subject: "job",
                field: "jobID".to_string(),
                message: format!("job {} already exists", job.job_id),
            }),
        }
    }

    /// Write `job` only if the stored version still equals `job.version`.
    ///
    /// On success `job.version` is bumped to the stored version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionConflict`] (one attempt) if another writer got
    /// there first; the caller decides whether to re-read and retry.
    pub fn save_job(&self, job: &mut Job) -> Result<()> {
        match self
            .store
            .put_job(job, WritePrecondition::MatchesVersion(job.version))?
        {
            WriteResult::Success { version } => {
                job.version = version;
                Ok(())
            }
            WriteResult::PreconditionFailed { current_version } => {
                debug!(
                    job_id = %job.job_id,
                    expected = job.version,
                    current_version,
                    "Job write lost a version race"
                );
                Err(Error::VersionConflict {
                    job_id: job.job_id.clone(),
                    attempts: 1,
                })
            }
        }
    }

    pub fn append_log(&self, entry: &JobLogEntry) -> Result<String> {
        self.store.append_log(entry)
    }

    pub fn job_logs(&self, job_id: &str) -> Result<Vec<JobLogEntry>> {
        self.store.job_logs(job_id)
    }

    /// The N most recent finished jobs of the same process version.
    pub fn recent_finished_jobs(&self, job: &Job, limit: usize) -> Result<Vec<Job>> {
        self.store
            .finished_jobs(&job.process_id, &job.process_version, &job.job_id, limit)
    }

    /// Most recent finished job whose inputs equal `job`'s exactly.
    ///
    /// At most `limit` candidates are examined; `limit == 0` disables caching.
    pub fn find_cache_candidate(&self, job: &Job, limit: usize) -> Result<Option<Job>> {
        if limit == 0 {
            return Ok(None);
        }
        let candidate = self
            .recent_finished_jobs(job, limit)?
            .into_iter()
            .find(|prior| prior.inputs == job.inputs);
        match &candidate {
            Some(prior) => debug!(job_id = %job.job_id, candidate = %prior.job_id, "Cache candidate found"),
            None => debug!(job_id = %job.job_id, "No cache candidate"),
        }
        Ok(candidate)
    }

    /// Outputs of `candidate` that were produced by `stage`.
    pub fn cached_stage_outputs(candidate: &Job, stage: &str) -> Vec<JobOutput> {
        candidate.outputs_for_stage(stage)
    }

    pub fn job_status(&self, job_id: &str) -> Result<JobStatusView> {
        Ok(JobStatusView::from(&self.fetch_job(job_id)?))
    }

    pub fn job_result(&self, job_id: &str) -> Result<JobResultView> {
        Ok(JobResultView::from(&self.fetch_job(job_id)?))
    }
}
