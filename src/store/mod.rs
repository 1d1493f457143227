//! Persistence boundary for jobs, job logs and process definitions
//!
//! [`JobStore`] is the document-store contract the orchestrator consumes.
//! Two backends ship with the crate: [`MemoryStore`] for tests and embedding,
//! and [`FileStore`] for a directory shared by several CLI processes.
//! [`JobRepository`] layers the orchestrator-facing lookups on top.

mod file;
pub mod locking;
mod memory;
mod repository;

use crate::error::Result;
use crate::models::{Job, JobLogEntry, ProcessDefinition};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use repository::JobRepository;

/// Precondition for a conditional job write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Write only if no job with this ID exists yet.
    DoesNotExist,
    /// Write only if the stored job's version matches.
    MatchesVersion(u64),
}

/// Result of a conditional job write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// Write succeeded; the job now carries this version.
    Success {
        /// The new version after the write.
        version: u64,
    },
    /// Precondition failed; nothing was written.
    PreconditionFailed {
        /// The version currently stored (0 when the job does not exist).
        current_version: u64,
    },
}

/// Document-store contract for orchestration state.
///
/// A precondition failure is a normal [`WriteResult`], never an error.
pub trait JobStore: Send + Sync {
    /// Fetch a job by ID, `None` if absent.
    fn get_job(&self, job_id: &str) -> Result<Option<Job>>;

    /// Conditionally write a job.
    ///
    /// On success the stored document carries a version one higher than the
    /// one it replaced (1 for a new job), regardless of `job.version`.
    fn put_job(&self, job: &Job, precondition: WritePrecondition) -> Result<WriteResult>;

    /// Append a log entry under a fresh unique ID and return that ID.
    fn append_log(&self, entry: &JobLogEntry) -> Result<String>;

    /// All log entries of a job, in append order.
    fn job_logs(&self, job_id: &str) -> Result<Vec<JobLogEntry>>;

    /// Finished jobs (`finished != -999`) of a process version, excluding one
    /// job, most recently started first (ties broken by job ID), at most `limit`.
    fn finished_jobs(
        &self,
        process_id: &str,
        process_version: &str,
        exclude_job_id: &str,
        limit: usize,
    ) -> Result<Vec<Job>>;

    /// Fetch a process definition, `None` if absent.
    fn get_process(&self, process_id: &str, version: &str) -> Result<Option<ProcessDefinition>>;

    /// Insert or replace a process definition.
    fn put_process(&self, definition: &ProcessDefinition) -> Result<()>;
}

/// Decide a conditional write against the currently stored version.
///
/// Returns the version to store on success.
pub(crate) fn check_precondition(
    current: Option<u64>,
    precondition: WritePrecondition,
) -> std::result::Result<u64, WriteResult> {
    match (precondition, current) {
        (WritePrecondition::DoesNotExist, None) => Ok(1),
        (WritePrecondition::DoesNotExist, Some(version)) => Err(WriteResult::PreconditionFailed {
            current_version: version,
        }),
        (WritePrecondition::MatchesVersion(expected), Some(version)) if expected == version => {
            Ok(version + 1)
        }
        (WritePrecondition::MatchesVersion(_), current) => Err(WriteResult::PreconditionFailed {
            current_version: current.unwrap_or(0),
        }),
    }
}

/// Shared selection for [`JobStore::finished_jobs`].
pub(crate) fn select_finished<'a>(
    jobs: impl Iterator<Item = &'a Job>,
    process_id: &str,
    process_version: &str,
    exclude_job_id: &str,
    limit: usize,
) -> Vec<Job> {
    let mut matching: Vec<&Job> = jobs
        .filter(|job| {
            job.process_id == process_id
                && job.process_version == process_version
                && job.job_id != exclude_job_id
                && !job.is_in_flight()
        })
        .collect();
    matching.sort_by(|a, b| b.started.cmp(&a.started).then_with(|| a.job_id.cmp(&b.job_id)));
    matching.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_precondition() {
        assert_eq!(check_precondition(None, WritePrecondition::DoesNotExist), Ok(1));
        assert_eq!(
            check_precondition(Some(3), WritePrecondition::DoesNotExist),
            Err(WriteResult::PreconditionFailed { current_version: 3 })
        );
        assert_eq!(check_precondition(Some(3), WritePrecondition::MatchesVersion(3)), Ok(4));
        assert_eq!(
            check_precondition(Some(4), WritePrecondition::MatchesVersion(3)),
            Err(WriteResult::PreconditionFailed { current_version: 4 })
        );
        assert_eq!(
            check_precondition(None, WritePrecondition::MatchesVersion(1)),
            Err(WriteResult::PreconditionFailed { current_version: 0 })
        );
    }
}
