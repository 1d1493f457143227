//! UPDATE (heartbeat) handling

use tracing::debug;

use crate::error::Result;
use crate::models::Job;
use crate::pipeline::StageGraph;

use super::change::{JobChange, UpdateOutcome};
use super::progress::heartbeat_progress;
use super::JobOrchestrator;

impl JobOrchestrator {
    pub(super) fn apply_update(
        &self,
        mut job: Job,
        graph: &StageGraph,
        stage: &str,
        message: &str,
        now: i64,
    ) -> Result<JobChange> {
        let range = graph.progress_range(stage)?;
        let progress = heartbeat_progress(job.progress, range);
        debug!(
            job_id = %job.job_id,
            stage,
            from = job.progress,
            to = progress,
            range = ?range,
            "Heartbeat"
        );

        job.progress = progress;
        job.message = format!("{stage}:: {message}");
        job.touch(now);

        let mut change = JobChange::new(job, UpdateOutcome::Progressed { progress });
        change.log(stage, message, now);
        Ok(change)
    }
}
