//! Job creation and process registration

use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::job::EXECUTING_STAGE_FLAGS;
use crate::models::{Job, Notification, ProcessDefinition};
use crate::pipeline::StageGraph;

use super::JobOrchestrator;

/// A freshly created job and the notification that starts it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job: Job,
    /// Pipeline-entry RESULT to deliver on the inbound channel.
    pub entry: Notification,
}

impl JobOrchestrator {
    /// Create an ACCEPTED job for a stored process definition.
    ///
    /// The job does nothing until its entry notification is processed.
    ///
    /// # Arguments
    ///
    /// * `process_id` - ID of the process to run
    /// * `process_version` - Version of the process to run
    /// * `inputs` - Job inputs; must carry one `executingStageFlags` entry per stage-group
    ///
    /// # Returns
    ///
    /// The stored job and its pipeline-entry notification.
    pub fn submit(&self, process_id: &str, process_version: &str, inputs: Value) -> Result<Submission> {
        let definition = self.repository.fetch_process(process_id, process_version)?;
        let graph = StageGraph::configure(&definition)?;

        let mut job = Job::new(process_id.to_string(), process_version.to_string(), inputs);
        let flags = job.executing_stage_flags()?;
        if flags.len() != graph.stage_count() {
            return Err(Error::invalid_inputs(
                EXECUTING_STAGE_FLAGS,
                format!(
                    "expected {} flags (one per stage-group), got {}",
                    graph.stage_count(),
                    flags.len()
                ),
            ));
        }

        self.repository.create_job(&mut job)?;
        info!(job_id = %job.job_id, process_id, process_version, "Job accepted");

        let entry = Notification::pipeline_entry(&job.job_id);
        Ok(Submission { job, entry })
    }

    /// Validate a process definition's stage layout and store it.
    pub fn deploy_process(&self, definition: &ProcessDefinition) -> Result<StageGraph> {
        let graph = StageGraph::configure(definition)?;
        self.repository.store().put_process(definition)?;
        info!(
            process_id = %definition.id,
            version = %definition.version,
            stages = graph.stage_count(),
            sub_processes = graph.sub_process_count(),
            "Process deployed"
        );
        Ok(graph)
    }
}
