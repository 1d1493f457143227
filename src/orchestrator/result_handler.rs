//! RESULT (stage termination) handling

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::constants::PRE_PROCESSED;
use crate::models::{Job, JobOutput, ResultStatus, StageRequest};
use crate::pipeline::{NextStep, StageGraph};
use crate::store::JobRepository;

use super::change::{JobChange, UpdateOutcome};
use super::JobOrchestrator;

/// The fields of a RESULT notification the handler works on.
#[derive(Debug, Clone, Copy)]
pub(super) struct StageResult<'a> {
    pub stage: &'a str,
    pub status: ResultStatus,
    pub message: Option<&'a str>,
    pub outputs: Option<&'a [JobOutput]>,
}

impl JobOrchestrator {
    pub(super) fn apply_result(
        &self,
        mut job: Job,
        graph: &StageGraph,
        result: &StageResult<'_>,
        now: i64,
    ) -> Result<JobChange> {
        let stage = result.stage;
        let text = result.message.unwrap_or_default();
        let is_entry = stage == PRE_PROCESSED;

        // The entry sentinel owns no range; a failure there keeps current progress
        let stage_end = if is_entry {
            job.progress
        } else {
            f64::from(graph.progress_range(stage)?.1)
        };

        if let Some(outputs) = result.outputs {
            job.append_stage_outputs(stage, outputs);
        }

        let mut change = JobChange::new(job, UpdateOutcome::Failed);
        change.log(stage, format!("finished:: {}:: {text}", result.status), now);

        if result.status == ResultStatus::Failed {
            change.job.fail(stage_end, format!("{stage}:: {text}"), now)?;
            info!(job_id = %change.job.job_id, stage, "Job failed");
            return Ok(change);
        }

        if !is_entry && result.outputs.is_none() {
            change
                .job
                .fail(stage_end, format!("{stage}:: missing outputs"), now)?;
            change.violation = Some(Error::MissingOutputs {
                job_id: change.job.job_id.clone(),
                stage: stage.to_string(),
            });
            return Ok(change);
        }

        let flags = change.job.executing_stage_flags()?;
        let mut next = graph.next(stage, &flags)?;
        debug!(job_id = %change.job.job_id, stage, next = next.as_str(), "Stage finished");

        let candidate = match next {
            NextStep::SubProcess(_) => self
                .repository
                .find_cache_candidate(&change.job, self.config.caching_jobs)?,
            NextStep::Finished => None,
        };

        let mut cached = 0;
        let next_stage = loop {
            let name = match next {
                NextStep::SubProcess(name) => name,
                NextStep::Finished => {
                    change.job.succeed(format!("{stage}:: {text}"), now)?;
                    change.outcome = UpdateOutcome::Succeeded { cached };
                    info!(job_id = %change.job.job_id, cached, "Job succeeded");
                    return Ok(change);
                }
            };

            let hits = candidate
                .as_ref()
                .map(|prior| JobRepository::cached_stage_outputs(prior, &name))
                .unwrap_or_default();
            if hits.is_empty() {
                break name;
            }

            debug!(job_id = %change.job.job_id, stage = %name, outputs = hits.len(), "Reusing cached outputs");
            change.log(&name, "found cached result", now);
            change.job.outputs.extend(hits);
            change.job.progress = f64::from(graph.progress_range(&name)?.1);
            change.job.message = format!("{name}:: cached");
            change.job.touch(now);
            cached += 1;

            next = graph.next(&name, &flags)?;
        };

        self.dispatch(change, graph, next_stage, is_entry, cached, now)
    }

    /// Move the job onto `stage` and prepare its start request.
    fn dispatch(
        &self,
        mut change: JobChange,
        graph: &StageGraph,
        stage: String,
        entered_pipeline: bool,
        cached: usize,
        now: i64,
    ) -> Result<JobChange> {
        let (start, _) = graph.progress_range(&stage)?;
        let job = &mut change.job;

        if entered_pipeline {
            job.start(now)?;
        }
        job.progress = f64::from(start);
        job.message = format!("{stage}:: starting");
        job.current_stage = Some(stage.clone());
        job.touch(now);

        let request = StageRequest::new(&job.job_id, &stage, job.inputs.clone(), job.outputs.clone());
        info!(job_id = %job.job_id, stage = %stage, progress = job.progress, "Dispatching sub-process");

        change.request = Some(request);
        change.log(&stage, "starting", now);
        change.outcome = UpdateOutcome::Dispatched {
            progress: f64::from(start),
            stage,
            cached,
        };
        Ok(change)
    }
}
