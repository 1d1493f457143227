use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::models::process::process_document_id;
use crate::models::{Job, JobLogEntry, ProcessDefinition};

use super::{check_precondition, select_finished, JobStore, WritePrecondition, WriteResult};

/// In-process store backed by mutex-guarded maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<String, Job>>,
    logs: Mutex<Vec<JobLogEntry>>,
    processes: Mutex<HashMap<String, ProcessDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::storage("memory store lock poisoned"))
}

impl JobStore for MemoryStore {
    fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(guard(&self.jobs)?.get(job_id).cloned())
    }

    fn put_job(&self, job: &Job, precondition: WritePrecondition) -> Result<WriteResult> {
        let mut jobs = guard(&self.jobs)?;
        let current = jobs.get(&job.job_id).map(|stored| stored.version);
        let version = match check_precondition(current, precondition) {
            Ok(version) => version,
            Err(failed) => return Ok(failed),
        };

        let mut stored = job.clone();
        stored.version = version;
        jobs.insert(stored.job_id.clone(), stored);
        Ok(WriteResult::Success { version })
    }

    fn append_log(&self, entry: &JobLogEntry) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = entry.clone();
        stored.id = id.clone();
        guard(&self.logs)?.push(stored);
        Ok(id)
    }

    fn job_logs(&self, job_id: &str) -> Result<Vec<JobLogEntry>> {
        Ok(guard(&self.logs)?
            .iter()
            .filter(|entry| entry.job_id == job_id)
            .cloned()
            .collect())
    }

    fn finished_jobs(
        &self,
        process_id: &str,
        process_version: &str,
        exclude_job_id: &str,
        limit: usize,
    ) -> Result<Vec<Job>> {
        let jobs = guard(&self.jobs)?;
        Ok(select_finished(
            jobs.values(),
            process_id,
            process_version,
            exclude_job_id,
            limit,
        ))
    }

    fn get_process(&self, process_id: &str, version: &str) -> Result<Option<ProcessDefinition>> {
        Ok(guard(&self.processes)?
            .get(&process_document_id(process_id, version))
            .cloned())
    }

    fn put_process(&self, definition: &ProcessDefinition) -> Result<()> {
        guard(&self.processes)?.insert(definition.document_id(), definition.clone());
        Ok(())
    }
}
