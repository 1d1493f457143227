use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::process::process_document_id;
use crate::models::{Job, JobLogEntry, ProcessDefinition};
use crate::validation::validate_id;

use super::locking::{locked_append_line, locked_read, locked_update};
use super::{check_precondition, select_finished, JobStore, WritePrecondition, WriteResult};

const JOBS_DIR: &str = "jobs";
const PROCESSES_DIR: &str = "processes";
const LOGS_DIR: &str = "logs";

/// Directory-backed store shared safely between processes.
///
/// Layout under `root`:
/// - `jobs/<jobID>.json`
/// - `processes/<id>___<version>.json`
/// - `logs/<jobID>.jsonl` (one entry per line)
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating its directories if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [JOBS_DIR, PROCESSES_DIR, LOGS_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| {
                Error::storage_with_source(format!("failed to create {}", path.display()), e)
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn job_path(&self, job_id: &str) -> Result<PathBuf> {
        validate_id("jobID", job_id)?;
        Ok(self.root.join(JOBS_DIR).join(format!("{job_id}.json")))
    }

    fn log_path(&self, job_id: &str) -> Result<PathBuf> {
        validate_id("jobID", job_id)?;
        Ok(self.root.join(LOGS_DIR).join(format!("{job_id}.jsonl")))
    }

    fn process_path(&self, process_id: &str, version: &str) -> Result<PathBuf> {
        validate_id("processID", process_id)?;
        validate_id("processVersion", version)?;
        Ok(self
            .root
            .join(PROCESSES_DIR)
            .join(format!("{}.json", process_document_id(process_id, version))))
    }

    fn read_job_file(path: &Path) -> Result<Option<Job>> {
        match locked_read(path)? {
            // A file left empty by a rejected conditional write holds no job
            Some(content) if !content.trim().is_empty() => Ok(Some(parse_job(path, &content)?)),
            _ => Ok(None),
        }
    }
}

fn parse_job(path: &Path, content: &str) -> Result<Job> {
    serde_json::from_str(content).map_err(|e| {
        Error::storage_with_source(format!("corrupt job document {}", path.display()), e)
    })
}

impl JobStore for FileStore {
    fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Self::read_job_file(&self.job_path(job_id)?)
    }

    fn put_job(&self, job: &Job, precondition: WritePrecondition) -> Result<WriteResult> {
        let path = self.job_path(&job.job_id)?;
        locked_update(&path, |current| {
            let current_version = match current.filter(|c| !c.trim().is_empty()) {
                Some(content) => Some(parse_job(&path, content)?.version),
                None => None,
            };
            match check_precondition(current_version, precondition) {
                Ok(version) => {
                    let mut stored = job.clone();
                    stored.version = version;
                    let content = serde_json::to_string_pretty(&stored)?;
                    debug!(job_id = %job.job_id, version, "Writing job document");
                    Ok((Some(content), WriteResult::Success { version }))
                }
                Err(failed) => Ok((None, failed)),
            }
        })
    }

    fn append_log(&self, entry: &JobLogEntry) -> Result<String> {
        let path = self.log_path(&entry.job_id)?;
        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = entry.clone();
        stored.id = id.clone();
        locked_append_line(&path, &serde_json::to_string(&stored)?)?;
        Ok(id)
    }

    fn job_logs(&self, job_id: &str) -> Result<Vec<JobLogEntry>> {
        let path = self.log_path(job_id)?;
        let Some(content) = locked_read(&path)? else {
            return Ok(Vec::new());
        };
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    Error::storage_with_source(format!("corrupt log line in {}", path.display()), e)
                })
            })
            .collect()
    }

    fn finished_jobs(
        &self,
        process_id: &str,
        process_version: &str,
        exclude_job_id: &str,
        limit: usize,
    ) -> Result<Vec<Job>> {
        let dir = self.root.join(JOBS_DIR);
        let entries = fs::read_dir(&dir).map_err(|e| {
            Error::storage_with_source(format!("failed to list {}", dir.display()), e)
        })?;

        let mut jobs = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::storage_with_source("failed to read job directory entry", e))?
                .path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(job) = Self::read_job_file(&path)? {
                jobs.push(job);
            }
        }

        Ok(select_finished(
            jobs.iter(),
            process_id,
            process_version,
            exclude_job_id,
            limit,
        ))
    }

    fn get_process(&self, process_id: &str, version: &str) -> Result<Option<ProcessDefinition>> {
        let path = self.process_path(process_id, version)?;
        match locked_read(&path)? {
            Some(content) => serde_json::from_str(&content).map(Some).map_err(|e| {
                Error::storage_with_source(
                    format!("corrupt process document {}", path.display()),
                    e,
                )
            }),
            None => Ok(None),
        }
    }

    fn put_process(&self, definition: &ProcessDefinition) -> Result<()> {
        let path = self.process_path(&definition.id, &definition.version)?;
        let content = serde_json::to_string_pretty(definition)?;
        locked_update(&path, |_| Ok((Some(content), ())))
    }
}
