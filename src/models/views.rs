//! Read models served to the REST front door
//!
//! Field names are part of the external contract and must not change.

use serde::{Deserialize, Serialize};

use crate::models::job::{Job, JobOutput};
use crate::utils::format_timestamp;

/// Job status document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobStatusView {
    #[serde(rename = "processID")]
    pub process_id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: String,
    pub message: String,
    pub created: Option<String>,
    pub started: Option<String>,
    pub finished: Option<String>,
    pub updated: Option<String>,
    pub progress: i64,
}

/// Job result document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobResultView {
    #[serde(rename = "processResults")]
    pub process_results: Vec<JobOutput>,
}

impl From<&Job> for JobStatusView {
    fn from(job: &Job) -> Self {
        Self {
            process_id: job.process_id.clone(),
            job_type: job.job_type.clone(),
            job_id: job.job_id.clone(),
            status: job.status.to_string(),
            message: job.message.clone(),
            created: format_timestamp(job.created),
            started: format_timestamp(job.started),
            finished: format_timestamp(job.finished),
            updated: format_timestamp(job.updated),
            progress: job.progress.trunc() as i64,
        }
    }
}

impl From<&Job> for JobResultView {
    fn from(job: &Job) -> Self {
        Self {
            process_results: job.outputs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_job() -> Job {
        let mut job = Job::new(
            "hydro".to_string(),
            "1.0".to_string(),
            json!({"executingStageFlags": [true]}),
        );
        job.job_id = "job-1".to_string();
        job.created = 1_686_675_662;
        job.progress = 34.64;
        job.message = "RRR:: progressing".to_string();
        job.outputs = vec![JobOutput::new("LIS__DATA", "s3://lis")];
        job
    }

    #[test]
    fn test_status_view_fields() {
        let view = JobStatusView::from(&sample_job());
        let doc = serde_json::to_value(&view).unwrap();
        assert_eq!(doc["processID"], "hydro");
        assert_eq!(doc["type"], "process");
        assert_eq!(doc["jobID"], "job-1");
        assert_eq!(doc["status"], "ACCEPTED");
        assert_eq!(doc["created"], "2023-06-13T17:01:02 +00:00");
        assert!(doc["started"].is_null());
        assert_eq!(doc["progress"], 34);
    }

    #[test]
    fn test_result_view_fields() {
        let view = JobResultView::from(&sample_job());
        let doc = serde_json::to_value(&view).unwrap();
        assert_eq!(doc["processResults"][0]["name"], "LIS__DATA");
        assert_eq!(doc["processResults"][0]["value"], "s3://lis");
    }
}
