//! Outbound trigger channel for stage-start requests

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::info;

use crate::error::{Error, Result};
use crate::models::StageRequest;
use crate::store::locking::locked_append_line;

/// Sends [`StageRequest`]s to the external stage workers.
pub trait Publisher: Send + Sync {
    fn publish(&self, request: &StageRequest) -> Result<()>;
}

/// Appends each request as one JSON line to an outbox file.
///
/// Workers (or a forwarding process) tail the file; appends from concurrent
/// orchestrator processes are serialised by an exclusive lock.
#[derive(Debug, Clone)]
pub struct OutboxPublisher {
    path: PathBuf,
}

impl OutboxPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Publisher for OutboxPublisher {
    fn publish(&self, request: &StageRequest) -> Result<()> {
        let line = serde_json::to_string(request)
            .map_err(|e| Error::publish_with_source("failed to encode stage request", e))?;
        locked_append_line(&self.path, &line).map_err(|e| Error::Publish {
            message: format!("failed to append to outbox {}", self.path.display()),
            source: Some(Box::new(e)),
        })?;
        info!(job_id = %request.job_id, stage = %request.stage, "Published stage request");
        Ok(())
    }
}

/// Collects published requests in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    requests: Mutex<Vec<StageRequest>>,
    fail: Mutex<bool>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request published so far, in order.
    pub fn requests(&self) -> Vec<StageRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut fail) = self.fail.lock() {
            *fail = failing;
        }
    }
}

impl Publisher for MemoryPublisher {
    fn publish(&self, request: &StageRequest) -> Result<()> {
        if self.fail.lock().map(|fail| *fail).unwrap_or(false) {
            return Err(Error::Publish {
                message: "publisher unavailable".to_string(),
                source: None,
            });
        }
        self.requests
            .lock()
            .map_err(|_| Error::Publish {
                message: "memory publisher lock poisoned".to_string(),
                source: None,
            })?
            .push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobOutput;
    use crate::store::locking::locked_read;
    use serde_json::json;

    #[test]
    fn test_outbox_appends_request_envelopes() {
        let temp = tempfile::tempdir().unwrap();
        let publisher = OutboxPublisher::new(temp.path().join("outbox.jsonl"));
        let request = StageRequest::new(
            "job-1",
            "RRR",
            json!({"executingStageFlags": [true, true]}),
            vec![JobOutput::new("LIS__DATA", "s3://bucket/lis")],
        );
        publisher.publish(&request).unwrap();
        publisher.publish(&request).unwrap();

        let content = locked_read(publisher.path()).unwrap().unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let envelope: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(envelope["messageType"], "REQUEST");
        assert_eq!(envelope["jobID"], "job-1");
        assert_eq!(envelope["stage"], "RRR");
        assert_eq!(envelope["current_outputs"][0]["name"], "LIS__DATA");
    }

    #[test]
    fn test_outbox_failure_is_publish_error() {
        let temp = tempfile::tempdir().unwrap();
        let publisher = OutboxPublisher::new(temp.path().join("missing-dir").join("outbox.jsonl"));
        let request = StageRequest::new("job-1", "RRR", json!({}), vec![]);
        let err = publisher.publish(&request).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Publish);
    }

    #[test]
    fn test_memory_publisher_can_fail() {
        let publisher = MemoryPublisher::new();
        let request = StageRequest::new("job-1", "RRR", json!({}), vec![]);
        publisher.set_failing(true);
        assert!(publisher.publish(&request).is_err());
        publisher.set_failing(false);
        publisher.publish(&request).unwrap();
        assert_eq!(publisher.requests().len(), 1);
    }
}
