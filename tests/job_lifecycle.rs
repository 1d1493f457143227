//! Integration tests driving jobs through the file-backed store and outbox

use heddle::commands::watch::drain_inbox;
use heddle::commands::{submit::enqueue, Runtime};
use heddle::config::Config;
use heddle::inbound::process_batch;
use heddle::models::{JobStatus, ProcessDefinition, StageRequest};
use heddle::orchestrator::UpdateOutcome;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, Runtime) {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.store.root = temp.path().join("store");
    let runtime = Runtime::from_config(config).expect("Should open runtime");
    runtime
        .orchestrator
        .deploy_process(&ProcessDefinition::with_stages(
            "hydro",
            "1.0",
            &[&["LIS"], &["RRR", "RAPID"]],
        ))
        .expect("Should deploy process");
    (temp, runtime)
}

fn outbox(runtime: &Runtime) -> Vec<StageRequest> {
    fs::read_to_string(runtime.config.outbox_path())
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("Outbox line should be a request"))
        .collect()
}

/// Wrap notifications the way a queue delivers a topic fan-out.
fn queue_batch(notifications: &[Value]) -> String {
    let records: Vec<Value> = notifications
        .iter()
        .enumerate()
        .map(|(idx, n)| {
            json!({
                "messageId": format!("msg-{idx}"),
                "body": json!({"Type": "Notification", "Message": n.to_string()}).to_string(),
            })
        })
        .collect();
    json!({ "Records": records }).to_string()
}

fn result(job_id: &str, stage: &str, outputs: &[&str]) -> Value {
    let outputs: Vec<Value> = outputs
        .iter()
        .map(|name| json!({"name": name, "value": format!("s3://bucket/{job_id}/{stage}/{name}")}))
        .collect();
    json!({
        "jobID": job_id,
        "messageType": "RESULT",
        "stage": stage,
        "status": "SUCCESSFUL",
        "message": "done",
        "outputs": outputs,
    })
}

#[test]
fn test_job_runs_to_completion_through_file_store() {
    let (_temp, runtime) = setup();
    let submission = runtime
        .orchestrator
        .submit("hydro", "1.0", json!({"executingStageFlags": [false, true]}))
        .expect("Should submit job");
    let job_id = submission.job.job_id.clone();

    // Entry notification goes through the inbox
    enqueue(&runtime.inbox_dir(), &submission.entry).expect("Should enqueue entry");
    let summary = drain_inbox(&runtime.orchestrator, &runtime.inbox_dir()).unwrap();
    assert_eq!(summary.processed, 1);

    let requests = outbox(&runtime);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].stage, "RRR");
    assert_eq!(requests[0].message_type, "REQUEST");
    assert_eq!(requests[0].inputs["executingStageFlags"], json!([false, true]));
    assert!(requests[0].current_outputs.is_empty());

    let heartbeat = json!({
        "jobID": job_id,
        "messageType": "UPDATE",
        "stage": "RRR",
        "status": "RUNNING",
        "message": "downloading",
    });
    let report = process_batch(
        &runtime.orchestrator,
        &queue_batch(&[heartbeat, result(&job_id, "RRR", &["DATA", "METADATA"])]),
    )
    .unwrap();
    assert_eq!(report.failed(), 0);
    assert!(matches!(
        report.messages[0].result,
        Ok(UpdateOutcome::Progressed { .. })
    ));
    assert_eq!(report.messages[1].message_id.as_deref(), Some("msg-1"));

    let requests = outbox(&runtime);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].stage, "RAPID");
    let names: Vec<&str> = requests[1]
        .current_outputs
        .iter()
        .map(|o| o.name.as_str())
        .collect();
    assert_eq!(names, vec!["RRR__DATA", "RRR__METADATA"]);

    let report = process_batch(
        &runtime.orchestrator,
        &queue_batch(&[result(&job_id, "RAPID", &["DATA"])]),
    )
    .unwrap();
    assert!(matches!(
        report.messages[0].result,
        Ok(UpdateOutcome::Succeeded { cached: 0 })
    ));

    let status = runtime.orchestrator.repository().job_status(&job_id).unwrap();
    assert_eq!(status.status, JobStatus::Successful.to_string());
    assert_eq!(status.progress, 100);

    let results = runtime.orchestrator.repository().job_result(&job_id).unwrap();
    assert_eq!(results.process_results.len(), 3);

    let logs = runtime.orchestrator.repository().job_logs(&job_id).unwrap();
    assert!(logs.iter().any(|l| l.stage == "RRR" && l.message == "downloading"));
    assert!(logs.iter().any(|l| l.message.starts_with("finished:: SUCCESSFUL")));

    // A late notification for the finished job changes nothing
    let job_before = runtime.orchestrator.repository().fetch_job(&job_id).unwrap();
    let report = process_batch(
        &runtime.orchestrator,
        &queue_batch(&[result(&job_id, "RAPID", &["DATA"])]),
    )
    .unwrap();
    assert!(matches!(report.messages[0].result, Ok(UpdateOutcome::Ignored)));
    let job_after = runtime.orchestrator.repository().fetch_job(&job_id).unwrap();
    assert_eq!(job_before, job_after);
    assert_eq!(outbox(&runtime).len(), 2);
}

#[test]
fn test_failed_stage_terminates_job() {
    let (_temp, runtime) = setup();
    let submission = runtime
        .orchestrator
        .submit("hydro", "1.0", json!({"executingStageFlags": [true, true]}))
        .unwrap();
    let job_id = submission.job.job_id.clone();
    runtime.orchestrator.process_update(&submission.entry).unwrap();

    let failure = json!({
        "jobID": job_id,
        "messageType": "RESULT",
        "stage": "LIS",
        "status": "FAILED",
        "message": "model diverged",
    });
    let report = process_batch(&runtime.orchestrator, &failure.to_string()).unwrap();
    assert!(matches!(report.messages[0].result, Ok(UpdateOutcome::Failed)));

    let job = runtime.orchestrator.repository().fetch_job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.message, "LIS:: model diverged");
    assert_eq!(job.progress, 33.0);
    assert!(job.finished >= job.started);
    assert_eq!(outbox(&runtime).len(), 1);
}

#[test]
fn test_malformed_notification_is_reported_not_retried() {
    let (_temp, runtime) = setup();
    let submission = runtime
        .orchestrator
        .submit("hydro", "1.0", json!({"executingStageFlags": [true, true]}))
        .unwrap();

    let missing_stage = json!({
        "jobID": submission.job.job_id,
        "messageType": "UPDATE",
        "status": "RUNNING",
        "message": "hi",
    });
    let report = process_batch(&runtime.orchestrator, &queue_batch(&[missing_stage])).unwrap();
    assert_eq!(report.failed(), 1);
    assert!(report.retryable_message_ids().is_empty());

    let job = runtime
        .orchestrator
        .repository()
        .fetch_job(&submission.job.job_id)
        .unwrap();
    assert_eq!(job.status, JobStatus::Accepted);
}
