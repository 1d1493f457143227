//! Stage notifications exchanged with external workers
//!
//! Inbound envelopes are loosely-typed JSON. They are decoded exactly once,
//! here, into [`Notification`]; everything downstream works on the typed form.
//! Outbound stage-start requests are [`StageRequest`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::models::constants::{OUTPUT_NAMES, PRE_PROCESSED};
use crate::models::job::JobOutput;

/// Terminal outcome reported by a stage worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Successful,
    Failed,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultStatus::Successful => write!(f, "SUCCESSFUL"),
            ResultStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A decoded inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// In-stage progress heartbeat (`messageType: UPDATE`, `status: RUNNING`).
    Update {
        job_id: String,
        stage: String,
        message: String,
    },
    /// Stage termination (`messageType: RESULT`).
    Result {
        job_id: String,
        stage: String,
        status: ResultStatus,
        message: Option<String>,
        /// Raw (not yet namespaced) outputs; `None` when the field was absent.
        outputs: Option<Vec<JobOutput>>,
    },
}

impl Notification {
    /// Parse and validate a notification from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::invalid_notification("$", format!("not valid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate a JSON envelope and decode it.
    ///
    /// The common envelope (`jobID`, `messageType`) is checked first, then the
    /// payload for the specific message type. The first offending field is
    /// reported.
    ///
    /// Walked by hand rather than through a `#[serde(tag = "messageType")]`
    /// derive so the error names the exact field that failed.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::invalid_notification("$", "expected a JSON object"))?;

        let job_id = required_str(obj, "jobID")?;
        let message_type = required_str(obj, "messageType")?;

        match message_type.as_str() {
            "UPDATE" => {
                let stage = required_str(obj, "stage")?;
                let status = required_str(obj, "status")?;
                if status != "RUNNING" {
                    return Err(Error::invalid_notification(
                        "status",
                        format!("`{status}` is not one of [RUNNING]"),
                    ));
                }
                let message = required_str(obj, "message")?;
                Ok(Notification::Update {
                    job_id,
                    stage,
                    message,
                })
            }
            "RESULT" => {
                let stage = required_str(obj, "stage")?;
                let status = match required_str(obj, "status")?.as_str() {
                    "SUCCESSFUL" => ResultStatus::Successful,
                    "FAILED" => ResultStatus::Failed,
                    other => {
                        return Err(Error::invalid_notification(
                            "status",
                            format!("`{other}` is not one of [SUCCESSFUL, FAILED]"),
                        ))
                    }
                };
                let message = optional_str(obj, "message")?;
                let outputs = match obj.get("outputs") {
                    None => None,
                    Some(raw) => Some(decode_outputs(raw)?),
                };
                Ok(Notification::Result {
                    job_id,
                    stage,
                    status,
                    message,
                    outputs,
                })
            }
            other => Err(Error::invalid_notification(
                "messageType",
                format!("`{other}` is not one of [UPDATE, RESULT]"),
            )),
        }
    }

    /// The pipeline-entry RESULT that kicks off a freshly created job.
    pub fn pipeline_entry(job_id: &str) -> Self {
        Notification::Result {
            job_id: job_id.to_string(),
            stage: PRE_PROCESSED.to_string(),
            status: ResultStatus::Successful,
            message: Some("Requesting to start this job".to_string()),
            outputs: None,
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Notification::Update { job_id, .. } | Notification::Result { job_id, .. } => job_id,
        }
    }

    pub fn stage(&self) -> &str {
        match self {
            Notification::Update { stage, .. } | Notification::Result { stage, .. } => stage,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Notification::Update { .. } => "UPDATE",
            Notification::Result { .. } => "RESULT",
        }
    }

    /// Encode back into the wire envelope.
    pub fn to_value(&self) -> Value {
        match self {
            Notification::Update {
                job_id,
                stage,
                message,
            } => json!({
                "jobID": job_id,
                "messageType": "UPDATE",
                "stage": stage,
                "status": "RUNNING",
                "message": message,
            }),
            Notification::Result {
                job_id,
                stage,
                status,
                message,
                outputs,
            } => {
                let mut envelope = json!({
                    "jobID": job_id,
                    "messageType": "RESULT",
                    "stage": stage,
                    "status": status.to_string(),
                });
                if let Some(message) = message {
                    envelope["message"] = json!(message);
                }
                if let Some(outputs) = outputs {
                    envelope["outputs"] = json!(outputs);
                }
                envelope
            }
        }
    }
}

fn required_str(obj: &Map<String, Value>, field: &str) -> Result<String> {
    match obj.get(field) {
        None => Err(Error::invalid_notification(field, "required field is missing")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::invalid_notification(field, "expected a string")),
    }
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_notification(field, "expected a string")),
    }
}

fn decode_outputs(raw: &Value) -> Result<Vec<JobOutput>> {
    let items = raw
        .as_array()
        .ok_or_else(|| Error::invalid_notification("outputs", "expected an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let field = |name: &str| format!("outputs[{idx}].{name}");
            let obj = item
                .as_object()
                .ok_or_else(|| Error::invalid_notification(format!("outputs[{idx}]"), "expected an object"))?;

            let name = match obj.get("name") {
                Some(Value::String(s)) => s.clone(),
                Some(_) => return Err(Error::invalid_notification(field("name"), "expected a string")),
                None => {
                    return Err(Error::invalid_notification(
                        field("name"),
                        "required field is missing",
                    ))
                }
            };
            if !OUTPUT_NAMES.contains(&name.as_str()) {
                return Err(Error::invalid_notification(
                    field("name"),
                    format!("`{name}` is not one of {OUTPUT_NAMES:?}"),
                ));
            }

            let value = match obj.get("value") {
                Some(Value::String(s)) => s.clone(),
                Some(_) => return Err(Error::invalid_notification(field("value"), "expected a string")),
                None => {
                    return Err(Error::invalid_notification(
                        field("value"),
                        "required field is missing",
                    ))
                }
            };

            Ok(JobOutput { name, value })
        })
        .collect()
}

/// Stage-start request published to the worker channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageRequest {
    #[serde(rename = "messageType")]
    pub message_type: String,
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub stage: String,
    pub inputs: Value,
    pub current_outputs: Vec<JobOutput>,
}

impl StageRequest {
    pub const MESSAGE_TYPE: &'static str = "REQUEST";

    pub fn new(job_id: &str, stage: &str, inputs: Value, current_outputs: Vec<JobOutput>) -> Self {
        Self {
            message_type: Self::MESSAGE_TYPE.to_string(),
            job_id: job_id.to_string(),
            stage: stage.to_string(),
            inputs,
            current_outputs,
        }
    }
}
