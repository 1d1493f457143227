//! Inbound transport decoding
//!
//! Notifications reach the orchestrator wrapped in whatever the delivery
//! channel adds around them. Accepted shapes:
//! - a bare notification object
//! - a JSON array of any accepted shape (batch)
//! - a queue batch `{"Records": [{"messageId": "...", "body": "<json>"}]}`
//! - a topic envelope `{"Message": "<json>"}`, typically inside a queue body
//!
//! Unwrapping only removes transport layers; the notification itself is
//! validated by [`Notification::from_value`](crate::models::Notification::from_value)
//! when processed.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::orchestrator::{JobOrchestrator, UpdateOutcome};

/// One notification with the transport ID it arrived under, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message_id: Option<String>,
    pub payload: Value,
}

/// Outcome of processing one inbound message.
#[derive(Debug)]
pub struct MessageReport {
    pub message_id: Option<String>,
    pub job_id: Option<String>,
    pub result: Result<UpdateOutcome>,
}

/// Outcome of processing a batch; each message is independent of the others.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub messages: Vec<MessageReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.messages.iter().filter(|m| m.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.messages.len() - self.succeeded()
    }

    /// Transport IDs of failed messages that are worth redelivering.
    pub fn retryable_message_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| matches!(&m.result, Err(e) if e.is_retryable()))
            .filter_map(|m| m.message_id.clone())
            .collect()
    }
}

/// Strip transport envelopes from raw inbound text.
pub fn unwrap_envelopes(text: &str) -> Result<Vec<InboundMessage>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::invalid_notification("$", format!("not valid JSON: {e}")))?;
    let mut messages = Vec::new();
    unwrap_value(value, "$", None, &mut messages)?;
    Ok(messages)
}

fn unwrap_value(
    value: Value,
    path: &str,
    message_id: Option<String>,
    out: &mut Vec<InboundMessage>,
) -> Result<()> {
    match value {
        Value::Array(items) => {
            for (idx, item) in items.into_iter().enumerate() {
                unwrap_value(item, &format!("{path}[{idx}]"), message_id.clone(), out)?;
            }
            Ok(())
        }
        Value::Object(mut obj) if obj.contains_key("Records") => {
            let Some(Value::Array(records)) = obj.remove("Records") else {
                return Err(Error::invalid_notification(
                    format!("{path}.Records"),
                    "expected an array",
                ));
            };
            for (idx, record) in records.into_iter().enumerate() {
                let field = format!("{path}.Records[{idx}]");
                let id = record
                    .get("messageId")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let body = record
                    .get("body")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::invalid_notification(format!("{field}.body"), "expected a JSON string")
                    })?;
                let inner = parse_embedded(body, &format!("{field}.body"))?;
                unwrap_value(inner, &format!("{field}.body"), id, out)?;
            }
            Ok(())
        }
        Value::Object(obj) if !obj.contains_key("messageType") && obj.contains_key("Message") => {
            let field = format!("{path}.Message");
            let message = obj
                .get("Message")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::invalid_notification(&field, "expected a JSON string"))?;
            let inner = parse_embedded(message, &field)?;
            unwrap_value(inner, &field, message_id, out)
        }
        Value::Object(_) => {
            out.push(InboundMessage {
                message_id,
                payload: value,
            });
            Ok(())
        }
        _ => Err(Error::invalid_notification(path, "expected a JSON object or array")),
    }
}

fn parse_embedded(text: &str, field: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::invalid_notification(field, format!("not valid JSON: {e}")))
}

/// Unwrap `text` and process every notification in it.
///
/// A failing notification does not stop the others; only a malformed
/// transport envelope fails the batch as a whole.
pub fn process_batch(orchestrator: &JobOrchestrator, text: &str) -> Result<BatchReport> {
    let messages = unwrap_envelopes(text)?;
    let mut report = BatchReport::default();

    for message in messages {
        let job_id = message
            .payload
            .get("jobID")
            .and_then(Value::as_str)
            .map(str::to_string);
        let result = orchestrator.process_value(&message.payload);
        if let Err(e) = &result {
            warn!(
                job_id = job_id.as_deref().unwrap_or("-"),
                message_id = message.message_id.as_deref().unwrap_or("-"),
                kind = ?e.kind(),
                error = %e,
                "Notification failed"
            );
        }
        report.messages.push(MessageReport {
            message_id: message.message_id,
            job_id,
            result,
        });
    }

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Processed notification batch"
    );
    Ok(report)
}
