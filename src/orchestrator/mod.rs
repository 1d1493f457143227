//! Job orchestration: the per-notification state machine
//!
//! The orchestrator:
//! - Loads the job and its process definition for every notification
//! - Moves progress on UPDATE heartbeats
//! - On RESULT, records outputs, walks cached results of identical prior jobs,
//!   and requests the next sub-process or finalizes the job
//! - Writes the job with compare-and-swap and retries on conflict
//! - Creates new jobs and re-sends stage requests after a failed publish

mod change;
mod job_orchestrator;
pub mod progress;
mod result_handler;
mod submit;
mod update_handler;


pub use change::UpdateOutcome;
pub use job_orchestrator::{JobOrchestrator, OrchestratorConfig};
pub use submit::Submission;
