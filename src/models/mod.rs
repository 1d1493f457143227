pub mod constants;
pub mod job;
pub mod notification;
pub mod process;
pub mod views;

pub use job::{Job, JobLogEntry, JobOutput, JobStatus};
pub use notification::{Notification, ResultStatus, StageRequest};
pub use process::ProcessDefinition;
pub use views::{JobResultView, JobStatusView};
