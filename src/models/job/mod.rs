mod methods;
mod transitions;
mod types;


pub use methods::EXECUTING_STAGE_FLAGS;
pub use types::{Job, JobLogEntry, JobOutput, JobStatus};
