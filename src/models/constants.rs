//! Shared constants for job and pipeline handling

/// Pipeline-entry sentinel stage. A RESULT for this stage starts a job.
pub const PRE_PROCESSED: &str = "PRE_PROCESSED";

/// Sentinel returned by the stage graph when no sub-process remains.
pub const FINISHED: &str = "FINISHED";

/// Timestamp value for "not set yet" (started, finished, updated).
pub const UNSET_TIMESTAMP: i64 = -999;

/// Separator between the producing sub-process and the original output name.
pub const OUTPUT_NAMESPACE_SEPARATOR: &str = "__";

/// Output names a stage worker may report.
pub const OUTPUT_NAMES: &[&str] = &["DATA", "METADATA", "ANCILLARY"];

/// Job `type` field value.
pub const JOB_TYPE_PROCESS: &str = "process";

/// Default cap on cache candidates considered per lookup.
pub const DEFAULT_CACHING_JOBS: usize = 100;

/// Upper bound of job progress.
pub const PROGRESS_COMPLETE: f64 = 100.0;
