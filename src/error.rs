//! Error types for job orchestration.

/// The result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by transports to decide
/// whether a message should be retried, dropped, or alerted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed notification, job input or document. Never retried.
    Validation,
    /// Unknown job or process.
    NotFound,
    /// A job-level invariant was broken; the job has been marked FAILED.
    InvariantViolation,
    /// Malformed stage layout or runtime configuration.
    Configuration,
    /// Optimistic concurrency retries were exhausted.
    Conflict,
    /// The persistence backend failed.
    Storage,
    /// The outbound trigger channel failed.
    Publish,
}

/// Errors that can occur while orchestrating jobs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message or document failed validation.
    #[error("invalid {subject}: field `{field}`: {message}")]
    Validation {
        /// What was being validated (notification, inputs, ...).
        subject: &'static str,
        /// The offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A job was not found in the store.
    #[error("no such job: {job_id}")]
    JobNotFound {
        /// The job ID that was not found.
        job_id: String,
    },

    /// A process definition was not found in the store.
    #[error("no such process: {process_id}, version: {version}")]
    ProcessNotFound {
        /// The process ID.
        process_id: String,
        /// The requested version.
        version: String,
    },

    /// A stage name is not part of the process layout.
    #[error("unknown sub-process name: {name}")]
    UnknownSubProcess {
        /// The unrecognized name.
        name: String,
    },

    /// The job's executing-stage flags do not match the layout.
    #[error("executingStageFlags has {actual} entries but the process has {expected} stages")]
    StageFlagMismatch {
        /// Number of stage-groups in the process layout.
        expected: usize,
        /// Number of flags on the job.
        actual: usize,
    },

    /// A SUCCESSFUL result arrived without outputs for a non-entry stage.
    #[error("missing outputs in successful result for job {job_id}, stage {stage}")]
    MissingOutputs {
        /// The job that was failed.
        job_id: String,
        /// The stage that reported success.
        stage: String,
    },

    /// A job status transition is not allowed by the state machine.
    #[error("invalid job status transition: {from} -> {to}")]
    InvalidTransition {
        /// The current status.
        from: String,
        /// The attempted status.
        to: String,
    },

    /// The stage layout of a process definition is malformed.
    #[error("invalid process definition, one or more errors: {}", problems.join("; "))]
    StageLayout {
        /// Every defect detected in the layout.
        problems: Vec<String>,
    },

    /// Runtime configuration is malformed.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// A compare-and-swap write kept losing to concurrent writers.
    #[error("job {job_id} was modified concurrently ({attempts} attempts)")]
    VersionConflict {
        /// The contended job.
        job_id: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Publishing to the outbound trigger channel failed.
    #[error("publish error: {message}")]
    Publish {
        /// Description of the publish failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a validation error for a notification field.
    #[must_use]
    pub fn invalid_notification(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            subject: "notification",
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error for a job inputs field.
    #[must_use]
    pub fn invalid_inputs(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            subject: "job inputs",
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new publish error with a source.
    #[must_use]
    pub fn publish_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Publish {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::UnknownSubProcess { .. }
            | Self::StageFlagMismatch { .. } => ErrorKind::Validation,
            Self::JobNotFound { .. } | Self::ProcessNotFound { .. } => ErrorKind::NotFound,
            Self::MissingOutputs { .. } | Self::InvalidTransition { .. } => {
                ErrorKind::InvariantViolation
            }
            Self::StageLayout { .. } | Self::Config { .. } => ErrorKind::Configuration,
            Self::VersionConflict { .. } => ErrorKind::Conflict,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Publish { .. } => ErrorKind::Publish,
        }
    }

    /// Whether redelivering the same message could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::Storage | ErrorKind::Publish
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::storage_with_source("failed to (de)serialize document", err)
    }
}
