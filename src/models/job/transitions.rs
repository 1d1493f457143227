use crate::error::Result;

use super::methods::invalid_transition;
use super::types::{Job, JobStatus};

impl JobStatus {
    /// Check if transitioning from the current status to the new status is valid.
    ///
    /// Valid transitions:
    /// - `Accepted` -> `Running` | `Successful` | `Failed`
    /// - `Running` -> `Successful` | `Failed`
    /// - `Successful` is a terminal state
    /// - `Failed` is a terminal state
    ///
    /// # Arguments
    /// * `new_status` - The target status to transition to
    ///
    /// # Returns
    /// `true` if the transition is valid, `false` otherwise
    pub fn can_transition_to(&self, new_status: &JobStatus) -> bool {
        // Same status is a no-op, except out of a terminal state
        if self == new_status {
            return !self.is_terminal();
        }

        match self {
            JobStatus::Accepted => matches!(
                new_status,
                JobStatus::Running | JobStatus::Successful | JobStatus::Failed
            ),
            JobStatus::Running => {
                matches!(new_status, JobStatus::Successful | JobStatus::Failed)
            }
            JobStatus::Successful => false,
            JobStatus::Failed => false,
        }
    }

    /// Attempt to transition to a new status, returning an error if invalid.
    pub fn try_transition(&self, new_status: JobStatus) -> Result<JobStatus> {
        if self.can_transition_to(&new_status) {
            Ok(new_status)
        } else {
            Err(invalid_transition(*self, new_status))
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Successful | JobStatus::Failed)
    }
}

impl Job {
    /// Move the job to `new_status`, leaving it untouched on an invalid transition.
    pub fn try_transition(&mut self, new_status: JobStatus) -> Result<()> {
        self.status = self.status.try_transition(new_status)?;
        Ok(())
    }
}
