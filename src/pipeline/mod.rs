//! Stage graph: the pipeline topology of a process
//!
//! A process runs as an ordered list of stage-groups; each group is an
//! ordered list of uniquely named sub-processes. The graph answers two
//! questions for the orchestrator: which slice of [1, 100] a sub-process owns,
//! and which sub-process runs after it given the job's enabled groups.

mod layout;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::constants::{FINISHED, PRE_PROCESSED};
use crate::models::process::ProcessDefinition;

pub use layout::{check_group_names, extract_stage_groups, MAX_SUB_PROCESSES, STAGES_COUNT};

/// Where a sub-process sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubProcessPosition {
    /// 1-based stage-group index.
    pub stage_index: usize,
    /// 0-based step within the stage-group.
    pub step: usize,
    /// 1-based position across the whole pipeline.
    pub order: usize,
}

/// Result of asking the graph what runs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    SubProcess(String),
    Finished,
}

impl NextStep {
    pub fn as_str(&self) -> &str {
        match self {
            NextStep::SubProcess(name) => name,
            NextStep::Finished => FINISHED,
        }
    }
}

/// Queryable pipeline topology, built once per process definition.
#[derive(Debug, Clone)]
pub struct StageGraph {
    groups: Vec<Vec<String>>,
    positions: HashMap<String, SubProcessPosition>,
}

impl StageGraph {
    /// Build the graph from a process definition's stage layout.
    ///
    /// Fails with [`Error::StageLayout`] listing every defect found.
    pub fn configure(definition: &ProcessDefinition) -> Result<Self> {
        let groups = extract_stage_groups(definition)?;
        Ok(Self::index(groups))
    }

    /// Build the graph directly from ordered stage-groups.
    #[cfg(test)]
    pub(crate) fn from_groups(groups: Vec<Vec<String>>) -> Result<Self> {
        let mut problems = Vec::new();
        if groups.is_empty() {
            problems.push("at least one stage-group is required".to_string());
        }
        for (idx, names) in groups.iter().enumerate() {
            if names.is_empty() {
                problems.push(format!(
                    "empty list for {}",
                    crate::models::process::stage_names_key(idx + 1)
                ));
            }
        }
        problems.extend(check_group_names(
            groups
                .iter()
                .enumerate()
                .map(|(idx, names)| (idx + 1, names.as_slice())),
        ));

        if problems.is_empty() {
            Ok(Self::index(groups))
        } else {
            Err(Error::StageLayout { problems })
        }
    }

    fn index(groups: Vec<Vec<String>>) -> Self {
        let mut positions = HashMap::new();
        let mut order = 1;
        for (group_idx, names) in groups.iter().enumerate() {
            for (step, name) in names.iter().enumerate() {
                positions.insert(
                    name.clone(),
                    SubProcessPosition {
                        stage_index: group_idx + 1,
                        step,
                        order,
                    },
                );
                order += 1;
            }
        }
        Self { groups, positions }
    }

    /// Number of stage-groups.
    pub fn stage_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of sub-processes across all groups.
    pub fn sub_process_count(&self) -> usize {
        self.positions.len()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn position(&self, name: &str) -> Option<SubProcessPosition> {
        self.positions.get(name).copied()
    }

    /// Progress slice `(start, end)` owned by a sub-process.
    ///
    /// With `width = floor(100 / N)` and `c` the sub-process's global order,
    /// `start = width*c - (width-1)` and `end = width*c`. When 100 is not a
    /// multiple of N the last `end` stays below 100; job completion is
    /// signalled separately.
    pub fn progress_range(&self, name: &str) -> Result<(u32, u32)> {
        let position = self.position(name).ok_or_else(|| Error::UnknownSubProcess {
            name: name.to_string(),
        })?;
        let width = (100 / self.sub_process_count()) as u32;
        let order = position.order as u32;
        let end = width * order;
        Ok((end + 1 - width, end))
    }

    /// The sub-process that runs after `current`.
    ///
    /// From the [`PRE_PROCESSED`] sentinel this is the first sub-process of
    /// the first enabled group. A group that has been entered always runs to
    /// completion; after its last sub-process the next enabled group starts.
    /// Returns [`NextStep::Finished`] when no enabled group remains.
    pub fn next(&self, current: &str, executing_stage_flags: &[bool]) -> Result<NextStep> {
        if executing_stage_flags.len() != self.stage_count() {
            return Err(Error::StageFlagMismatch {
                expected: self.stage_count(),
                actual: executing_stage_flags.len(),
            });
        }

        if current == PRE_PROCESSED {
            return Ok(self.first_enabled_from(0, executing_stage_flags));
        }

        let position = self.position(current).ok_or_else(|| Error::UnknownSubProcess {
            name: current.to_string(),
        })?;
        let group = &self.groups[position.stage_index - 1];

        // Same group: no flag check
        if let Some(next) = group.get(position.step + 1) {
            return Ok(NextStep::SubProcess(next.clone()));
        }

        Ok(self.first_enabled_from(position.stage_index, executing_stage_flags))
    }

    /// First sub-process of the first enabled group at 0-based index >= `from`.
    fn first_enabled_from(&self, from: usize, flags: &[bool]) -> NextStep {
        self.groups
            .iter()
            .zip(flags)
            .skip(from)
            .find(|(_, enabled)| **enabled)
            .and_then(|(names, _)| names.first())
            .map(|name| NextStep::SubProcess(name.clone()))
            .unwrap_or(NextStep::Finished)
    }
}
