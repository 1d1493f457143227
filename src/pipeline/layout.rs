//! Stage layout extraction and validation
//!
//! A process definition encodes its pipeline as flat parameters:
//! `stagesCount = ["N"]` and, for each 1-based group i, `stage{i:03}Names`.
//! Every defect found is collected so a broken definition is reported once,
//! in full.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::models::constants::{FINISHED, PRE_PROCESSED};
use crate::models::process::{stage_names_key, ProcessDefinition};

/// Parameter name holding the number of stage-groups.
pub const STAGES_COUNT: &str = "stagesCount";

/// Largest number of sub-processes for which every range is at least 1% wide.
pub const MAX_SUB_PROCESSES: usize = 100;

/// Extract the ordered stage-groups from a process definition.
pub fn extract_stage_groups(definition: &ProcessDefinition) -> Result<Vec<Vec<String>>> {
    let stages_count = definition
        .parameter(STAGES_COUNT)
        .ok_or_else(|| layout_error(format!("missing key-value pair: {STAGES_COUNT}")))?;

    let total_stages = stages_count
        .first()
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|count| *count >= 1)
        .ok_or_else(|| {
            layout_error(format!(
                "{STAGES_COUNT} must be an integer >= 1, got {stages_count:?}"
            ))
        })?;

    // Each group holds at least one sub-process
    if total_stages > MAX_SUB_PROCESSES {
        return Err(layout_error(format!(
            "{STAGES_COUNT} is {total_stages}, at most {MAX_SUB_PROCESSES} are supported"
        )));
    }

    let mut problems = Vec::new();
    let mut groups = Vec::new();

    for index in 1..=total_stages {
        let key = stage_names_key(index);
        match definition.parameter(&key) {
            None => problems.push(format!("missing key-value pair: {key}")),
            Some(names) if names.is_empty() => problems.push(format!("empty list for {key}")),
            Some(names) => groups.push((index, names.to_vec())),
        }
    }

    problems.extend(check_group_names(
        groups.iter().map(|(index, names)| (*index, names.as_slice())),
    ));

    if problems.is_empty() {
        Ok(groups.into_iter().map(|(_, names)| names).collect())
    } else {
        Err(Error::StageLayout { problems })
    }
}

/// Validate sub-process names across all groups, given as
/// `(1-based stage index, names)` pairs.
///
/// Detects duplicate names (across the whole definition), blank names, names
/// that collide with the pipeline sentinels, and layouts too large to give
/// each sub-process a non-empty progress range.
pub fn check_group_names<'a>(
    groups: impl IntoIterator<Item = (usize, &'a [String])>,
) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    let mut total = 0;

    for (index, names) in groups {
        let key = stage_names_key(index);
        total += names.len();
        for name in names {
            if name.trim().is_empty() {
                problems.push(format!("blank sub_process_name in {key}"));
                continue;
            }
            if name == PRE_PROCESSED || name == FINISHED {
                problems.push(format!("reserved sub_process_name: {name} in {key}"));
            }
            if !seen.insert(name.as_str()) {
                problems.push(format!("duplicate sub_process_name: {name} in {key}"));
            }
        }
    }

    if total > MAX_SUB_PROCESSES {
        problems.push(format!(
            "{total} sub-processes defined, at most {MAX_SUB_PROCESSES} are supported"
        ));
    }

    problems
}

fn layout_error(problem: String) -> Error {
    Error::StageLayout {
        problems: vec![problem],
    }
}
