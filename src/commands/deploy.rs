//! Deploy command - validate and store a process definition

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::models::ProcessDefinition;

use super::{read_input, Runtime};

/// Store the process definition in `file` after checking its stage layout.
pub fn execute(runtime: &Runtime, file: &Path) -> Result<()> {
    let text = read_input(Some(file))?;
    let definition: ProcessDefinition = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse process definition {}", file.display()))?;

    let graph = runtime
        .orchestrator
        .deploy_process(&definition)
        .with_context(|| format!("Failed to deploy {} {}", definition.id, definition.version))?;

    println!(
        "{} Deployed {} {}",
        "✓".green().bold(),
        definition.id.bold(),
        definition.version
    );
    for (idx, names) in graph.groups().iter().enumerate() {
        let ranges: Vec<String> = names
            .iter()
            .filter_map(|name| {
                graph
                    .progress_range(name)
                    .ok()
                    .map(|(start, end)| format!("{name} [{start}-{end}]"))
            })
            .collect();
        println!("  {} {}", format!("stage {}", idx + 1).dimmed(), ranges.join(", "));
    }
    Ok(())
}
