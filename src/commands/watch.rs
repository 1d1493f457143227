//! Watch command - poll the inbox directory and process queued notifications
//!
//! Every `*.json` file in the inbox is claimed by renaming it, processed as a
//! notification batch, and moved to `processed/` or `failed/`. A file fails
//! if its envelope is malformed or any notification in it failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, warn};

use crate::inbound::process_batch;
use crate::orchestrator::JobOrchestrator;

use super::consume::print_report;
use super::Runtime;

const PROCESSED_DIR: &str = "processed";
const FAILED_DIR: &str = "failed";
const CLAIM_SUFFIX: &str = ".claimed";

/// Counts from one pass over the inbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InboxSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Poll the inbox until Ctrl-C, or drain it once with `once`.
pub fn execute(runtime: &Runtime, once: bool) -> Result<()> {
    let inbox = runtime.inbox_dir();

    if once {
        let summary = drain_inbox(&runtime.orchestrator, &inbox)?;
        print_summary(&summary);
        return Ok(());
    }

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!(
        "{} Watching {} (Ctrl+C to stop)",
        "→".cyan().bold(),
        inbox.display()
    );

    let poll_interval = runtime.config.poll_interval();
    while running.load(Ordering::SeqCst) {
        let summary = drain_inbox(&runtime.orchestrator, &inbox)?;
        if summary.processed + summary.failed > 0 {
            print_summary(&summary);
        }
        sleep_while_running(&running, poll_interval);
    }

    println!("{} Stopped watching", "✓".green().bold());
    Ok(())
}

fn sleep_while_running(running: &AtomicBool, total: Duration) {
    let tick = Duration::from_millis(50).min(total);
    let mut waited = Duration::ZERO;
    while waited < total && running.load(Ordering::SeqCst) {
        thread::sleep(tick);
        waited += tick;
    }
}

fn print_summary(summary: &InboxSummary) {
    println!(
        "{} {} file(s) processed, {} failed",
        "─".dimmed(),
        summary.processed,
        summary.failed
    );
}

/// Process every queued file in `inbox` once, oldest name first.
pub fn drain_inbox(orchestrator: &JobOrchestrator, inbox: &Path) -> Result<InboxSummary> {
    let processed_dir = inbox.join(PROCESSED_DIR);
    let failed_dir = inbox.join(FAILED_DIR);
    for dir in [&processed_dir, &failed_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut queued: Vec<PathBuf> = fs::read_dir(inbox)
        .with_context(|| format!("Failed to list inbox {}", inbox.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    queued.sort();

    let mut summary = InboxSummary::default();
    for path in queued {
        let Some(name) = path.file_name().map(|n| n.to_os_string()) else {
            continue;
        };

        // Claim the file; another watcher may have taken it already
        let mut claimed_name = name.clone();
        claimed_name.push(CLAIM_SUFFIX);
        let claimed = inbox.join(&claimed_name);
        if let Err(e) = fs::rename(&path, &claimed) {
            debug!(path = %path.display(), error = %e, "Inbox file already claimed");
            continue;
        }

        let succeeded = match fs::read_to_string(&claimed) {
            Ok(text) => match process_batch(orchestrator, &text) {
                Ok(report) => {
                    print_report(&report);
                    report.failed() == 0
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Rejected inbox file");
                    false
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read inbox file");
                false
            }
        };

        let target_dir = if succeeded {
            summary.processed += 1;
            &processed_dir
        } else {
            summary.failed += 1;
            &failed_dir
        };
        let target = target_dir.join(&name);
        fs::rename(&claimed, &target)
            .with_context(|| format!("Failed to move {} to {}", claimed.display(), target.display()))?;
    }

    Ok(summary)
}
