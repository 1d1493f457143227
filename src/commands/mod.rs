//! CLI command implementations

pub mod consume;
pub mod deploy;
pub mod inspect;
pub mod republish;
pub mod submit;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::orchestrator::JobOrchestrator;
use crate::publish::OutboxPublisher;
use crate::store::{FileStore, JobRepository};

/// Everything a command needs: configuration and an orchestrator wired to
/// the file-backed store and outbox.
pub struct Runtime {
    pub config: Config,
    pub orchestrator: JobOrchestrator,
}

impl Runtime {
    /// Open the store `config` points at.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = FileStore::open(&config.store.root).with_context(|| {
            format!("Failed to open store at {}", config.store.root.display())
        })?;
        let publisher = OutboxPublisher::new(config.outbox_path());
        let orchestrator = JobOrchestrator::new(
            config.orchestrator_config(),
            JobRepository::new(Arc::new(store)),
            Arc::new(publisher),
        );
        Ok(Self {
            config,
            orchestrator,
        })
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.config.inbox_dir()
    }
}

/// Read a JSON document from a file, or stdin when `path` is `None` or `-`.
pub(crate) fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}
