//! File locking utilities for safe concurrent access
//!
//! Provides locked read/write operations using `fs2` advisory locks so that
//! several orchestrator processes can share one file-backed store.
//!
//! Advisory locks are cooperative - all participants must use these functions
//! for the locking to be effective.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Read file contents with a shared (read) lock.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn locked_read(path: &Path) -> Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error("open", path, e)),
    };
    file.lock_shared()
        .map_err(|e| io_error("acquire shared lock on", path, e))?;
    let mut content = String::new();
    BufReader::new(&file)
        .read_to_string(&mut content)
        .map_err(|e| io_error("read", path, e))?;
    Ok(Some(content))
}

/// Read-modify-write a file under one exclusive lock.
///
/// `update` receives the current content (`None` if the file is new or empty)
/// and returns the content to write, or `None` to leave the file untouched.
/// Whatever `update` returns besides the content is handed back to the caller.
///
/// The sequence is: open → lock → read → decide → truncate → write → flush.
pub fn locked_update<T>(
    path: &Path,
    update: impl FnOnce(Option<&str>) -> Result<(Option<String>, T)>,
) -> Result<T> {
    // Open without truncation - we truncate via set_len(0) only AFTER acquiring
    // the exclusive lock and reading the current content.
    #[allow(clippy::suspicious_open_options)]
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)
        .map_err(|e| io_error("open for writing", path, e))?;
    file.lock_exclusive()
        .map_err(|e| io_error("acquire exclusive lock on", path, e))?;

    let mut current = String::new();
    file.read_to_string(&mut current)
        .map_err(|e| io_error("read", path, e))?;
    let current = (!current.is_empty()).then_some(current.as_str());

    let (replacement, outcome) = update(current)?;

    if let Some(content) = replacement {
        file.set_len(0)
            .map_err(|e| io_error("truncate", path, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| io_error("rewind", path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| io_error("write", path, e))?;
        file.flush().map_err(|e| io_error("flush", path, e))?;
    }

    Ok(outcome)
}

/// Append one line to a file under an exclusive lock, creating it if needed.
pub fn locked_append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| io_error("open for appending", path, e))?;
    file.lock_exclusive()
        .map_err(|e| io_error("acquire exclusive lock on", path, e))?;
    file.write_all(line.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .and_then(|_| file.flush())
        .map_err(|e| io_error("append to", path, e))?;
    Ok(())
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> Error {
    Error::storage_with_source(format!("failed to {action} {}", path.display()), err)
}
