//! Crash-safe JSON persistence.
//!
//! Values are serialized to a temporary file colocated with the target path
//! and moved into place with a single atomic rename. A concurrent or
//! crash-interrupted reader observes either the previous complete content or
//! the new complete content, never a mix. When the temporary write itself
//! fails the original file is untouched and the error is surfaced; there is
//! no automatic retry.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

/// Errors from an atomic write attempt.
#[derive(Debug)]
pub enum WriteError {
    /// The value could not be serialized to JSON.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Creating, writing, syncing, or renaming the temporary file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Serialize { path, source } => {
                write!(f, "Failed to serialize {}: {}", path.display(), source)
            }
            WriteError::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl StdError for WriteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            WriteError::Serialize { source, .. } => Some(source),
            WriteError::Io { source, .. } => Some(source),
        }
    }
}

/// Serialize `value` to JSON and atomically replace `path` with it.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let contents = serde_json::to_vec_pretty(value).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    // Temp file must live in the target directory; rename is only atomic
    // within one filesystem.
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(io_err)?;

    temp_file.write_all(&contents).map_err(io_err)?;
    temp_file.as_file_mut().sync_all().map_err(io_err)?;
    temp_file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
