//! PID file handling.
//!
//! External tooling (the `logctl` companion binary in particular) finds the
//! running bridge through this file to send it SIGUSR1.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::Result;

/// A PID file that is removed again when the guard is dropped.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process PID to `path`.
    ///
    /// A stale file from a previous run is overwritten.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, std::process::id().to_string())?;
        debug!(path = %path.display(), pid = std::process::id(), "PID file written");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "Failed to remove PID file: {e}");
        }
    }
}

/// Read a PID back from a file written by [`PidFile::create`].
pub fn read_pid(path: &Path) -> Result<u32> {
    let data = std::fs::read_to_string(path)?;
    data.trim()
        .parse()
        .map_err(|_| super::error::Error::config(format!("invalid PID file {}", path.display())))
}
