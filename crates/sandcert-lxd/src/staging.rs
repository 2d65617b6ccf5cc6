//! Temporary staging directories

use sandcert_core::{Result, SandcertError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};

const FLATTEN_NAME: &str = ".sandcert-flatten";

/// Local copy of a remote certificate directory.
///
/// The directory and everything in it is deleted when the value is dropped,
/// whichever way the run ends.
#[derive(Debug)]
pub struct StagedDir {
    dir: TempDir,
}

impl StagedDir {
    /// Create an empty staging directory under the system temp dir.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("sandcert-")
            .tempdir()
            .map_err(|e| SandcertError::io(std::env::temp_dir(), e))?;

        debug!("Created staging directory {}", dir.path().display());

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| SandcertError::io(path, e))
    }
}

/// If `dir` holds exactly one entry and it is a directory, move its children
/// up into `dir` and remove it. Returns whether anything was moved.
pub fn flatten_single_subdir(dir: &Path) -> Result<bool> {
    let entries = fs::read_dir(dir)
        .map_err(|e| SandcertError::io(dir, e))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| SandcertError::io(dir, e))?;

    let [entry] = entries.as_slice() else {
        return Ok(false);
    };

    let file_type = entry.file_type().map_err(|e| SandcertError::io(entry.path(), e))?;
    if !file_type.is_dir() {
        return Ok(false);
    }

    // A child may share the subdirectory's name, so get it out of the way first
    let single = if entry.file_name() == FLATTEN_NAME {
        entry.path()
    } else {
        let moved = dir.join(FLATTEN_NAME);
        fs::rename(entry.path(), &moved).map_err(|e| SandcertError::io(entry.path(), e))?;
        moved
    };

    let mut moved_count = 0;
    for child in fs::read_dir(&single).map_err(|e| SandcertError::io(&single, e))? {
        let child = child.map_err(|e| SandcertError::io(&single, e))?;
        let target = dir.join(child.file_name());
        fs::rename(child.path(), &target).map_err(|e| SandcertError::io(child.path(), e))?;
        moved_count += 1;
    }

    if let Err(e) = fs::remove_dir(&single) {
        warn!("Could not remove {}: {}", single.display(), e);
        return Err(SandcertError::io(single, e));
    }

    debug!("Flattened {} entries into {}", moved_count, dir.display());

    Ok(true)
}
