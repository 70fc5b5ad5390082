//! Private staging directory for one packaging run

use crate::{PackageError, PackageResult};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

/// Uniquely named scratch directory, deleted with all contents when dropped
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh staging directory under `parent`, or the system temp dir
    pub fn create(process_name: &str, parent: Option<&Path>) -> PackageResult<Self> {
        let prefix = format!("{}-", process_name);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(PackageError::StagingFailed)?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .map_err(PackageError::StagingFailed)?;

        debug!(path = %dir.path().display(), "staging directory created");
        Ok(Self { dir })
    }

    /// Staging directory path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn close(self) -> PackageResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(PackageError::StagingFailed)?;
        debug!(path = %path.display(), "staging directory removed");
        Ok(())
    }
}
