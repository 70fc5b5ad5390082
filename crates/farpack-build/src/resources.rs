//! Resource discovery and staging
//!
//! Two distinct paths:
//! - **scan**: walk the project tree and keep non-hidden files whose name ends
//!   with an allow-listed suffix. Staged flat, by base name.
//! - **resource root**: copy every non-hidden top-level entry of a designated
//!   directory verbatim, directories included, with no filtering.

use crate::error::{BuildError, BuildResult};
use crate::fs_util::{copy_dir_recursive, copy_file, set_executable};
use farpack_config::Conventions;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Collects deployable resource files from a project tree
#[derive(Debug, Clone)]
pub struct ResourceScanner {
    conventions: Conventions,
}

impl ResourceScanner {
    /// Create a scanner using the given conventions
    pub fn new(conventions: Conventions) -> Self {
        Self { conventions }
    }

    /// Recursively collect resource files under `root`.
    ///
    /// Returns a fresh, sorted, duplicate-free list on every call. Any directory
    /// that cannot be read fails the scan.
    pub fn scan(&self, root: &Path) -> BuildResult<Vec<PathBuf>> {
        let mut resources = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.conventions.is_hidden(e.file_name()));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                BuildError::resource_scan(path, e)
            })?;

            // Links are not followed while walking; a link to a file is still a resource
            let is_dir_link = entry.path_is_symlink() && entry.path().is_dir();
            if entry.file_type().is_dir() || is_dir_link {
                continue;
            }

            let matches = entry
                .file_name()
                .to_str()
                .map(|name| self.conventions.is_resource(name))
                .unwrap_or(false);

            if matches {
                resources.push(entry.into_path());
            }
        }

        resources.sort();
        resources.dedup();
        debug!(root = %root.display(), count = resources.len(), "resource scan complete");
        Ok(resources)
    }

    /// Copy scanned resources into `staging_dir`, flattened to base names.
    ///
    /// A later file with the same base name replaces an earlier one. Shell scripts
    /// are made executable. Returns the staged paths.
    pub fn stage(&self, resources: &[PathBuf], staging_dir: &Path) -> BuildResult<Vec<PathBuf>> {
        let mut staged: BTreeMap<PathBuf, &Path> = BTreeMap::new();

        for source in resources {
            let name = source
                .file_name()
                .ok_or_else(|| BuildError::resource_scan(source, invalid_name()))?;
            let target = staging_dir.join(name);

            if let Some(previous) = staged.get(&target) {
                warn!(
                    kept = %source.display(),
                    replaced = %previous.display(),
                    "resource base name collision"
                );
            }

            copy_file(source, &target)?;
            if is_shell_script(&target) {
                set_executable(&target)?;
            }
            staged.insert(target, source);
        }

        info!(count = staged.len(), "resource files copied");
        Ok(staged.into_keys().collect())
    }

    /// Copy every non-hidden top-level entry of `resource_root` into `staging_dir`
    pub fn copy_resource_root(
        &self,
        resource_root: &Path,
        staging_dir: &Path,
    ) -> BuildResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(resource_root).map_err(|e| BuildError::resource_scan(resource_root, e))?;

        let mut staged = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::resource_scan(resource_root, e))?;
            if self.conventions.is_hidden(&entry.file_name()) {
                continue;
            }

            let source = entry.path();
            let target = staging_dir.join(entry.file_name());

            if source.is_dir() {
                copy_dir_recursive(&source, &target)?;
            } else {
                copy_file(&source, &target)?;
            }
            staged.push(target);
        }

        staged.sort();
        info!(
            dir = %resource_root.display(),
            count = staged.len(),
            "resource directory copied"
        );
        Ok(staged)
    }
}

fn is_shell_script(path: &Path) -> bool {
    path.extension().map(|ext| ext == "sh").unwrap_or(false)
}

fn invalid_name() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
}
