//! Project root and build unit resolution
//!
//! There is no project manifest to read. The root is inferred from the tree:
//!
//! 1. Walk up from the start directory until a directory holds a VCS metadata
//!    directory with a config file in it. The walk gives up at the filesystem root
//!    or at the source root boundary.
//! 2. Otherwise search down from the source root for a directory named after the
//!    process. `<root>/cmd/<process>` promotes the match to `<root>`.
//!
//! Build units are the immediate subdirectories of the first `cmd` directory found
//! below the root. Descending searches skip hidden entries and visit children in
//! lexicographic order, checking all names at one level before descending, so the
//! first match is reproducible. Several matches are not reported as ambiguous.

use crate::error::{BuildError, BuildResult};
use crate::targets::BuildUnit;
use farpack_config::Conventions;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolved project topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project root directory
    pub root: PathBuf,
    /// Build units, sorted by name; empty means precompiled mode
    pub build_units: Vec<BuildUnit>,
}

/// Resolves project roots and build units from naming conventions
#[derive(Debug, Clone)]
pub struct PathResolver {
    conventions: Conventions,
    source_root: Option<PathBuf>,
}

impl PathResolver {
    /// Create a resolver without a source root (ascending search only)
    pub fn new(conventions: Conventions) -> Self {
        Self {
            conventions,
            source_root: None,
        }
    }

    /// Set the source root used as the upward boundary and the fallback search base
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(source_root.into());
        self
    }

    /// Resolve the project root and its build units
    pub fn resolve(&self, start_dir: &Path, process_name: &str) -> BuildResult<ProjectLayout> {
        let start = absolute(start_dir)?;
        let root = self.resolve_root(&start, process_name)?;
        let build_units = self.discover_build_units(&root)?;

        debug!(
            root = %root.display(),
            units = build_units.len(),
            "resolved project layout"
        );

        Ok(ProjectLayout { root, build_units })
    }

    /// Resolve only the project root
    pub fn resolve_root(&self, start_dir: &Path, process_name: &str) -> BuildResult<PathBuf> {
        if let Some(root) = self.find_vcs_root(start_dir) {
            debug!(root = %root.display(), "project root found by VCS metadata");
            return Ok(root);
        }

        let not_found = || BuildError::ProjectNotFound {
            process: process_name.to_string(),
            start: start_dir.to_path_buf(),
            search_root: self
                .source_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
        };

        let source_root = self.source_root.as_deref().ok_or_else(not_found)?;
        let found = find_named_dir(source_root, process_name, &self.conventions)?
            .ok_or_else(not_found)?;

        let parent_is_units_dir = found
            .parent()
            .and_then(Path::file_name)
            .map(|name| name == self.conventions.build_units_dir.as_str())
            .unwrap_or(false);

        // <root>/cmd/<process> -> <root>
        let promoted = if parent_is_units_dir {
            found.parent().and_then(Path::parent).map(Path::to_path_buf)
        } else {
            None
        };
        let root = promoted.unwrap_or(found);

        debug!(root = %root.display(), "project root found by name search");
        Ok(root)
    }

    /// Walk upwards looking for a directory with valid VCS metadata
    pub fn find_vcs_root(&self, start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();

        loop {
            if self.source_root.as_deref() == Some(current.as_path()) {
                debug!(boundary = %current.display(), "VCS search stopped at source root");
                return None;
            }

            if self.has_vcs_metadata(&current) {
                return Some(current);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return None,
            }
        }
    }

    /// A VCS directory only counts when it contains its config file
    fn has_vcs_metadata(&self, dir: &Path) -> bool {
        let vcs_dir = dir.join(&self.conventions.vcs_dir);
        vcs_dir.is_dir() && vcs_dir.join(&self.conventions.vcs_config_file).is_file()
    }

    /// Enumerate build units under the first build-units directory below `root`
    pub fn discover_build_units(&self, root: &Path) -> BuildResult<Vec<BuildUnit>> {
        let units_dir =
            match find_named_dir(root, &self.conventions.build_units_dir, &self.conventions)? {
                Some(dir) => dir,
                None => {
                    debug!(root = %root.display(), "no build units directory, precompiled mode");
                    return Ok(Vec::new());
                }
            };

        let entries = match sorted_subdirectories(&units_dir, &self.conventions) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %units_dir.display(), error = %e, "cannot read build units directory");
                return Ok(Vec::new());
            }
        };

        Ok(entries.into_iter().map(BuildUnit::new).collect())
    }
}

fn absolute(path: &Path) -> BuildResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| BuildError::io(path, e))?;
    Ok(cwd.join(path))
}

/// Non-hidden subdirectories of `dir` in lexicographic order
fn sorted_subdirectories(dir: &Path, conventions: &Conventions) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if conventions.is_hidden(&entry.file_name()) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Depth-first search for a directory named `target` strictly below `base`.
///
/// All children of a directory are compared before any of them is descended into.
/// An unreadable base is an error; unreadable subdirectories are skipped.
pub fn find_named_dir(
    base: &Path,
    target: &str,
    conventions: &Conventions,
) -> BuildResult<Option<PathBuf>> {
    if !base.is_dir() {
        return Ok(None);
    }
    let children = sorted_subdirectories(base, conventions).map_err(|e| BuildError::io(base, e))?;
    Ok(search_children(&children, target, conventions))
}

fn search_children(children: &[PathBuf], target: &str, conventions: &Conventions) -> Option<PathBuf> {
    if let Some(found) = children
        .iter()
        .find(|child| child.file_name().map(|n| n == target).unwrap_or(false))
    {
        return Some(found.clone());
    }

    for child in children {
        let grandchildren = match sorted_subdirectories(child, conventions) {
            Ok(dirs) => dirs,
            Err(e) => {
                debug!(dir = %child.display(), error = %e, "skipping unreadable directory");
                continue;
            }
        };
        if let Some(found) = search_children(&grandchildren, target, conventions) {
            return Some(found);
        }
    }

    None
}
