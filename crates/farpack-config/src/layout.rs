//! Install root layout
//!
//! Everything outside the project tree is anchored at one install root:
//!
//! ```text
//! <root>/src                      source root (search boundary / fallback search base)
//! <root>/bin/<process>            precompiled host binary
//! <root>/bin/<os>_<arch>/<process> precompiled cross binary
//! <root>/far/<process>/<process>.far produced archive
//! ```

use crate::Conventions;
use std::path::{Path, PathBuf};

/// Paths derived from the install root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    /// Create a layout anchored at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Install root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source root (`<root>/src`)
    pub fn source_root(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Precompiled binary directory (`<root>/bin`)
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Location of a precompiled binary, optionally keyed by `<os>_<arch>`
    pub fn precompiled_binary(&self, name: &str, platform_key: Option<&str>) -> PathBuf {
        match platform_key {
            Some(key) => self.bin_dir().join(key).join(name),
            None => self.bin_dir().join(name),
        }
    }

    /// Archive directory for a process (`<root>/far/<process>`)
    pub fn archive_dir(&self, process_name: &str) -> PathBuf {
        self.root.join("far").join(process_name)
    }

    /// Default archive path for a process
    pub fn archive_path(&self, process_name: &str, conventions: &Conventions) -> PathBuf {
        self.archive_dir(process_name)
            .join(conventions.archive_file_name(process_name))
    }
}
