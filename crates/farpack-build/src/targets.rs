/// Build units, target platforms and assembled binaries
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One buildable binary, rooted at the directory holding its entry point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildUnit {
    source_path: PathBuf,
}

impl BuildUnit {
    /// Create a build unit for a source directory
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }

    /// Directory containing the unit's entry point
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Binary name: the final segment of the source path
    pub fn binary_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Cross-compilation target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetPlatform {
    /// Target operating system
    pub os: String,
    /// Target architecture
    pub arch: String,
}

impl TargetPlatform {
    /// Create a target platform
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Parse `<os>_<arch>`, splitting at the first underscore
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> BuildResult<Self> {
        let (os, arch) = s
            .split_once('_')
            .ok_or_else(|| BuildError::InvalidTarget(s.to_string()))?;
        let (os, arch) = (os.trim(), arch.trim());

        if os.is_empty() || arch.is_empty() {
            return Err(BuildError::InvalidTarget(s.to_string()));
        }

        Ok(Self::new(os, arch))
    }

    /// Directory key used for precompiled cross binaries
    pub fn key(&self) -> String {
        format!("{}_{}", self.os, self.arch)
    }
}

impl std::fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Where a staged binary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOrigin {
    /// Copied from the install root's bin directory
    Precompiled,
    /// Produced by the toolchain from a build unit
    Compiled,
    /// Additional precompiled binary shipped alongside the main one
    Extra,
}

impl std::fmt::Display for BinaryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precompiled => write!(f, "precompiled"),
            Self::Compiled => write!(f, "compiled"),
            Self::Extra => write!(f, "extra"),
        }
    }
}

/// A binary staged for packaging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledBinary {
    /// File name inside the staging directory
    pub name: String,
    /// Staged path
    pub path: PathBuf,
    /// Origin of the binary
    pub origin: BinaryOrigin,
}
