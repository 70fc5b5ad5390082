//! farpack packaging
//!
//! Turns a resolved project into a deployable `.far` archive:
//! - Project context discovery (root, build units, resources, target)
//! - A private staging directory removed on every exit path
//! - The `deployment.json` provenance manifest
//! - Atomic archive writing: the target is either complete or untouched
//!
//! [`Packager`] drives the whole pipeline.

pub mod archive;
pub mod context;
pub mod manifest;
pub mod packager;
pub mod staging;

pub use archive::ArchiveWriter;
pub use context::ProjectContext;
pub use manifest::{
    infer_process_kind, BuildInfo, DeploymentManifest, GitInfo, IdentitySource, ManifestBuilder,
    ProcessKind, WhoAmI,
};
pub use packager::{PackageOutcome, Packager};
pub use staging::StagingArea;

use farpack_build::BuildError;
use farpack_config::ConfigError;
use std::path::PathBuf;

/// Packaging errors
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write archive {path}: {reason}")]
    ArchiveFailed { path: PathBuf, reason: String },

    #[error("Failed to prepare staging directory: {0}")]
    StagingFailed(std::io::Error),

    #[error("Failed to write manifest {path}: {reason}")]
    ManifestFailed { path: PathBuf, reason: String },
}

impl PackageError {
    /// Archive failure for the target path
    pub fn archive(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArchiveFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Manifest failure for the manifest path
    pub fn manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ManifestFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type PackageResult<T> = std::result::Result<T, PackageError>;
