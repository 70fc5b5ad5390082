//! Build pipeline error types

use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Project '{process}' not found: no VCS root above {start} and no matching directory under {search_root}")]
    ProjectNotFound {
        process: String,
        start: PathBuf,
        search_root: String,
    },

    #[error("Precompiled binary '{name}' not found at {path}")]
    BinaryNotFound { name: String, path: PathBuf },

    #[error("Build failed for unit '{unit}':\n{output}")]
    BuildFailed { unit: String, output: String },

    #[error("Failed to scan resources at {path}: {error}")]
    ResourceScanFailed {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid target platform '{0}': expected <os>_<arch>, e.g. linux_amd64")]
    InvalidTarget(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] farpack_config::ConfigError),
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a resource scan error
    pub fn resource_scan(path: impl Into<PathBuf>, error: impl Into<std::io::Error>) -> Self {
        Self::ResourceScanFailed {
            path: path.into(),
            error: error.into(),
        }
    }

    /// Create a build failure
    pub fn build_failed(unit: impl Into<String>, output: impl ToString) -> Self {
        Self::BuildFailed {
            unit: unit.into(),
            output: output.to_string(),
        }
    }

    /// Create a binary not found error
    pub fn binary_not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::BinaryNotFound {
            name: name.into(),
            path: path.into(),
        }
    }
}
