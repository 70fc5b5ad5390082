//! farpack Configuration System
//!
//! Provides the configuration consumed by the packaging pipeline:
//! - Directory and file naming conventions (`cmd`, `resources`, `.git`, ...)
//! - External toolchain invocation settings
//! - Install root layout (precompiled binaries, source root, archive output)
//! - Global user configuration (~/.farpack/config.toml)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config (~/.farpack/config.toml, or `FARPACK_CONFIG`)
//! 3. Environment variables (`FARPACK_*`, `GOPATH` as install root fallback)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use farpack_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! let layout = config.layout().unwrap();
//! println!("archives go to {}", layout.archive_dir("hello").display());
//! ```

pub mod conventions;
pub mod global;
pub mod layout;
pub mod loader;
pub mod toolchain;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Install root is not set (set FARPACK_HOME or GOPATH)")]
    InstallRootNotSet,

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use conventions::Conventions;
pub use global::{GlobalConfig, PathsConfig};
pub use layout::InstallLayout;
pub use loader::{ConfigLoader, FarpackConfig};
pub use toolchain::ToolchainConfig;
