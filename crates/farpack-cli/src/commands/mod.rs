pub mod inspect;
pub mod package;

use anyhow::{Context, Result};
use farpack_build::TargetPlatform;
use farpack_config::{ConfigLoader, FarpackConfig};
use farpack_package::ProjectContext;
use std::path::PathBuf;
use tracing::debug;

/// Arguments shared by every command that resolves a project
#[derive(Debug, Default, Clone)]
pub struct ProjectArgs {
    /// Process name
    pub process: String,
    /// Target platform as `<os>_<arch>`
    pub os_arch: Option<String>,
    /// Foreign linker for cross builds
    pub linker: Option<String>,
    /// Alternate config file
    pub config_file: Option<PathBuf>,
    /// Install root override
    pub install_root: Option<PathBuf>,
}

/// Load configuration, applying CLI overrides on top
pub fn load_config(args: &ProjectArgs) -> Result<FarpackConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config_file {
        loader = loader.with_config_file(path);
    }
    let mut config = loader.load().context("Failed to load configuration")?;

    if let Some(root) = &args.install_root {
        config = config.with_install_root(root);
    }
    debug!(install_root = ?config.install_root, "configuration loaded");
    Ok(config)
}

/// Parse the optional `<os>_<arch>` argument; blank means host
pub fn parse_target(os_arch: Option<&str>) -> Result<Option<TargetPlatform>> {
    match os_arch.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(Some(TargetPlatform::from_str(value)?)),
        None => Ok(None),
    }
}

/// Resolve the project context from the current directory
pub fn resolve_context(args: &ProjectArgs, config: &FarpackConfig) -> Result<ProjectContext> {
    let target = parse_target(args.os_arch.as_deref())?;

    let start_dir = std::env::current_dir().context("Failed to read current directory")?;
    debug!(start = %start_dir.display(), "resolving project");

    let context = ProjectContext::discover(&args.process, &start_dir, config)
        .with_context(|| format!("Failed to resolve project for '{}'", args.process))?;

    Ok(context
        .with_target(target)
        .with_foreign_linker(args.linker.clone()))
}
