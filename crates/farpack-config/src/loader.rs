//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::layout::InstallLayout;
use crate::{ConfigError, ConfigResult, Conventions, ToolchainConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the install root
pub const ENV_HOME: &str = "FARPACK_HOME";
/// Fallback install root variable
pub const ENV_GOPATH: &str = "GOPATH";
/// Environment variable overriding the toolchain program
pub const ENV_TOOLCHAIN: &str = "FARPACK_TOOLCHAIN";
/// Environment variable pointing at an alternate config file
pub const ENV_CONFIG: &str = "FARPACK_CONFIG";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Global config (~/.farpack/config.toml) - overrides defaults
/// 3. Environment variables (FARPACK_*) - overrides config file
/// 4. CLI flags - highest priority (handled by caller)
///
/// `GOPATH` is only consulted when neither `FARPACK_HOME` nor the config file
/// names an install root.
pub struct ConfigLoader {
    /// Explicit config file path
    config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct FarpackConfig {
    /// Naming conventions
    pub conventions: Conventions,

    /// Toolchain invocation
    pub toolchain: ToolchainConfig,

    /// Install root, if any source provided one
    pub install_root: Option<PathBuf>,

    /// Parent directory for staging directories
    pub staging_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Use a specific config file instead of the global one
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Load configuration from the process environment
    pub fn load(&self) -> ConfigResult<FarpackConfig> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Load configuration with a custom environment lookup
    pub fn load_with_env<F>(&self, lookup: F) -> ConfigResult<FarpackConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let global = self.load_global_config(&lookup)?;
        Ok(apply_env_overrides(global, &lookup))
    }

    /// Load the global config file. A missing default file is not an error,
    /// a missing explicitly named file is.
    fn load_global_config<F>(&self, lookup: &F) -> ConfigResult<GlobalConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = self
            .config_path
            .clone()
            .or_else(|| non_empty(lookup(ENV_CONFIG)).map(PathBuf::from));

        if let Some(path) = explicit {
            return GlobalConfig::load_from_file(&path);
        }

        let path = match GlobalConfig::global_config_path() {
            Ok(path) => path,
            Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
            Err(e) => return Err(e),
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Get the global configuration directory (~/.farpack)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".farpack"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply environment variable overrides to the file config
fn apply_env_overrides<F>(global: GlobalConfig, lookup: &F) -> FarpackConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut toolchain = global.toolchain;
    if let Some(program) = non_empty(lookup(ENV_TOOLCHAIN)) {
        toolchain.program = program;
    }

    let install_root = non_empty(lookup(ENV_HOME))
        .map(PathBuf::from)
        .or(global.paths.install_root)
        .or_else(|| non_empty(lookup(ENV_GOPATH)).map(|gopath| first_path_entry(&gopath)));

    FarpackConfig {
        conventions: global.conventions,
        toolchain,
        install_root,
        staging_root: global.paths.staging_root,
    }
}

/// GOPATH may be a list; only the first entry anchors the install root
fn first_path_entry(value: &str) -> PathBuf {
    env::split_paths(value)
        .next()
        .unwrap_or_else(|| PathBuf::from(value))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FarpackConfig {
    /// Install layout, failing when no install root is configured
    pub fn layout(&self) -> ConfigResult<InstallLayout> {
        self.install_root
            .as_deref()
            .map(InstallLayout::new)
            .ok_or(ConfigError::InstallRootNotSet)
    }

    /// Override the install root (CLI flag)
    pub fn with_install_root(mut self, root: impl AsRef<Path>) -> Self {
        self.install_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Override the staging parent directory
    pub fn with_staging_root(mut self, root: impl AsRef<Path>) -> Self {
        self.staging_root = Some(root.as_ref().to_path_buf());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_farpack_home_wins_over_file_and_gopath() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "[paths]\ninstall_root = \"/from/file\"\n");

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .load_with_env(lookup_from(&[
                (ENV_HOME, "/from/env"),
                (ENV_GOPATH, "/from/gopath"),
            ]))
            .unwrap();

        assert_eq!(config.install_root, Some(PathBuf::from("/from/env")));
    }

    #[test]
    fn test_file_wins_over_gopath() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "[paths]\ninstall_root = \"/from/file\"\n");

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .load_with_env(lookup_from(&[(ENV_GOPATH, "/from/gopath")]))
            .unwrap();

        assert_eq!(config.install_root, Some(PathBuf::from("/from/file")));
    }

    #[test]
    fn test_gopath_fallback_uses_first_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "");
        let joined = env::join_paths(["/first/go", "/second/go"]).unwrap();

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .load_with_env(lookup_from(&[(ENV_GOPATH, joined.to_str().unwrap())]))
            .unwrap();

        assert_eq!(config.install_root, Some(PathBuf::from("/first/go")));
    }

    #[test]
    fn test_missing_install_root_fails_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "");

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .load_with_env(lookup_from(&[]))
            .unwrap();

        assert!(matches!(config.layout(), Err(ConfigError::InstallRootNotSet)));
    }

    #[test]
    fn test_toolchain_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "[toolchain]\nprogram = \"go1.22\"\n");

        let config = ConfigLoader::new()
            .with_config_file(&path)
            .load_with_env(lookup_from(&[(ENV_TOOLCHAIN, "/usr/local/go/bin/go")]))
            .unwrap();

        assert_eq!(config.toolchain.program, "/usr/local/go/bin/go");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .with_config_file(temp_dir.path().join("absent.toml"))
            .load_with_env(lookup_from(&[]));

        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_env_points_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "[conventions]\nbuild_units_dir = \"apps\"\n");

        let config = ConfigLoader::new()
            .load_with_env(lookup_from(&[(ENV_CONFIG, path.to_str().unwrap())]))
            .unwrap();

        assert_eq!(config.conventions.build_units_dir, "apps");
    }

    #[test]
    #[serial]
    fn test_load_reads_process_environment() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path(), "");

        env::set_var(ENV_HOME, temp_dir.path());
        let config = ConfigLoader::new().with_config_file(&path).load().unwrap();
        env::remove_var(ENV_HOME);

        assert_eq!(config.install_root.as_deref(), Some(temp_dir.path()));
    }
}
