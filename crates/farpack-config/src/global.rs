//! Global Configuration (~/.farpack/config.toml)
//!
//! Handles user-level configuration stored in `~/.farpack/config.toml`.
//! Every section is optional; missing keys keep their built-in defaults.

use crate::conventions::Conventions;
use crate::toolchain::ToolchainConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.farpack/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Naming conventions
    pub conventions: Conventions,

    /// Toolchain invocation
    pub toolchain: ToolchainConfig,

    /// Filesystem locations
    pub paths: PathsConfig,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Install root (overridden by FARPACK_HOME, falls back to GOPATH)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_root: Option<PathBuf>,

    /// Parent directory for staging directories (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_root: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.conventions.validate()?;
        self.toolchain.validate()?;

        if let Some(root) = &self.paths.install_root {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "paths.install_root".to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the global config file path (~/.farpack/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".farpack").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_global_config() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_parse_full_global_config() {
        let toml = r#"
[conventions]
build_units_dir = "apps"
resources_dir = "assets"
resource_suffixes = ["json", "toml"]

[toolchain]
program = "tinygo"
build_args = ["build", "-trimpath"]

[paths]
install_root = "/opt/far"
staging_root = "/var/tmp"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.conventions.build_units_dir, "apps");
        assert_eq!(config.conventions.vcs_dir, ".git");
        assert_eq!(config.toolchain.program, "tinygo");
        assert_eq!(config.toolchain.os_var, "GOOS");
        assert_eq!(config.paths.install_root, Some(PathBuf::from("/opt/far")));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<GlobalConfig, _> = toml::from_str("[lsp]\nhover = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_install_root_rejected() {
        let config = GlobalConfig {
            paths: PathsConfig {
                install_root: Some(PathBuf::new()),
                staging_root: None,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
