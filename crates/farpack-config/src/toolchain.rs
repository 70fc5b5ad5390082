//! External toolchain invocation settings
//!
//! The compiler is an opaque subprocess. These settings describe how to call it:
//! `<program> <build_args..> <output_flag> <path> [strip_flags..]`, with the target
//! platform and foreign linker passed through environment variables. The defaults
//! describe the Go toolchain.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Toolchain invocation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Toolchain executable
    pub program: String,

    /// Arguments selecting the build action
    pub build_args: Vec<String>,

    /// Flag preceding the output path
    pub output_flag: String,

    /// Environment variable carrying the target OS
    pub os_var: String,

    /// Environment variable carrying the target architecture
    pub arch_var: String,

    /// Environment variable carrying the foreign linker
    pub linker_var: String,

    /// Environment variable enabling foreign-function linkage (set to "1")
    pub ffi_var: String,

    /// Extra arguments stripping debug symbols for foreign-linked builds
    pub strip_flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            build_args: vec!["build".to_string()],
            output_flag: "-o".to_string(),
            os_var: "GOOS".to_string(),
            arch_var: "GOARCH".to_string(),
            linker_var: "CC".to_string(),
            ffi_var: "CGO_ENABLED".to_string(),
            strip_flags: vec!["-ldflags=-s -w".to_string()],
        }
    }
}

impl ToolchainConfig {
    /// Validate toolchain settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "toolchain.program".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.output_flag.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "toolchain.output_flag".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
