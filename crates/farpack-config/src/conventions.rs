//! Directory and file naming conventions
//!
//! The pipeline infers project semantics purely from names on disk. Every literal
//! it relies on lives in [`Conventions`] so that alternate layouts can be supplied
//! through `[conventions]` in the global config without touching the algorithms.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;

/// Default resource suffixes (matched as `.<suffix>` at the end of a file name)
pub const DEFAULT_RESOURCE_SUFFIXES: [&str; 6] = ["properties", "xml", "json", "yaml", "yml", "sh"];

/// Naming conventions table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Conventions {
    /// VCS metadata directory marking a project root
    pub vcs_dir: String,

    /// File that must exist inside `vcs_dir` for it to count
    pub vcs_config_file: String,

    /// Directory whose immediate subdirectories are buildable units
    pub build_units_dir: String,

    /// Directory of bundled resources copied verbatim
    pub resources_dir: String,

    /// Name prefix of hidden entries
    pub hidden_prefix: String,

    /// Suffix appended to the process name for the UI descriptor
    pub ui_descriptor_suffix: String,

    /// File name of the deployment manifest inside the archive
    pub manifest_file: String,

    /// Extension of the produced archive
    pub archive_extension: String,

    /// Resource file suffix allow-list
    pub resource_suffixes: Vec<String>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            vcs_dir: ".git".to_string(),
            vcs_config_file: "config".to_string(),
            build_units_dir: "cmd".to_string(),
            resources_dir: "resources".to_string(),
            hidden_prefix: ".".to_string(),
            ui_descriptor_suffix: ".ui.xml".to_string(),
            manifest_file: "deployment.json".to_string(),
            archive_extension: "far".to_string(),
            resource_suffixes: DEFAULT_RESOURCE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Conventions {
    /// Whether a directory entry name denotes a hidden entry
    pub fn is_hidden(&self, name: &OsStr) -> bool {
        name.as_encoded_bytes()
            .starts_with(self.hidden_prefix.as_bytes())
    }

    /// Whether a file name is on the resource allow-list
    pub fn is_resource(&self, name: &str) -> bool {
        self.resource_suffixes.iter().any(|suffix| {
            name.len() > suffix.len() + 1
                && name.ends_with(suffix.as_str())
                && name[..name.len() - suffix.len()].ends_with('.')
        })
    }

    /// UI descriptor file name for a process (`<process>.ui.xml`)
    pub fn ui_descriptor_name(&self, process_name: &str) -> String {
        format!("{}{}", process_name, self.ui_descriptor_suffix)
    }

    /// Archive file name for a process (`<process>.far`)
    pub fn archive_file_name(&self, process_name: &str) -> String {
        format!("{}.{}", process_name, self.archive_extension)
    }

    /// Validate the conventions table
    pub fn validate(&self) -> ConfigResult<()> {
        let names = [
            ("conventions.vcs_dir", &self.vcs_dir),
            ("conventions.vcs_config_file", &self.vcs_config_file),
            ("conventions.build_units_dir", &self.build_units_dir),
            ("conventions.resources_dir", &self.resources_dir),
            ("conventions.manifest_file", &self.manifest_file),
            ("conventions.archive_extension", &self.archive_extension),
        ];

        for (field, value) in names {
            validate_entry_name(field, value)?;
        }

        if self.hidden_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "conventions.hidden_prefix".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.resource_suffixes.iter().any(|s| s.is_empty() || s.starts_with('.')) {
            return Err(ConfigError::InvalidValue {
                field: "conventions.resource_suffixes".to_string(),
                reason: "suffixes are written without the leading dot and must not be empty"
                    .to_string(),
            });
        }

        Ok(())
    }
}

/// A single path segment: non-empty, no separators
fn validate_entry_name(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty() || value.contains('/') || value.contains('\\') {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a single path segment", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("app.properties", true)]
    #[case("log.xml", true)]
    #[case("config.yaml", true)]
    #[case("config.yml", true)]
    #[case("start.sh", true)]
    #[case("data.json", true)]
    #[case("readme.md", false)]
    #[case("binary", false)]
    #[case("fooxml", false)]
    #[case(".json", false)]
    fn test_is_resource(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(Conventions::default().is_resource(name), expected);
    }

    #[test]
    fn test_is_hidden() {
        let conventions = Conventions::default();
        assert!(conventions.is_hidden(OsStr::new(".git")));
        assert!(conventions.is_hidden(OsStr::new(".hidden.json")));
        assert!(!conventions.is_hidden(OsStr::new("cmd")));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_hidden_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let conventions = Conventions::default();
        assert!(conventions.is_hidden(OsStr::from_bytes(b".cache-\xff")));
        assert!(!conventions.is_hidden(OsStr::from_bytes(b"build-\xff")));
    }

    #[test]
    fn test_derived_names() {
        let conventions = Conventions::default();
        assert_eq!(conventions.ui_descriptor_name("hello"), "hello.ui.xml");
        assert_eq!(conventions.archive_file_name("hello"), "hello.far");
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let conventions: Conventions = toml::from_str(r#"build_units_dir = "apps""#).unwrap();
        assert_eq!(conventions.build_units_dir, "apps");
        assert_eq!(conventions.resources_dir, "resources");
        assert_eq!(conventions.resource_suffixes.len(), 6);
    }

    #[test]
    fn test_validate_rejects_path_separators() {
        let conventions = Conventions {
            build_units_dir: "src/cmd".to_string(),
            ..Default::default()
        };
        assert!(conventions.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dotted_suffix() {
        let conventions = Conventions {
            resource_suffixes: vec![".json".to_string()],
            ..Default::default()
        };
        assert!(conventions.validate().is_err());
        assert!(Conventions::default().validate().is_ok());
    }
}
