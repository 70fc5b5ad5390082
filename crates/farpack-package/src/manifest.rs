//! Deployment manifest (deployment.json)
//!
//! Provenance written into every archive: what the process is, which extra binaries
//! ship with it, and who built it from which branch and commit.

use crate::context::ProjectContext;
use crate::{PackageError, PackageResult};
use chrono::{DateTime, Local};
use farpack_build::{
    execute_shell, AssembledBinary, BinaryOrigin, GitMetadataReader, VcsInfoReader,
};
use farpack_config::Conventions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Build time format: local wall clock plus a numeric UTC offset (`+09:00`).
///
/// chrono cannot name zones, so this stands in for an abbreviation such as `KST`.
pub const BUILD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Recorded when the build user cannot be determined
pub const UNKNOWN_USER: &str = "unknown";

/// How the deployed process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessKind {
    #[default]
    #[serde(rename = "GENERAL")]
    General,
    #[serde(rename = "USER_INTERACTIVE")]
    UserInteractive,
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "GENERAL"),
            Self::UserInteractive => write!(f, "USER_INTERACTIVE"),
        }
    }
}

/// VCS provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
}

/// Build provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub time: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
}

/// Contents of `deployment.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    pub process: String,
    pub process_type: ProcessKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_bin: Vec<String>,
    pub build: BuildInfo,
}

impl DeploymentManifest {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> PackageResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PackageError::manifest("<memory>", e))
    }

    /// Parse a manifest
    pub fn from_json(content: &str) -> PackageResult<Self> {
        serde_json::from_str(content).map_err(|e| PackageError::manifest("<memory>", e))
    }

    /// Write the manifest as `file_name` inside `dir`
    pub fn write_to(&self, dir: &Path, file_name: &str) -> PackageResult<PathBuf> {
        let path = dir.join(file_name);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PackageError::manifest(&path, e))?;
        fs::write(&path, json).map_err(|e| PackageError::manifest(&path, e))?;
        debug!(path = %path.display(), "manifest written");
        Ok(path)
    }
}

/// Who is running the build
pub trait IdentitySource {
    /// Current user name, `None` when it cannot be determined
    fn identity(&self) -> Option<String>;
}

/// Asks the operating system via `whoami`
#[derive(Debug, Clone, Copy, Default)]
pub struct WhoAmI;

impl IdentitySource for WhoAmI {
    fn identity(&self) -> Option<String> {
        match execute_shell(Path::new("."), "whoami") {
            Ok(output) if output.success() => {
                let name = output.stdout.trim();
                (!name.is_empty()).then(|| name.to_string())
            }
            Ok(output) => {
                warn!(exit_code = output.exit_code, "whoami failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "cannot run whoami");
                None
            }
        }
    }
}

/// Process kind from the staged resources: a `<process>.ui.xml` descriptor makes it
/// user-interactive
pub fn infer_process_kind(
    staged_resources: &[PathBuf],
    process_name: &str,
    conventions: &Conventions,
) -> ProcessKind {
    let descriptor = conventions.ui_descriptor_name(process_name);
    let found = staged_resources
        .iter()
        .filter_map(|p| p.file_name())
        .any(|name| name == descriptor.as_str());

    if found {
        ProcessKind::UserInteractive
    } else {
        ProcessKind::General
    }
}

/// Composes the deployment manifest from the context and VCS state
pub struct ManifestBuilder {
    vcs: Box<dyn VcsInfoReader>,
    identity: Box<dyn IdentitySource>,
}

impl ManifestBuilder {
    /// Builder reading git metadata from `vcs_dir` and the user from `whoami`
    pub fn new(vcs_dir: &str) -> Self {
        Self {
            vcs: Box::new(GitMetadataReader::new(vcs_dir)),
            identity: Box::new(WhoAmI),
        }
    }

    /// Replace the VCS reader
    pub fn with_vcs_reader(mut self, reader: Box<dyn VcsInfoReader>) -> Self {
        self.vcs = reader;
        self
    }

    /// Replace the identity source
    pub fn with_identity(mut self, identity: Box<dyn IdentitySource>) -> Self {
        self.identity = identity;
        self
    }

    /// Manifest stamped with the current local time
    pub fn build(
        &self,
        context: &ProjectContext,
        binaries: &[AssembledBinary],
    ) -> DeploymentManifest {
        self.build_at(context, binaries, Local::now())
    }

    /// Manifest stamped with `built_at`
    pub fn build_at(
        &self,
        context: &ProjectContext,
        binaries: &[AssembledBinary],
        built_at: DateTime<Local>,
    ) -> DeploymentManifest {
        let git = match self.vcs.read(context.project_root()) {
            Ok(info) => Some(GitInfo {
                branch: info.branch,
                commit: info.commit,
            }),
            Err(e) => {
                warn!(error = %e, "VCS information unavailable, omitting git section");
                None
            }
        };

        let user = self
            .identity
            .identity()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());

        DeploymentManifest {
            process: context.process_name().to_string(),
            process_type: context.process_kind(),
            extra_bin: binaries
                .iter()
                .filter(|b| b.origin == BinaryOrigin::Extra)
                .map(|b| b.name.clone())
                .collect(),
            build: BuildInfo {
                time: built_at.format(BUILD_TIME_FORMAT).to_string(),
                user,
                git,
            },
        }
    }
}

impl fmt::Debug for ManifestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use farpack_build::{ProjectLayout, VcsError, VcsInfo};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    struct FixedVcs(Option<VcsInfo>);

    impl VcsInfoReader for FixedVcs {
        fn read(&self, repo_root: &Path) -> Result<VcsInfo, VcsError> {
            self.0
                .clone()
                .ok_or_else(|| VcsError::NotARepository(repo_root.to_path_buf()))
        }
    }

    struct FixedUser(Option<&'static str>);

    impl IdentitySource for FixedUser {
        fn identity(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn context() -> ProjectContext {
        ProjectContext::new(
            "billing",
            ProjectLayout {
                root: PathBuf::from("/work/billing"),
                build_units: Vec::new(),
            },
        )
    }

    fn builder(vcs: Option<VcsInfo>, user: Option<&'static str>) -> ManifestBuilder {
        ManifestBuilder::new(".git")
            .with_vcs_reader(Box::new(FixedVcs(vcs)))
            .with_identity(Box::new(FixedUser(user)))
    }

    fn built_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_manifest_with_git() {
        let vcs = VcsInfo {
            branch: "main".to_string(),
            commit: "0123456789ab".to_string(),
        };
        let manifest = builder(Some(vcs), Some("deployer")).build_at(&context(), &[], built_at());

        assert_eq!(manifest.process, "billing");
        assert_eq!(manifest.process_type, ProcessKind::General);
        assert_eq!(manifest.build.user, "deployer");
        assert!(manifest.build.time.starts_with("2024-03-09 14:05:07 "));
        assert_eq!(
            manifest.build.git,
            Some(GitInfo {
                branch: "main".to_string(),
                commit: "0123456789ab".to_string(),
            })
        );
    }

    #[test]
    fn test_git_omitted_without_vcs() {
        let manifest = builder(None, Some("deployer")).build_at(&context(), &[], built_at());
        let json = manifest.to_json().unwrap();

        assert_eq!(manifest.build.git, None);
        assert!(!json.contains("\"git\""));
        assert!(!json.contains("extra_bin"));
    }

    #[test]
    fn test_unknown_user_fallback() {
        let manifest = builder(None, None).build_at(&context(), &[], built_at());
        assert_eq!(manifest.build.user, UNKNOWN_USER);
    }

    #[test]
    fn test_extra_bin_lists_extra_origin_only() {
        let binaries = vec![
            AssembledBinary {
                name: "billing".to_string(),
                path: PathBuf::from("/stage/billing"),
                origin: BinaryOrigin::Precompiled,
            },
            AssembledBinary {
                name: "billing-cli".to_string(),
                path: PathBuf::from("/stage/billing-cli"),
                origin: BinaryOrigin::Extra,
            },
        ];
        let manifest = builder(None, Some("u")).build_at(&context(), &binaries, built_at());
        assert_eq!(manifest.extra_bin, vec!["billing-cli"]);
    }

    #[test]
    fn test_process_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ProcessKind::General).unwrap(),
            "\"GENERAL\""
        );
        assert_eq!(
            serde_json::to_string(&ProcessKind::UserInteractive).unwrap(),
            "\"USER_INTERACTIVE\""
        );
    }

    #[rstest]
    #[case("billing", ProcessKind::UserInteractive)]
    #[case("other", ProcessKind::General)]
    #[case("billing.ui", ProcessKind::General)]
    fn test_infer_process_kind(#[case] process: &str, #[case] expected: ProcessKind) {
        let staged = vec![
            PathBuf::from("/stage/app.properties"),
            PathBuf::from("/stage/billing.ui.xml"),
        ];
        assert_eq!(
            infer_process_kind(&staged, process, &Conventions::default()),
            expected
        );
    }

    #[test]
    fn test_no_resources_is_general() {
        assert_eq!(
            infer_process_kind(&[], "billing", &Conventions::default()),
            ProcessKind::General
        );
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let manifest = builder(None, Some("deployer")).build_at(&context(), &[], built_at());

        let path = manifest.write_to(dir.path(), "deployment.json").unwrap();
        let content = fs::read_to_string(&path).unwrap();

        assert_eq!(path, dir.path().join("deployment.json"));
        assert_eq!(DeploymentManifest::from_json(&content).unwrap(), manifest);
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let manifest = builder(None, Some("u")).build_at(&context(), &[], built_at());

        let result = manifest.write_to(&dir.path().join("absent"), "deployment.json");
        assert!(matches!(result, Err(PackageError::ManifestFailed { .. })));
    }
}
