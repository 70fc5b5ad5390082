//! Version-control provenance
//!
//! Only the current branch and a short commit id are needed. [`GitMetadataReader`]
//! reads them straight from the metadata files of a git working copy:
//!
//! - `HEAD` is either `ref: refs/heads/<branch>` or a raw commit hash (detached)
//! - the branch tip lives in `refs/heads/<branch>` or, once packed, in `packed-refs`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Length of the abbreviated commit id
pub const SHORT_COMMIT_LEN: usize = 12;

/// Branch name reported for a detached HEAD
pub const DETACHED_BRANCH: &str = "HEAD";

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Branch and abbreviated commit of a working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    pub branch: String,
    pub commit: String,
}

/// Why VCS information could not be read
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("no VCS metadata at {0}")]
    NotARepository(PathBuf),

    #[error("cannot read {path}: {error}")]
    Unreadable {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("malformed HEAD: {0}")]
    MalformedHead(String),

    #[error("branch '{0}' has no commits yet")]
    UnbornBranch(String),
}

/// Source of VCS provenance for a project root
pub trait VcsInfoReader {
    /// Read branch and commit for the working copy rooted at `repo_root`
    fn read(&self, repo_root: &Path) -> Result<VcsInfo, VcsError>;
}

/// Reads git metadata files directly
#[derive(Debug, Clone)]
pub struct GitMetadataReader {
    vcs_dir: String,
}

impl GitMetadataReader {
    /// Reader for the metadata directory name (normally `.git`)
    pub fn new(vcs_dir: impl Into<String>) -> Self {
        Self {
            vcs_dir: vcs_dir.into(),
        }
    }
}

impl Default for GitMetadataReader {
    fn default() -> Self {
        Self::new(".git")
    }
}

impl VcsInfoReader for GitMetadataReader {
    fn read(&self, repo_root: &Path) -> Result<VcsInfo, VcsError> {
        let git_dir = repo_root.join(&self.vcs_dir);
        if !git_dir.is_dir() {
            return Err(VcsError::NotARepository(repo_root.to_path_buf()));
        }

        let head_path = git_dir.join("HEAD");
        let head = read_trimmed(&head_path)?;

        if let Some(reference) = head.strip_prefix("ref:") {
            let reference = reference.trim();
            let branch = reference
                .strip_prefix(BRANCH_REF_PREFIX)
                .ok_or_else(|| VcsError::MalformedHead(head.clone()))?;
            if branch.is_empty() {
                return Err(VcsError::MalformedHead(head.clone()));
            }

            let commit = resolve_ref(&git_dir, reference)?
                .ok_or_else(|| VcsError::UnbornBranch(branch.to_string()))?;

            return Ok(VcsInfo {
                branch: branch.to_string(),
                commit: shorten(&commit),
            });
        }

        if is_commit_hash(&head) {
            return Ok(VcsInfo {
                branch: DETACHED_BRANCH.to_string(),
                commit: shorten(&head),
            });
        }

        Err(VcsError::MalformedHead(head))
    }
}

fn read_trimmed(path: &Path) -> Result<String, VcsError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|error| VcsError::Unreadable {
            path: path.to_path_buf(),
            error,
        })
}

/// Look a ref up as a loose file first, then in packed-refs
fn resolve_ref(git_dir: &Path, reference: &str) -> Result<Option<String>, VcsError> {
    let loose = git_dir.join(reference);
    if loose.is_file() {
        let hash = read_trimmed(&loose)?;
        return Ok(Some(hash).filter(|h| is_commit_hash(h)));
    }

    let packed = git_dir.join("packed-refs");
    if !packed.is_file() {
        return Ok(None);
    }

    let content = read_trimmed(&packed)?;
    let found = content
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
        .filter_map(|line| line.split_once(' '))
        .find(|(_, name)| name.trim() == reference)
        .map(|(hash, _)| hash.to_string())
        .filter(|hash| is_commit_hash(hash));

    Ok(found)
}

fn is_commit_hash(value: &str) -> bool {
    value.len() >= SHORT_COMMIT_LEN && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn shorten(hash: &str) -> String {
    hash.chars().take(SHORT_COMMIT_LEN).collect()
}
