//! Small filesystem helpers shared by the staging steps

use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Mode given to staged binaries and shell scripts
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Copy a file, overwriting the destination
pub fn copy_file(src: &Path, dst: &Path) -> BuildResult<()> {
    fs::copy(src, dst).map_err(|e| BuildError::io(src, e))?;
    Ok(())
}

/// Mark a file executable (no-op on non-unix platforms)
#[cfg(unix)]
pub fn set_executable(path: &Path) -> BuildResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
        .map_err(|e| BuildError::io(path, e))
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> BuildResult<()> {
    Ok(())
}

/// Copy a directory tree, keeping relative paths.
///
/// Symbolic links are followed: a link to a file is copied as a regular file and a
/// link to a directory is copied as a directory. Link cycles fail the copy.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> BuildResult<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            BuildError::io(path, e.into())
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| BuildError::io(entry.path(), std::io::Error::other(e)))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::io(&target, e))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }

    Ok(())
}
