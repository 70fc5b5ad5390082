//! Far archive writer
//!
//! A far archive is a zip of the staging directory: entries relative to it, sorted,
//! directories as `name/` entries, unix permission bits kept. The archive is written
//! to a temp file beside the target and renamed over it only when complete.

use crate::{PackageError, PackageResult};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One file or directory headed for the archive
#[derive(Debug)]
struct ArchiveEntry {
    source: PathBuf,
    name: String,
    is_dir: bool,
    mode: u32,
}

/// Writes a staging directory as a zip archive
#[derive(Debug, Clone, Copy)]
pub struct ArchiveWriter {
    compression_level: Option<i32>,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    /// Writer using deflate at the default level
    pub fn new() -> Self {
        Self {
            compression_level: None,
        }
    }

    /// Deflate level 0-9; 0 stores entries uncompressed
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level.clamp(0, 9));
        self
    }

    /// Archive everything below `source_dir` into `target`.
    ///
    /// Creates the target's parent directory. On failure an existing `target` is
    /// left as it was.
    pub fn write(&self, source_dir: &Path, target: &Path) -> PackageResult<PathBuf> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| PackageError::archive(target, e))?;

        let entries = collect_entries(source_dir).map_err(|e| PackageError::archive(target, e))?;

        let mut partial = tempfile::Builder::new()
            .prefix(".farpack-")
            .suffix(".part")
            .tempfile_in(&parent)
            .map_err(|e| PackageError::archive(target, e))?;

        self.write_entries(partial.as_file_mut(), &entries)
            .map_err(|e| PackageError::archive(target, e))?;
        partial
            .as_file()
            .sync_all()
            .map_err(|e| PackageError::archive(target, e))?;

        partial
            .persist(target)
            .map_err(|e| PackageError::archive(target, e.error))?;

        info!(
            archive = %target.display(),
            entries = entries.len(),
            "archive written"
        );
        Ok(target.to_path_buf())
    }

    fn options(&self, mode: u32) -> FileOptions {
        let method = match self.compression_level {
            Some(0) => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        FileOptions::default()
            .compression_method(method)
            .compression_level(self.compression_level.filter(|l| *l > 0))
            .last_modified_time(DateTime::default())
            .unix_permissions(mode)
    }

    fn write_entries(
        &self,
        file: &mut File,
        entries: &[ArchiveEntry],
    ) -> zip::result::ZipResult<()> {
        let mut zip = ZipWriter::new(file);

        for entry in entries {
            let options = self.options(entry.mode);
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                let data = fs::read(&entry.source)?;
                zip.write_all(&data)?;
            }
            debug!(entry = %entry.name, "archived");
        }

        zip.finish()?;
        Ok(())
    }
}

/// Sorted entries below `source_dir`, named relative to it with `/` separators
fn collect_entries(source_dir: &Path) -> io::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
        .follow_links(true)
    {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(io::Error::other)?;
        let is_dir = entry.file_type().is_dir();

        let mut name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if is_dir {
            name.push('/');
        }

        let metadata = entry.metadata().map_err(io::Error::other)?;
        entries.push(ArchiveEntry {
            source: entry.path().to_path_buf(),
            name,
            is_dir,
            mode: permission_bits(&metadata, is_dir),
        });
    }

    Ok(entries)
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata, _is_dir: bool) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata, is_dir: bool) -> u32 {
    if is_dir {
        0o755
    } else {
        0o644
    }
}
