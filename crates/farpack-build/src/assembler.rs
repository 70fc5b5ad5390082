//! Binary assembly
//!
//! Produces one executable per build unit inside the staging directory:
//! - no build units: copy the precompiled binary for the process from the install root
//! - otherwise: compile each unit with the toolchain, output straight into staging
//!
//! Extra precompiled binaries are copied next to the main ones. Nothing is written
//! outside the staging directory.

use crate::error::{BuildError, BuildResult};
use crate::fs_util::{copy_file, set_executable};
use crate::targets::{AssembledBinary, BinaryOrigin, BuildUnit, TargetPlatform};
use crate::toolchain::{BuildRequest, Toolchain};
use farpack_config::InstallLayout;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// What to assemble
#[derive(Debug, Clone, Copy)]
pub struct AssemblyRequest<'a> {
    /// Process name, used for the precompiled binary
    pub process_name: &'a str,
    /// Build units; empty selects precompiled mode
    pub build_units: &'a [BuildUnit],
    /// Cross-compilation target
    pub target: Option<&'a TargetPlatform>,
    /// Foreign linker for cross builds
    pub foreign_linker: Option<&'a str>,
    /// Additional precompiled binaries to ship
    pub extra_binaries: &'a [String],
}

/// Stages binaries for packaging
#[derive(Debug, Clone)]
pub struct BinaryAssembler {
    toolchain: Toolchain,
    layout: InstallLayout,
}

impl BinaryAssembler {
    /// Create an assembler
    pub fn new(toolchain: Toolchain, layout: InstallLayout) -> Self {
        Self { toolchain, layout }
    }

    /// Stage every binary of the request into `staging_dir`
    pub fn assemble(
        &self,
        request: &AssemblyRequest<'_>,
        staging_dir: &Path,
    ) -> BuildResult<Vec<AssembledBinary>> {
        let mut binaries = if request.build_units.is_empty() {
            vec![self.stage_precompiled(
                request.process_name,
                request.target,
                staging_dir,
                BinaryOrigin::Precompiled,
            )?]
        } else {
            self.compile_units(request, staging_dir)?
        };

        for extra in request.extra_binaries {
            binaries.push(self.stage_precompiled(
                extra,
                request.target,
                staging_dir,
                BinaryOrigin::Extra,
            )?);
        }

        Ok(binaries)
    }

    /// Expected location of a precompiled binary
    pub fn precompiled_path(&self, name: &str, target: Option<&TargetPlatform>) -> PathBuf {
        let key = target.map(TargetPlatform::key);
        self.layout.precompiled_binary(name, key.as_deref())
    }

    fn stage_precompiled(
        &self,
        name: &str,
        target: Option<&TargetPlatform>,
        staging_dir: &Path,
        origin: BinaryOrigin,
    ) -> BuildResult<AssembledBinary> {
        let source = self.precompiled_path(name, target);
        let metadata = fs::metadata(&source)
            .ok()
            .filter(|m| m.is_file())
            .ok_or_else(|| BuildError::binary_not_found(name, &source))?;

        info!(
            binary = %source.display(),
            modified = %describe_mtime(metadata.modified().ok()),
            "using precompiled binary"
        );

        let staged = staging_dir.join(name);
        copy_file(&source, &staged)?;
        set_executable(&staged)?;

        Ok(AssembledBinary {
            name: name.to_string(),
            path: staged,
            origin,
        })
    }

    fn compile_units(
        &self,
        request: &AssemblyRequest<'_>,
        staging_dir: &Path,
    ) -> BuildResult<Vec<AssembledBinary>> {
        let mut binaries = Vec::with_capacity(request.build_units.len());

        for unit in request.build_units {
            let name = unit.binary_name();
            let output = staging_dir.join(&name);
            info!(unit = %name, "compiling");

            self.toolchain.build(&BuildRequest {
                unit,
                output: &output,
                target: request.target,
                foreign_linker: request.foreign_linker,
            })?;

            if !output.is_file() {
                return Err(BuildError::build_failed(
                    &name,
                    format!("toolchain produced no binary at {}", output.display()),
                ));
            }
            set_executable(&output)?;
            debug!(unit = %name, path = %output.display(), "unit staged");

            binaries.push(AssembledBinary {
                name,
                path: output,
                origin: BinaryOrigin::Compiled,
            });
        }

        Ok(binaries)
    }
}

fn describe_mtime(modified: Option<SystemTime>) -> String {
    modified
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| format!("{}s since epoch", d.as_secs()))
        .unwrap_or_else(|| "unknown".to_string())
}
