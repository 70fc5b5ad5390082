//! Packaging pipeline
//!
//! Resources are scanned, binaries assembled and resources staged into a private
//! staging directory, the process kind inferred, the manifest written and finally the
//! staging directory archived. The staging directory is removed whatever the outcome.

use crate::archive::ArchiveWriter;
use crate::context::ProjectContext;
use crate::manifest::{infer_process_kind, DeploymentManifest, IdentitySource, ManifestBuilder};
use crate::staging::StagingArea;
use crate::PackageResult;
use farpack_build::{
    AssembledBinary, AssemblyRequest, BinaryAssembler, ResourceScanner, Toolchain, VcsInfoReader,
};
use farpack_config::{FarpackConfig, InstallLayout};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a successful packaging run
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutcome {
    /// Written archive
    pub archive_path: PathBuf,
    /// Binaries shipped in the archive
    pub binaries: Vec<AssembledBinary>,
    /// Archive-relative names of the staged resources
    pub resources: Vec<String>,
    /// Manifest shipped in the archive
    pub manifest: DeploymentManifest,
}

/// Drives one packaging run from resolved context to archive
#[derive(Debug)]
pub struct Packager {
    config: FarpackConfig,
    manifest_builder: ManifestBuilder,
    archive_writer: ArchiveWriter,
    archive_path: Option<PathBuf>,
}

impl Packager {
    /// Packager with the default git reader and `whoami` identity
    pub fn new(config: FarpackConfig) -> Self {
        let manifest_builder = ManifestBuilder::new(&config.conventions.vcs_dir);
        Self {
            config,
            manifest_builder,
            archive_writer: ArchiveWriter::new(),
            archive_path: None,
        }
    }

    /// Replace the VCS reader used for provenance
    pub fn with_vcs_reader(mut self, reader: Box<dyn VcsInfoReader>) -> Self {
        self.manifest_builder = self.manifest_builder.with_vcs_reader(reader);
        self
    }

    /// Replace the build identity source
    pub fn with_identity(mut self, identity: Box<dyn IdentitySource>) -> Self {
        self.manifest_builder = self.manifest_builder.with_identity(identity);
        self
    }

    /// Write the archive to `path` instead of `<install>/far/<process>/<process>.far`
    pub fn with_archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive_path = Some(path.into());
        self
    }

    /// Replace the archive writer
    pub fn with_archive_writer(mut self, writer: ArchiveWriter) -> Self {
        self.archive_writer = writer;
        self
    }

    /// Where the archive for `process_name` will be written
    pub fn archive_target(&self, process_name: &str) -> PackageResult<PathBuf> {
        match &self.archive_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self
                .config
                .layout()?
                .archive_path(process_name, &self.config.conventions)),
        }
    }

    /// Package `context` into its far archive
    pub fn package(&self, mut context: ProjectContext) -> PackageResult<PackageOutcome> {
        let target = self.archive_target(context.process_name())?;
        let layout = self.config.layout()?;

        let staging = StagingArea::create(
            context.process_name(),
            self.config.staging_root.as_deref(),
        )?;

        let result = self.run(&mut context, &layout, staging.path(), &target);

        if let Err(e) = staging.close() {
            warn!(error = %e, "failed to remove staging directory");
        }

        let outcome = result?;
        info!(
            process = %context.process_name(),
            archive = %outcome.archive_path.display(),
            binaries = outcome.binaries.len(),
            resources = outcome.resources.len(),
            "package complete"
        );
        Ok(outcome)
    }

    fn run(
        &self,
        context: &mut ProjectContext,
        layout: &InstallLayout,
        staging_dir: &Path,
        target: &Path,
    ) -> PackageResult<PackageOutcome> {
        let conventions = &self.config.conventions;
        let scanner = ResourceScanner::new(conventions.clone());

        let scanned = match context.resource_root() {
            Some(_) => Vec::new(),
            None => scanner.scan(context.project_root())?,
        };

        let assembler = BinaryAssembler::new(
            Toolchain::new(self.config.toolchain.clone()),
            layout.clone(),
        );
        let binaries = assembler.assemble(
            &AssemblyRequest {
                process_name: context.process_name(),
                build_units: context.build_units(),
                target: context.target(),
                foreign_linker: context.foreign_linker(),
                extra_binaries: context.extra_binaries(),
            },
            staging_dir,
        )?;

        let staged = match context.resource_root() {
            Some(root) => scanner.copy_resource_root(root, staging_dir)?,
            None => scanner.stage(&scanned, staging_dir)?,
        };

        let kind = infer_process_kind(&staged, context.process_name(), conventions);
        context.set_process_kind(kind);

        let manifest = self.manifest_builder.build(context, &binaries);
        manifest.write_to(staging_dir, &conventions.manifest_file)?;

        let archive_path = self.archive_writer.write(staging_dir, target)?;

        let mut resources: Vec<String> = staged
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        resources.sort();

        Ok(PackageOutcome {
            archive_path,
            binaries,
            resources,
            manifest,
        })
    }
}
