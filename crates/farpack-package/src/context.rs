//! Project context
//!
//! Everything one packaging run knows about the project: where it lives, how its
//! binaries are produced and which platform they target. The root and build units
//! are fixed once discovery finishes.

use crate::manifest::ProcessKind;
use crate::PackageResult;
use farpack_build::{BuildUnit, PathResolver, ProjectLayout, TargetPlatform};
use farpack_config::FarpackConfig;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolved project state for one packaging run
#[derive(Debug, Clone)]
pub struct ProjectContext {
    process_name: String,
    project_root: PathBuf,
    resource_root: Option<PathBuf>,
    build_units: Vec<BuildUnit>,
    target: Option<TargetPlatform>,
    foreign_linker: Option<String>,
    extra_binaries: Vec<String>,
    process_kind: ProcessKind,
}

impl ProjectContext {
    /// Context from an already resolved layout
    pub fn new(process_name: impl Into<String>, layout: ProjectLayout) -> Self {
        Self {
            process_name: process_name.into(),
            project_root: layout.root,
            resource_root: None,
            build_units: layout.build_units,
            target: None,
            foreign_linker: None,
            extra_binaries: Vec::new(),
            process_kind: ProcessKind::General,
        }
    }

    /// Resolve the project for `process_name` starting at `start_dir`.
    ///
    /// A conventional resources directory under the root becomes the resource root.
    pub fn discover(
        process_name: &str,
        start_dir: &Path,
        config: &FarpackConfig,
    ) -> PackageResult<Self> {
        let mut resolver = PathResolver::new(config.conventions.clone());
        if let Ok(install) = config.layout() {
            resolver = resolver.with_source_root(install.source_root());
        }

        let layout = resolver.resolve(start_dir, process_name)?;
        let conventional = layout.root.join(&config.conventions.resources_dir);
        let mut context = Self::new(process_name, layout);

        if conventional.is_dir() {
            debug!(path = %conventional.display(), "using conventional resource root");
            context.resource_root = Some(conventional);
        }

        Ok(context)
    }

    /// Cross-compilation target
    pub fn with_target(mut self, target: Option<TargetPlatform>) -> Self {
        self.target = target;
        self
    }

    /// Foreign linker, only meaningful together with a target.
    ///
    /// Set the target first: a linker given without one is ignored, with a single warning.
    pub fn with_foreign_linker(mut self, linker: Option<String>) -> Self {
        self.foreign_linker = linker.filter(|l| !l.trim().is_empty());
        if self.target.is_none() {
            if let Some(linker) = &self.foreign_linker {
                warn!(linker = %linker, "foreign linker ignored without a target platform");
            }
        }
        self
    }

    /// Explicit resource root, replacing the scanned resource set
    pub fn with_resource_root(mut self, resource_root: impl Into<PathBuf>) -> Self {
        self.resource_root = Some(resource_root.into());
        self
    }

    /// Additional precompiled binaries to ship
    pub fn with_extra_binaries(mut self, names: Vec<String>) -> Self {
        self.extra_binaries = names;
        self
    }

    pub(crate) fn set_process_kind(&mut self, kind: ProcessKind) {
        self.process_kind = kind;
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn resource_root(&self) -> Option<&Path> {
        self.resource_root.as_deref()
    }

    pub fn build_units(&self) -> &[BuildUnit] {
        &self.build_units
    }

    pub fn target(&self) -> Option<&TargetPlatform> {
        self.target.as_ref()
    }

    /// Foreign linker, dropped when no target is set
    pub fn foreign_linker(&self) -> Option<&str> {
        self.target.as_ref()?;
        self.foreign_linker.as_deref()
    }

    pub fn extra_binaries(&self) -> &[String] {
        &self.extra_binaries
    }

    pub fn process_kind(&self) -> ProcessKind {
        self.process_kind
    }

    /// Whether binaries are compiled rather than copied
    pub fn compiles_units(&self) -> bool {
        !self.build_units.is_empty()
    }

    /// Human-readable summary of the resolved context
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "process:       {}", self.process_name);
        let _ = writeln!(out, "project root:  {}", self.project_root.display());
        let _ = writeln!(
            out,
            "resource root: {}",
            self.resource_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(scan project root)".to_string())
        );
        let _ = writeln!(
            out,
            "target:        {}",
            self.target
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "host".to_string())
        );
        if let Some(linker) = &self.foreign_linker {
            let _ = writeln!(out, "linker:        {}", linker);
        }
        let _ = writeln!(out, "process type:  {}", self.process_kind);
        if self.build_units.is_empty() {
            let _ = writeln!(out, "build units:   none (precompiled)");
        } else {
            let _ = writeln!(out, "build units:");
            for unit in &self.build_units {
                let _ = writeln!(
                    out,
                    "  {} ({})",
                    unit.binary_name(),
                    unit.source_path().display()
                );
            }
        }
        if !self.extra_binaries.is_empty() {
            let _ = writeln!(out, "extra binaries: {}", self.extra_binaries.join(", "));
        }
        out
    }
}
