//! Package command - build or collect binaries and resources into a far archive

use super::{load_config, resolve_context, ProjectArgs};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use farpack_package::{PackageOutcome, Packager};
use std::path::PathBuf;

/// Package command arguments
#[derive(Debug, Default)]
pub struct PackageArgs {
    pub project: ProjectArgs,
    /// Resource directory replacing the scanned resources
    pub resources: Option<PathBuf>,
    /// Extra precompiled binaries to ship
    pub extra_bin: Vec<String>,
    /// Archive path override
    pub output: Option<PathBuf>,
    /// Parent directory for the staging directory
    pub staging_dir: Option<PathBuf>,
    /// JSON output
    pub json: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
}

/// Run the package command
pub fn run(args: PackageArgs) -> Result<()> {
    let mut config = load_config(&args.project)?;
    if let Some(dir) = &args.staging_dir {
        config = config.with_staging_root(dir);
    }

    let mut context = resolve_context(&args.project, &config)?;

    if let Some(resources) = &args.resources {
        if !resources.is_dir() {
            bail!("Resource directory not found: {}", resources.display());
        }
        context = context.with_resource_root(resources);
    }

    let extra: Vec<String> = args
        .extra_bin
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !extra.is_empty() {
        context = context.with_extra_binaries(extra);
    }

    let mut packager = Packager::new(config);
    if let Some(output) = &args.output {
        packager = packager.with_archive_path(output);
    }

    let outcome = packager
        .package(context)
        .with_context(|| format!("Failed to package '{}'", args.project.process))?;

    if args.json {
        print_json(&outcome)?;
    } else if args.quiet {
        println!("{}", outcome.archive_path.display());
    } else {
        print_summary(&outcome);
    }

    Ok(())
}

fn print_json(outcome: &PackageOutcome) -> Result<()> {
    let value = serde_json::json!({
        "success": true,
        "archive": outcome.archive_path,
        "binaries": outcome.binaries,
        "resources": outcome.resources,
        "manifest": outcome.manifest,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_summary(outcome: &PackageOutcome) {
    println!(
        "{} {} ({})",
        "Packaged".green().bold(),
        outcome.manifest.process,
        outcome.manifest.process_type
    );
    for binary in &outcome.binaries {
        println!("  binary    {} [{}]", binary.name, binary.origin);
    }
    for resource in &outcome.resources {
        println!("  resource  {}", resource);
    }
    if let Some(git) = &outcome.manifest.build.git {
        println!("  git       {}@{}", git.branch, git.commit);
    }
    println!("{}", outcome.archive_path.display());
}
