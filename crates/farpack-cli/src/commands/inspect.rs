//! Inspect command - show what packaging would use without building anything

use super::{load_config, resolve_context, ProjectArgs};
use anyhow::Result;
use farpack_build::{BinaryAssembler, Toolchain};
use farpack_package::Packager;

/// Run the inspect command
pub fn run(args: ProjectArgs, json: bool) -> Result<()> {
    let config = load_config(&args)?;
    let context = resolve_context(&args, &config)?;

    let archive = Packager::new(config.clone())
        .archive_target(context.process_name())
        .ok();
    let precompiled = match config.layout() {
        Ok(layout) if !context.compiles_units() => Some(
            BinaryAssembler::new(Toolchain::new(config.toolchain.clone()), layout)
                .precompiled_path(context.process_name(), context.target()),
        ),
        _ => None,
    };

    if json {
        let units: Vec<_> = context
            .build_units()
            .iter()
            .map(|u| {
                serde_json::json!({
                    "name": u.binary_name(),
                    "path": u.source_path(),
                })
            })
            .collect();
        let value = serde_json::json!({
            "process": context.process_name(),
            "project_root": context.project_root(),
            "resource_root": context.resource_root(),
            "target": context.target().map(ToString::to_string),
            "linker": context.foreign_linker(),
            "build_units": units,
            "precompiled_binary": precompiled,
            "archive": archive,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print!("{}", context.summary());
    if let Some(path) = precompiled {
        println!("binary:        {}", path.display());
    }
    match archive {
        Some(path) => println!("archive:       {}", path.display()),
        None => println!("archive:       (install root not set)"),
    }

    Ok(())
}
