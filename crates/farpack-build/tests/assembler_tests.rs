//! Binary assembly tests
//!
//! Compile-mode tests stand in `sh -c <script>` for the compiler. The script sees
//! `$1 = -o` and `$2 = <output path>`, with the target variables in its environment.

use farpack_build::{
    AssemblyRequest, BinaryAssembler, BinaryOrigin, BuildError, BuildUnit, TargetPlatform,
    Toolchain,
};
use farpack_config::{InstallLayout, ToolchainConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn script_toolchain(script: &str) -> Toolchain {
    Toolchain::new(ToolchainConfig {
        program: "sh".to_string(),
        build_args: vec![
            "-c".to_string(),
            script.to_string(),
            "fake-compiler".to_string(),
        ],
        ..Default::default()
    })
}

fn units(base: &Path, names: &[&str]) -> Vec<BuildUnit> {
    names
        .iter()
        .map(|name| {
            let dir = base.join("cmd").join(name);
            fs::create_dir_all(&dir).unwrap();
            BuildUnit::new(dir)
        })
        .collect()
}

fn request<'a>(units: &'a [BuildUnit], target: Option<&'a TargetPlatform>) -> AssemblyRequest<'a> {
    AssemblyRequest {
        process_name: "app",
        build_units: units,
        target,
        foreign_linker: None,
        extra_binaries: &[],
    }
}

#[cfg(unix)]
fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}

// ============================================================================
// Compile mode
// ============================================================================

#[cfg(unix)]
#[test]
fn test_compile_two_units_produces_two_executables() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["unitA", "unitB"]);

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"printf '#!/bin/sh\n' > "$2""#),
        InstallLayout::new(install.path()),
    );
    let binaries = assembler
        .assemble(&request(&units, None), staging.path())
        .unwrap();

    let names: Vec<&str> = binaries.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["unitA", "unitB"]);
    for binary in &binaries {
        assert_eq!(binary.origin, BinaryOrigin::Compiled);
        assert_eq!(binary.path.parent(), Some(staging.path()));
        assert_eq!(mode(&binary.path), 0o755);
    }
}

#[cfg(unix)]
#[test]
fn test_compile_runs_in_unit_directory() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["worker"]);

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"basename "$(pwd -P)" > "$2""#),
        InstallLayout::new(install.path()),
    );
    assembler
        .assemble(&request(&units, None), staging.path())
        .unwrap();

    let recorded = fs::read_to_string(staging.path().join("worker")).unwrap();
    assert_eq!(recorded.trim(), "worker");
}

#[cfg(unix)]
#[test]
fn test_cross_compile_passes_target_environment() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);
    let target = TargetPlatform::new("linux", "arm64");

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"printf '%s_%s' "$GOOS" "$GOARCH" > "$2""#),
        InstallLayout::new(install.path()),
    );
    assembler
        .assemble(&request(&units, Some(&target)), staging.path())
        .unwrap();

    let recorded = fs::read_to_string(staging.path().join("api")).unwrap();
    assert_eq!(recorded, "linux_arm64");
}

#[cfg(unix)]
#[test]
fn test_foreign_linker_enables_ffi_and_strip_flags() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);
    let target = TargetPlatform::new("linux", "amd64");

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"printf '%s %s %s' "$CC" "$CGO_ENABLED" "$3" > "$2""#),
        InstallLayout::new(install.path()),
    );
    let mut req = request(&units, Some(&target));
    req.foreign_linker = Some("x86_64-linux-musl-gcc");
    assembler.assemble(&req, staging.path()).unwrap();

    let recorded = fs::read_to_string(staging.path().join("api")).unwrap();
    assert_eq!(recorded, "x86_64-linux-musl-gcc 1 -ldflags=-s -w");
}

#[cfg(unix)]
#[test]
fn test_diagnostic_output_fails_even_on_success_status() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"echo "warning: deprecated flag"; : > "$2""#),
        InstallLayout::new(install.path()),
    );
    let err = assembler
        .assemble(&request(&units, None), staging.path())
        .unwrap_err();

    match err {
        BuildError::BuildFailed { unit, output } => {
            assert_eq!(unit, "api");
            assert!(output.contains("deprecated flag"));
        }
        other => panic!("expected BuildFailed, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_blank_line_output_fails_on_success_status() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"touch "$2"; echo"#),
        InstallLayout::new(install.path()),
    );
    let err = assembler
        .assemble(&request(&units, None), staging.path())
        .unwrap_err();

    match err {
        BuildError::BuildFailed { unit, output } => {
            assert_eq!(unit, "api");
            assert_eq!(output, "toolchain printed blank output");
        }
        other => panic!("expected BuildFailed, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_silent_failure_status_fails() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);

    let assembler = BinaryAssembler::new(
        script_toolchain("exit 3"),
        InstallLayout::new(install.path()),
    );
    let result = assembler.assemble(&request(&units, None), staging.path());

    assert!(matches!(result, Err(BuildError::BuildFailed { .. })));
}

#[cfg(unix)]
#[test]
fn test_failure_aborts_remaining_units() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["first", "second"]);

    let assembler = BinaryAssembler::new(
        script_toolchain(r#"echo "undefined: main" >&2; exit 2"#),
        InstallLayout::new(install.path()),
    );
    let result = assembler.assemble(&request(&units, None), staging.path());

    assert!(matches!(result, Err(BuildError::BuildFailed { ref unit, .. }) if unit == "first"));
    assert!(!staging.path().join("second").exists());
}

#[test]
fn test_missing_toolchain_is_build_failure() {
    let project = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    let units = units(project.path(), &["api"]);

    let assembler = BinaryAssembler::new(
        Toolchain::new(ToolchainConfig {
            program: "farpack-no-such-compiler".to_string(),
            ..Default::default()
        }),
        InstallLayout::new(install.path()),
    );
    let result = assembler.assemble(&request(&units, None), staging.path());

    assert!(matches!(result, Err(BuildError::BuildFailed { .. })));
}

// ============================================================================
// Precompiled mode
// ============================================================================

#[cfg(unix)]
#[test]
fn test_precompiled_binary_copied_and_made_executable() {
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    fs::create_dir_all(install.path().join("bin")).unwrap();
    fs::write(install.path().join("bin/app"), "ELF").unwrap();

    let assembler = BinaryAssembler::new(
        Toolchain::new(ToolchainConfig::default()),
        InstallLayout::new(install.path()),
    );
    let binaries = assembler
        .assemble(&request(&[], None), staging.path())
        .unwrap();

    assert_eq!(binaries.len(), 1);
    assert_eq!(binaries[0].name, "app");
    assert_eq!(binaries[0].origin, BinaryOrigin::Precompiled);
    assert_eq!(fs::read_to_string(&binaries[0].path).unwrap(), "ELF");
    assert_eq!(mode(&binaries[0].path), 0o755);
}

#[test]
fn test_precompiled_binary_keyed_by_target() {
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    fs::create_dir_all(install.path().join("bin/linux_arm64")).unwrap();
    fs::write(install.path().join("bin/app"), "host").unwrap();
    fs::write(install.path().join("bin/linux_arm64/app"), "cross").unwrap();
    let target = TargetPlatform::new("linux", "arm64");

    let assembler = BinaryAssembler::new(
        Toolchain::new(ToolchainConfig::default()),
        InstallLayout::new(install.path()),
    );
    let binaries = assembler
        .assemble(&request(&[], Some(&target)), staging.path())
        .unwrap();

    assert_eq!(fs::read_to_string(&binaries[0].path).unwrap(), "cross");
}

#[test]
fn test_extra_binaries_staged_alongside() {
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    fs::create_dir_all(install.path().join("bin")).unwrap();
    fs::write(install.path().join("bin/app"), "main").unwrap();
    fs::write(install.path().join("bin/helper"), "helper").unwrap();
    let extras = vec!["helper".to_string()];

    let assembler = BinaryAssembler::new(
        Toolchain::new(ToolchainConfig::default()),
        InstallLayout::new(install.path()),
    );
    let mut req = request(&[], None);
    req.extra_binaries = &extras;
    let binaries = assembler.assemble(&req, staging.path()).unwrap();

    assert_eq!(binaries.len(), 2);
    assert_eq!(binaries[1].name, "helper");
    assert_eq!(binaries[1].origin, BinaryOrigin::Extra);
    assert!(staging.path().join("helper").is_file());
}

#[test]
fn test_missing_extra_binary_fails() {
    let install = TempDir::new().unwrap();
    let staging = TempDir::new().unwrap();
    fs::create_dir_all(install.path().join("bin")).unwrap();
    fs::write(install.path().join("bin/app"), "main").unwrap();
    let extras = vec!["ghost".to_string()];

    let assembler = BinaryAssembler::new(
        Toolchain::new(ToolchainConfig::default()),
        InstallLayout::new(install.path()),
    );
    let mut req = request(&[], None);
    req.extra_binaries = &extras;
    let result = assembler.assemble(&req, staging.path());

    assert!(matches!(result, Err(BuildError::BinaryNotFound { ref name, .. }) if name == "ghost"));
}
