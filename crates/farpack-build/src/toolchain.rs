//! External process execution
//!
//! The compiler toolchain and shell helpers are opaque subprocesses. They block
//! until completion; there is no timeout.

use crate::error::{BuildError, BuildResult};
use crate::targets::{BuildUnit, TargetPlatform};
use farpack_config::ToolchainConfig;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (1 when terminated by a signal)
    pub exit_code: i32,
    /// Stdout output
    pub stdout: String,
    /// Stderr output
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the process exited successfully
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut output = String::new();
        output.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stderr.is_empty() && !self.stdout.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&self.stderr);
        output
    }

    /// Whether the process printed anything at all, whitespace included
    pub fn has_diagnostics(&self) -> bool {
        !self.stdout.is_empty() || !self.stderr.is_empty()
    }
}

fn capture(mut command: Command) -> std::io::Result<CommandOutput> {
    let output = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?
        .wait_with_output()?;

    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run `command` through `sh -c` in `dir`
pub fn execute_shell(dir: &Path, command: &str) -> std::io::Result<CommandOutput> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).current_dir(dir);
    capture(cmd)
}

/// One toolchain invocation for a build unit
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Unit to compile (the process runs in its source directory)
    pub unit: &'a BuildUnit,
    /// Path of the produced binary
    pub output: &'a Path,
    /// Cross-compilation target
    pub target: Option<&'a TargetPlatform>,
    /// Foreign linker, only honoured together with a target
    pub foreign_linker: Option<&'a str>,
}

/// Invokes the configured compiler toolchain
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
}

impl Toolchain {
    /// Create a toolchain from its settings
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// Toolchain settings
    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Assemble the command for a build request without running it
    pub fn command(&self, request: &BuildRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.build_args)
            .arg(&self.config.output_flag)
            .arg(request.output)
            .current_dir(request.unit.source_path());

        if let Some(target) = request.target {
            cmd.env(&self.config.os_var, &target.os)
                .env(&self.config.arch_var, &target.arch);

            if let Some(linker) = request.foreign_linker {
                cmd.env(&self.config.linker_var, linker)
                    .env(&self.config.ffi_var, "1")
                    .args(&self.config.strip_flags);
            }
        }

        cmd
    }

    /// Compile one unit.
    ///
    /// Any output at all counts as a failure, whatever the exit status.
    pub fn build(&self, request: &BuildRequest<'_>) -> BuildResult<CommandOutput> {
        let unit_name = request.unit.binary_name();
        let command = self.command(request);
        debug!(unit = %unit_name, command = ?command, "invoking toolchain");

        let output =
            capture(command).map_err(|e| BuildError::build_failed(&unit_name, e))?;

        if !output.success() || output.has_diagnostics() {
            let mut diagnostics = output.combined().trim().to_string();
            if diagnostics.is_empty() {
                diagnostics = if output.success() {
                    "toolchain printed blank output".to_string()
                } else {
                    format!("toolchain exited with status {}", output.exit_code)
                };
            }
            return Err(BuildError::build_failed(unit_name, diagnostics));
        }

        Ok(output)
    }
}
