use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;

/// Package a process into a deployable far archive.
///
/// A far archive holds the process binaries, its configuration resources and a
/// deployment.json manifest recording who built it, when, and from which commit.
///
/// EXAMPLES:
///     farpack package billing                     Package for the host platform
///     farpack package billing linux_arm64         Cross-compile for linux/arm64
///     farpack package billing linux_amd64 musl-gcc   Cross-compile with a C linker
///     farpack inspect billing                     Show the resolved project
///
/// ENVIRONMENT VARIABLES:
///     FARPACK_HOME       Install root (falls back to GOPATH)
///     FARPACK_TOOLCHAIN  Compiler program (default: go)
///     FARPACK_CONFIG     Alternate config file
///     FARPACK_LOG        Log filter, e.g. 'debug' or 'farpack_build=trace'
///     FARPACK_JSON       Set to '1' for JSON output by default
///     NO_COLOR           Set to disable colored output
#[derive(Parser)]
#[command(name = "farpack")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Errors only
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Config file to use instead of ~/.farpack/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Install root, overriding FARPACK_HOME and GOPATH
    #[arg(long, global = true, value_name = "DIR")]
    install_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Package a process into its far archive
    ///
    /// Resolves the project from the current directory, compiles every build
    /// unit (or copies the precompiled binary when there are none), collects
    /// resources and writes <install>/far/<process>/<process>.far.
    ///
    /// EXAMPLES:
    ///     farpack package billing
    ///     farpack package billing linux_arm64
    ///     farpack package billing --resources ./deploy/conf
    ///     farpack package billing --extra-bin billing-migrate,billing-cli
    ///     farpack package billing -o dist/billing.far --json
    #[command(visible_alias = "p")]
    Package {
        /// Process name
        process: String,
        /// Target platform as <os>_<arch>
        os_arch: Option<String>,
        /// Foreign linker for cross builds (requires a target)
        linker: Option<String>,
        /// Ship this directory's contents instead of scanning for resources
        #[arg(long, value_name = "DIR")]
        resources: Option<PathBuf>,
        /// Extra precompiled binaries to ship, comma separated
        #[arg(long, value_delimiter = ',', value_name = "NAMES")]
        extra_bin: Vec<String>,
        /// Archive path, overriding the install-root default
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
        /// Parent directory for the staging directory
        #[arg(long, value_name = "DIR")]
        staging_dir: Option<PathBuf>,
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved project without packaging
    ///
    /// EXAMPLES:
    ///     farpack inspect billing
    ///     farpack inspect billing linux_amd64 --json
    #[command(visible_alias = "i")]
    Inspect {
        /// Process name
        process: String,
        /// Target platform as <os>_<arch>
        os_arch: Option<String>,
        /// Foreign linker for cross builds
        linker: Option<String>,
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     farpack completions bash > ~/.bash_completions/farpack.bash
    ///     farpack completions zsh > ~/.zfunc/_farpack
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: u8, quiet: bool, cli_config: &config::Config) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose > 0 {
        EnvFilter::new(if verbose == 1 { "debug" } else { "trace" })
    } else {
        cli_config
            .log_filter
            .as_deref()
            .and_then(|f| EnvFilter::try_new(f).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_ansi(!cli_config.no_color),
        )
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    if cli_config.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, cli.quiet, &cli_config);

    let project = |process: String, os_arch: Option<String>, linker: Option<String>| {
        commands::ProjectArgs {
            process,
            os_arch,
            linker,
            config_file: cli.config.clone(),
            install_root: cli.install_root.clone(),
        }
    };

    match cli.command {
        Commands::Package {
            process,
            os_arch,
            linker,
            resources,
            extra_bin,
            output,
            staging_dir,
            json,
        } => {
            // Command-line flag overrides environment variable
            let use_json = json || cli_config.default_json;
            let args = commands::package::PackageArgs {
                project: project(process, os_arch, linker),
                resources,
                extra_bin,
                output,
                staging_dir,
                json: use_json,
                quiet: cli.quiet,
            };
            commands::package::run(args)?;
        }
        Commands::Inspect {
            process,
            os_arch,
            linker,
            json,
        } => {
            let use_json = json || cli_config.default_json;
            commands::inspect::run(project(process, os_arch, linker), use_json)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
