use anyhow::Result;
use clap::{Parser, Subcommand};

use fwgate::commands::{
    coverage_command, init_config_command, show_config_command, size_command, verify_command,
    VerifyOptions,
};

/// Post-build firmware verification CLI.
///
/// This CLI is a thin wrapper around `fwgate-core` (exposed in code as `fwgate_core`).
/// All substantive logic lives in the library so it can be tested thoroughly.
#[derive(Parser, Debug)]
#[command(
    name = "fwgate",
    version,
    about = "Flash/RAM budget and coverage gate for firmware builds",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure flash and RAM usage of a linked binary against the budget.
    ///
    /// RAM is read from the linker map next to the binary (same stem, `.map`).
    /// Budget breaches are printed as warnings and never change the exit code.
    Size {
        /// Path to the linked firmware image (e.g., `.pio/build/env/firmware.elf`).
        #[arg(long)]
        binary: String,

        /// Optional config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Do not run the symbol-table tool.
        #[arg(long, default_value_t = false)]
        skip_symbols: bool,
    },

    /// Generate HTML/text coverage reports and check coverage thresholds.
    Coverage {
        /// Build directory holding the instrumented object files.
        #[arg(long)]
        build_dir: String,

        /// Source root handed to the coverage tool. Defaults to the config value (`.`).
        #[arg(long)]
        root: Option<String>,

        /// Optional config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit non-zero when coverage is below the thresholds.
        #[arg(long, default_value_t = false)]
        enforce: bool,
    },

    /// Run both the size analysis and the coverage gate for one build.
    Verify {
        /// Path to the linked firmware image.
        #[arg(long)]
        binary: String,

        /// Build directory for coverage. Defaults to the binary's directory.
        #[arg(long)]
        build_dir: Option<String>,

        /// Source root handed to the coverage tool.
        #[arg(long)]
        root: Option<String>,

        /// Optional config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Exit non-zero when any stage fails or coverage is below the thresholds.
        #[arg(long, default_value_t = false)]
        enforce: bool,

        /// Only run the size analysis.
        #[arg(long, default_value_t = false)]
        skip_coverage: bool,

        /// Do not run the symbol-table tool.
        #[arg(long, default_value_t = false)]
        skip_symbols: bool,
    },

    /// Write the default configuration file.
    InitConfig {
        /// Destination path; `.yaml`/`.yml` writes YAML, anything else JSON.
        #[arg(long, default_value = "fwgate.json")]
        path: String,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show the effective configuration.
    ShowConfig {
        /// Optional config file (JSON or YAML).
        #[arg(long)]
        config: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    fwgate::init_tracing();
    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "dispatching");

    match cli.command {
        Command::Size { binary, config, json, skip_symbols } => {
            size_command(&binary, config.as_deref(), json, skip_symbols)?
        }
        Command::Coverage { build_dir, root, config, json, enforce } => {
            coverage_command(&build_dir, root.as_deref(), config.as_deref(), json, enforce)?
        }
        Command::Verify {
            binary,
            build_dir,
            root,
            config,
            json,
            enforce,
            skip_coverage,
            skip_symbols,
        } => {
            let opts = VerifyOptions {
                build_dir,
                source_root: root,
                config_path: config,
                json,
                enforce,
                skip_coverage,
                skip_symbols,
            };
            verify_command(&binary, &opts)?
        }
        Command::InitConfig { path, force } => init_config_command(&path, force)?,
        Command::ShowConfig { config, json } => show_config_command(config.as_deref(), json)?,
    }

    Ok(())
}
