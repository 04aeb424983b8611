//! # Philidor Web CLI (`pweb`)
//!
//! Compiles a catalog XML export and its project metadata into a static,
//! cross-linked HTML site.
//!
//! ## Usage
//!
//! ```bash
//! pweb --config ./config/pweb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pweb build` | Generate the site and write it to `output.dir` |
//! | `pweb check` | Load inputs and generate in memory, writing nothing |
//! | `pweb stats` | Print catalog statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Build with a JSON report next to the site
//! pweb build --report ./build/report.json
//!
//! # Validate a new export before publishing
//! pweb check --config ./config/pweb.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use philidor_web::progress::ProgressMode;
use philidor_web::{config, pipeline, stats};

/// Philidor Web CLI — compile music catalog records into a static site.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pweb.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pweb",
    about = "Philidor Web — compile music catalog records into a static site",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pweb.toml")]
    config: PathBuf,

    /// Log progress details (`info` level) unless `RUST_LOG` is set.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Generate every page and write the output tree.
    ///
    /// Pages are written under `output.dir`; static assets, when configured,
    /// are copied to `<output.dir>/statics`.
    Build {
        /// Also write a JSON generation report to this path.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Progress output on stderr. Defaults to `human` on a terminal,
        /// `off` otherwise.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Load the inputs and generate in memory without writing.
    ///
    /// Exits non-zero on the errors `build` would fail on (no records,
    /// duplicate pages under the `error` policy, malformed XML).
    Check,

    /// Print catalog statistics: records per kind, pages per kind,
    /// per-project counts, and skipped records and links.
    Stats,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build { report, progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            pipeline::run_build(&cfg, report.as_deref(), reporter.as_ref()).await?;
        }
        Commands::Check => {
            pipeline::run_check(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
