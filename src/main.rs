use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reqdash::export::ExportKind;
use reqdash::transport::cli::{self, FilterArgs, OutputFormat};
use reqdash::Config;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reqdash")]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), env!("REQDASH_VERSION_SUFFIX")),
    about = "reqdash - terminal analytics dashboard for API usage",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: config.toml in the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard
    Dash,

    /// Print aggregate metrics and the model distribution
    Stats {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Export requests or the summary as CSV
    Export {
        /// What to export
        #[arg(value_enum)]
        kind: ExportTarget,

        #[command(flatten)]
        filters: FilterArgs,

        /// Directory for the CSV file (default: dashboard.export_dir)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportTarget {
    Requests,
    Summary,
}

impl From<ExportTarget> for ExportKind {
    fn from(target: ExportTarget) -> Self {
        match target {
            ExportTarget::Requests => ExportKind::Requests,
            ExportTarget::Summary => ExportKind::Summary,
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        "reqdash=debug"
    } else {
        "reqdash=info"
    };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    match log_file {
        // The dashboard owns the terminal, so it logs to a file
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let log_file = matches!(args.command, Commands::Dash).then(|| config.log_file());
    init_logging(args.verbose, log_file.as_deref())?;

    match args.command {
        Commands::Dash => {
            cli::run_dashboard(config).await?;
        }
        Commands::Stats { filters, format } => {
            cli::run_stats(&config, &filters, format).await?;
        }
        Commands::Export {
            kind,
            filters,
            out_dir,
        } => {
            cli::run_export(&config, kind.into(), &filters, out_dir).await?;
        }
    }

    Ok(())
}
