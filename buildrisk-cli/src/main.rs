//! buildrisk CLI: delay and cost-overrun risk inference from the terminal.
//!
//! Every command reads a JSON file and prints pretty JSON on stdout. Logs go to stderr and
//! to a daily JSON log file.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// buildrisk: schedule-delay and cost-overrun risk for construction projects
#[derive(Parser, Debug)]
#[command(name = "buildrisk", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (artifacts, prediction log and `.buildrisk/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Model artifact directory, overriding the configured one
    #[arg(long)]
    models: Option<PathBuf>,

    /// Do not record predictions in the prediction log
    #[arg(long)]
    no_history: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Predict schedule delay for one project record
    Delay {
        /// JSON file with a single project record
        file: PathBuf,
        /// Estimate delay days with the weighted regressor ensemble
        #[arg(long)]
        ensemble: bool,
    },
    /// Predict schedule delay for an array of project records
    Batch {
        /// JSON file with an array of project records
        file: PathBuf,
        #[arg(long)]
        ensemble: bool,
    },
    /// Predict cost overrun for one project record
    Cost {
        file: PathBuf,
    },
    /// Run what-if scenarios over a base project
    Simulate {
        /// JSON file of the form `{"base": {...}, "scenarios": [{"name", "overrides"}]}`
        file: PathBuf,
    },
    /// Compare a project's features with the training reference statistics
    Drift {
        file: PathBuf,
    },
    /// Check a project record against the validation gate
    Validate {
        file: PathBuf,
    },
    /// Show recent logged predictions
    History {
        #[arg(long, value_enum, default_value = "cost")]
        kind: HistoryKind,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Aggregate statistics over the prediction log
    Stats,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HistoryKind {
    Cost,
    Delay,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "buildrisk", "buildrisk")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "buildrisk.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut config = buildrisk_core::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    if let Some(models) = cli.models {
        config.artifacts.dir = models;
    }
    if cli.no_history {
        config.audit.enabled = false;
    }
    tracing::debug!(
        workspace = %workspace.display(),
        artifacts = %config.artifacts.dir.display(),
        history = config.audit.enabled,
        "Configuration loaded"
    );

    commands::handle_command(cli.command, config, &workspace)
}
