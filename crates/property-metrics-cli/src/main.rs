mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::metrics::MetricsArgs;

/// Investment property metrics
#[derive(Parser)]
#[command(
    name = "calc",
    version,
    about = "Investment property metrics",
    long_about = "Computes mortgage payment, NOI, cap rate, cash-on-cash return, \
                  leverage type, DSCR and gross rent multiplier for a rental \
                  property with decimal precision.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// `calc --price ...` is shorthand for `calc metrics --price ...`
    #[command(flatten)]
    metrics: MetricsArgs,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate investment metrics for one property
    Metrics(MetricsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Some(Commands::Metrics(args)) => commands::metrics::run_metrics(args),
        None => commands::metrics::run_metrics(cli.metrics),
        Some(Commands::Version) => {
            println!("calc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "calculation failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
