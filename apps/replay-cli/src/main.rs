mod commands;
mod infra;
mod obs;
mod output;

use clap::{Parser, Subcommand};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "balance-replay")]
#[command(about = "Balance replay CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  balance-replay replay --config configs/sample.toml --out runs/\n  balance-replay validate --config configs/sample.toml --strict\n  balance-replay sweep --config configs/sweep.toml\n  balance-replay report --input runs/<run_id>/\n"
)]
struct Cli {
    /// Log filter when REPLAY_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
    /// Expose Prometheus metrics on this host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Replay a statement under the configured money-management policy.
    Replay {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a config and its statement without writing artifacts.
    Validate {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Run a level-cap / multiplier grid over one statement.
    Sweep {
        #[arg(long)]
        config: PathBuf,
    },
    /// Regenerate summary and charts from an existing run directory.
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() {
    output::print_banner();
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Replay { config, out } => Command::Replay { config, out },
        CliCommand::Validate { config, strict } => Command::Validate { config, strict },
        CliCommand::Sweep { config } => Command::Sweep { config },
        CliCommand::Report { input } => Command::Report { input },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
