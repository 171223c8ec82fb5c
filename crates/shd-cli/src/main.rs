mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shd")]
#[command(about = "ShellDesk market replay CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded feed against a strategy and export the audit trail
    Run {
        /// JSON snapshot feed (an array of recorded ticks)
        #[arg(long, conflicts_with_all = ["prices", "trades"])]
        feed: Option<PathBuf>,

        /// Semicolon-delimited prices CSV
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Semicolon-delimited trades CSV (optional alongside --prices)
        #[arg(long, requires = "prices")]
        trades: Option<PathBuf>,

        /// Strategy name (see `shd strategies`)
        #[arg(long)]
        strategy: String,

        /// Position limit as SYMBOL=N (repeatable; unlisted symbols get 0)
        #[arg(long = "limit", value_parser = commands::run::parse_limit)]
        limits: Vec<(String, i64)>,

        /// Let unfilled remainder match against the next tick's recorded trades
        #[arg(long, default_value_t = false)]
        lookahead: bool,

        /// Stop after this many ticks
        #[arg(long = "max-ticks")]
        max_ticks: Option<usize>,

        /// Output directory for activity.csv, trades.csv, runlog.jsonl
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },

    /// List the available strategies
    Strategies,

    /// Audit trail utilities
    Audit {
        #[command(subcommand)]
        cmd: AuditCmd,
    },
}

#[derive(Subcommand)]
enum AuditCmd {
    /// Verify the hash chain of a run log
    Verify {
        /// Path to runlog.jsonl
        #[arg(long)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Run {
            feed,
            prices,
            trades,
            strategy,
            limits,
            lookahead,
            max_ticks,
            out,
        } => commands::run::execute(commands::run::RunArgs {
            feed,
            prices,
            trades,
            strategy,
            limits,
            lookahead,
            max_ticks,
            out,
        }),

        Commands::Strategies => commands::strategies::execute(),

        Commands::Audit { cmd } => match cmd {
            AuditCmd::Verify { path } => commands::audit::verify(&path),
        },
    }
}
