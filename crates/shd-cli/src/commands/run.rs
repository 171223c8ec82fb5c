//! `shd run`: replay a recorded feed against a strategy.
//!
//! Loads snapshots (JSON feed or prices/trades CSVs), runs the replay
//! engine, and writes the audit artifacts: activity.csv, trades.csv and a
//! hash-chained runlog.jsonl.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::json;
use uuid::Uuid;

use shd_audit::{write_activity_csv, write_trades_csv, RunLogWriter};
use shd_ledger::limits;
use shd_replay::{ReplayConfig, ReplayEngine, ReplayReport};
use shd_strategy::{StrategyHost, StrategyRegistry};

pub struct RunArgs {
    pub feed: Option<PathBuf>,
    pub prices: Option<PathBuf>,
    pub trades: Option<PathBuf>,
    pub strategy: String,
    pub limits: Vec<(String, i64)>,
    pub lookahead: bool,
    pub max_ticks: Option<usize>,
    pub out: PathBuf,
}

/// clap value parser for `--limit SYMBOL=N`.
pub fn parse_limit(s: &str) -> Result<(String, i64), String> {
    let (symbol, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=N, got '{s}'"))?;
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(format!("empty symbol in '{s}'"));
    }
    let limit: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid limit value in '{s}'"))?;
    if limit < 0 {
        return Err(format!("limit must be >= 0 in '{s}'"));
    }
    Ok((symbol.to_string(), limit))
}

pub fn execute(args: RunArgs) -> Result<()> {
    let snapshots = match (&args.feed, &args.prices) {
        (Some(feed), None) => shd_feed::load_json_feed(feed)
            .with_context(|| format!("load json feed {}", feed.display()))?,
        (None, Some(prices)) => shd_feed::load_csv_feed(prices, args.trades.as_deref())
            .with_context(|| format!("load csv feed {}", prices.display()))?,
        _ => bail!("exactly one of --feed or --prices is required"),
    };

    let registry = StrategyRegistry::with_builtins();
    let strategy = registry
        .instantiate(&args.strategy)
        .with_context(|| format!("unknown strategy '{}'", args.strategy))?;

    let mut host = StrategyHost::new();
    host.register(strategy)
        .context("register strategy on host")?;

    let config = ReplayConfig::new(limits(args.limits.clone()))
        .with_lookahead(args.lookahead)
        .with_max_ticks(args.max_ticks);

    let run_id = Uuid::new_v4();
    let mut runlog = RunLogWriter::new(args.out.join("runlog.jsonl"), true)
        .context("open run log")?;
    runlog.append(
        run_id,
        "run_started",
        json!({
            "strategy": args.strategy,
            "snapshots": snapshots.len(),
            "lookahead": args.lookahead,
            "max_ticks": args.max_ticks,
            "limits": &config.limits,
        }),
    )?;

    let mut engine = ReplayEngine::new(config, host);
    let outcome = engine.run(&snapshots);

    // Artifacts are written even when the run aborts; the audit trail covers
    // every tick that completed.
    write_activity_csv(args.out.join("activity.csv"), engine.audit().rows())?;
    write_trades_csv(args.out.join("trades.csv"), engine.audit().trades())?;

    match outcome {
        Ok(report) => {
            runlog.append(run_id, "run_finished", report_payload(&report))?;
            print_summary(run_id, &report, &args.out);
            Ok(())
        }
        Err(e) => {
            let report = engine.report();
            runlog.append(
                run_id,
                "run_aborted",
                json!({ "error": e.to_string(), "partial": report_payload(&report) }),
            )?;
            print_summary(run_id, &report, &args.out);
            Err(e).context("replay aborted")
        }
    }
}

fn report_payload(report: &ReplayReport) -> serde_json::Value {
    json!({
        "ticks": report.ticks,
        "last_timestamp": report.last_timestamp,
        "aggregate_pnl": report.aggregate_pnl,
        "pnl_by_instrument": &report.pnl_by_instrument,
        "positions": &report.positions,
        "aggregate_cash": report.aggregate_cash,
        "rejected_batches": report.rejected_batches,
        "invalid_orders": report.invalid_orders,
        "conversion_requests": report.conversion_requests,
    })
}

fn print_summary(run_id: Uuid, report: &ReplayReport, out: &PathBuf) {
    println!("run_id={}", run_id);
    println!("ticks={}", report.ticks);
    if let Some(ts) = report.last_timestamp {
        println!("last_timestamp={}", ts);
    }
    println!("aggregate_pnl={}", report.aggregate_pnl);
    println!("aggregate_cash={}", report.aggregate_cash);
    for (symbol, pnl) in &report.pnl_by_instrument {
        println!("pnl[{}]={}", symbol, pnl);
    }
    for (symbol, pos) in &report.positions {
        println!("position[{}]={}", symbol, pos);
    }
    println!("rejected_batches={}", report.rejected_batches);
    println!("invalid_orders={}", report.invalid_orders);
    println!("conversion_requests={}", report.conversion_requests);
    println!("artifacts_dir={}", out.display());
}
