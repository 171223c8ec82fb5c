//! CSV export of the audit trail.
//!
//! Semicolon-delimited, matching the shape of the original activity-log and
//! trade-history dumps so downstream analysis tooling reads both the raw
//! feed and replay output with the same parser. Three levels per side are
//! exported; missing levels are left blank.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use shd_model::Trade;

use crate::recorder::ActivityRow;

const EXPORT_LEVELS: usize = 3;

/// Render activity rows as CSV (pure).
pub fn activity_csv_string(rows: &[ActivityRow]) -> String {
    let mut out = String::from(
        "tick;timestamp;product;\
         bid_price_1;bid_volume_1;bid_price_2;bid_volume_2;bid_price_3;bid_volume_3;\
         ask_price_1;ask_volume_1;ask_price_2;ask_volume_2;ask_price_3;ask_volume_3;\
         mid_price;profit_and_loss\n",
    );

    for row in rows {
        let _ = write!(out, "{};{};{}", row.tick, row.timestamp, row.symbol);
        push_levels(&mut out, &row.bids);
        push_levels(&mut out, &row.asks);
        match row.mid {
            Some(mid) => {
                let _ = write!(out, ";{mid}");
            }
            None => out.push(';'),
        }
        let _ = writeln!(out, ";{}", row.pnl);
    }
    out
}

fn push_levels(out: &mut String, levels: &[(i64, i64)]) {
    for i in 0..EXPORT_LEVELS {
        match levels.get(i) {
            Some((price, qty)) => {
                let _ = write!(out, ";{price};{qty}");
            }
            None => out.push_str(";;"),
        }
    }
}

/// Render the trade table as CSV (pure).
pub fn trades_csv_string(trades: &[Trade]) -> String {
    let mut out = String::from("timestamp;buyer;seller;symbol;price;quantity\n");
    for t in trades {
        let _ = writeln!(
            out,
            "{};{};{};{};{};{}",
            t.timestamp, t.buyer, t.seller, t.symbol, t.price, t.quantity
        );
    }
    out
}

/// Write the activity table to disk, creating parent directories.
pub fn write_activity_csv(path: impl AsRef<Path>, rows: &[ActivityRow]) -> Result<()> {
    write_file(path.as_ref(), &activity_csv_string(rows))
}

/// Write the trade table to disk, creating parent directories.
pub fn write_trades_csv(path: impl AsRef<Path>, trades: &[Trade]) -> Result<()> {
    write_file(path.as_ref(), &trades_csv_string(trades))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("write {:?}", path))
}
