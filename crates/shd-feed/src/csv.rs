//! CSV snapshot feed (semicolon-delimited).
//!
//! prices.csv carries one row per (timestamp, product) with up to three
//! bid/ask levels and a mid price; trades.csv carries the recorded market
//! trades. Rows are grouped by timestamp into snapshots, and the trades
//! recorded one step earlier are attached to each snapshot, matching how
//! the original logs were cut.
//!
//! Required prices columns: `timestamp`, `product`. Level columns
//! (`bid_price_1..3`, `bid_volume_1..3`, `ask_price_1..3`, `ask_volume_1..3`)
//! and `mid_price` are optional headers; blank fields mean the level is
//! absent. Required trades columns: `timestamp`, `symbol`, `price`,
//! `quantity`; `buyer`/`seller` are optional.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use shd_model::{Listing, MarketSnapshot, OrderDepth, Trade};

use crate::{check_monotonic, FeedError};

/// Tick spacing assumed when the feed is too short to infer one.
const DEFAULT_STEP: i64 = 100;

/// Load snapshots from prices.csv plus an optional trades.csv.
pub fn load_csv_feed(
    prices_path: impl AsRef<Path>,
    trades_path: Option<&Path>,
) -> Result<Vec<MarketSnapshot>, FeedError> {
    let prices = fs::read_to_string(prices_path)?;
    let trades = match trades_path {
        Some(p) => Some(fs::read_to_string(p)?),
        None => None,
    };
    parse_csv_feed(&prices, trades.as_deref())
}

/// Parse snapshots from CSV content (pure, deterministic).
pub fn parse_csv_feed(
    prices_csv: &str,
    trades_csv: Option<&str>,
) -> Result<Vec<MarketSnapshot>, FeedError> {
    let price_rows = parse_price_rows(prices_csv)?;
    let trades = match trades_csv {
        Some(content) => parse_trade_rows(content)?,
        None => Vec::new(),
    };

    // Group price rows by timestamp; BTreeMap gives ascending tick order.
    let mut by_ts: BTreeMap<i64, Vec<PriceRow>> = BTreeMap::new();
    for row in price_rows {
        by_ts.entry(row.timestamp).or_default().push(row);
    }

    let step = infer_step(&by_ts);

    // Trades indexed by their own timestamp.
    let mut trades_at: BTreeMap<i64, Vec<Trade>> = BTreeMap::new();
    for t in trades {
        trades_at.entry(t.timestamp).or_default().push(t);
    }

    let mut out = Vec::with_capacity(by_ts.len());
    for (timestamp, rows) in by_ts {
        let mut snap = MarketSnapshot {
            timestamp,
            ..MarketSnapshot::default()
        };

        for row in rows {
            snap.listings.insert(
                row.product.clone(),
                Listing::new(row.product.clone(), row.product.clone(), ""),
            );

            let mut depth = OrderDepth::new();
            for (price, qty) in row.bids {
                if qty != 0 {
                    depth.buy_orders.insert(price, qty.abs());
                }
            }
            for (price, qty) in row.asks {
                if qty != 0 {
                    depth.sell_orders.insert(price, qty.abs());
                }
            }
            snap.order_depths.insert(row.product.clone(), depth);

            snap.position.insert(row.product.clone(), 0);
            if let Some(mid) = row.mid {
                snap.plain_observations
                    .insert(row.product.clone(), mid.round() as i64);
            }
        }

        // Attach the trades recorded one step before this tick.
        if let Some(prev_trades) = trades_at.get(&(timestamp - step)) {
            for t in prev_trades {
                if snap.listings.contains_key(&t.symbol) {
                    snap.market_trades
                        .entry(t.symbol.clone())
                        .or_default()
                        .push(t.clone());
                }
            }
        }

        out.push(snap);
    }

    check_monotonic(&out)?;
    if out.is_empty() {
        return Err(FeedError::EmptyInput);
    }
    Ok(out)
}

struct PriceRow {
    timestamp: i64,
    product: String,
    bids: Vec<(i64, i64)>,
    asks: Vec<(i64, i64)>,
    mid: Option<f64>,
}

fn parse_price_rows(csv: &str) -> Result<Vec<PriceRow>, FeedError> {
    let mut lines = csv.lines();
    let idx = header_index(lines.next().ok_or(FeedError::EmptyInput)?)?;

    let col_timestamp = find_required(&idx, "timestamp")?;
    let col_product = find_required(&idx, "product")?;
    let col_mid = idx.get("mid_price").copied();

    // (price column, volume column) per level, where the header exists
    let mut bid_cols = Vec::new();
    let mut ask_cols = Vec::new();
    for i in 1..=3 {
        if let Some(p) = idx.get(format!("bid_price_{i}").as_str()).copied() {
            bid_cols.push((p, idx.get(format!("bid_volume_{i}").as_str()).copied()));
        }
        if let Some(p) = idx.get(format!("ask_price_{i}").as_str()).copied() {
            ask_cols.push((p, idx.get(format!("ask_volume_{i}").as_str()).copied()));
        }
    }

    let mut out = Vec::new();
    for (line_idx0, raw) in lines.enumerate() {
        let line_no = line_idx0 + 2;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields = split_line(raw);
        let get = |col: usize| field(&fields, col, line_no);

        let timestamp = parse_i64(get(col_timestamp)?, "timestamp")?;
        let product = get(col_product)?.trim().to_string();
        if product.is_empty() {
            return Err(FeedError::BadRow {
                line: line_no,
                reason: "product is empty".to_string(),
            });
        }

        let bids = parse_levels(&fields, &bid_cols, line_no, "bid")?;
        let asks = parse_levels(&fields, &ask_cols, line_no, "ask")?;

        let mid = match col_mid {
            Some(c) => parse_opt_f64(get(c)?, "mid_price")?,
            None => None,
        };

        out.push(PriceRow {
            timestamp,
            product,
            bids,
            asks,
            mid,
        });
    }

    Ok(out)
}

fn parse_trade_rows(csv: &str) -> Result<Vec<Trade>, FeedError> {
    let mut lines = csv.lines();
    let idx = header_index(lines.next().ok_or(FeedError::EmptyInput)?)?;

    let col_timestamp = find_required(&idx, "timestamp")?;
    let col_symbol = find_required(&idx, "symbol")?;
    let col_price = find_required(&idx, "price")?;
    let col_quantity = find_required(&idx, "quantity")?;
    let col_buyer = idx.get("buyer").copied();
    let col_seller = idx.get("seller").copied();

    let mut out = Vec::new();
    for (line_idx0, raw) in lines.enumerate() {
        let line_no = line_idx0 + 2;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }

        let fields = split_line(raw);
        let get = |col: usize| field(&fields, col, line_no);

        let timestamp = parse_i64(get(col_timestamp)?, "timestamp")?;
        let symbol = get(col_symbol)?.trim().to_string();
        let price = parse_i64(get(col_price)?, "price")?;
        let quantity = parse_i64(get(col_quantity)?, "quantity")?;

        let buyer = match col_buyer {
            Some(c) => get(c)?.trim().to_string(),
            None => String::new(),
        };
        let seller = match col_seller {
            Some(c) => get(c)?.trim().to_string(),
            None => String::new(),
        };

        out.push(Trade::new(symbol, price, quantity, buyer, seller, timestamp));
    }

    Ok(out)
}

/// Smallest gap between consecutive ticks; how far back attached trades sit.
fn infer_step(by_ts: &BTreeMap<i64, Vec<PriceRow>>) -> i64 {
    let mut step = i64::MAX;
    let mut prev: Option<i64> = None;
    for ts in by_ts.keys() {
        if let Some(p) = prev {
            step = step.min(ts - p);
        }
        prev = Some(*ts);
    }
    if step == i64::MAX || step <= 0 {
        DEFAULT_STEP
    } else {
        step
    }
}

fn header_index(header_line: &str) -> Result<BTreeMap<String, usize>, FeedError> {
    let header_line = header_line.trim().trim_start_matches('\u{feff}');
    if header_line.is_empty() {
        return Err(FeedError::EmptyInput);
    }
    let mut idx = BTreeMap::new();
    for (i, h) in split_line(header_line).into_iter().enumerate() {
        idx.insert(h, i);
    }
    Ok(idx)
}

fn find_required(idx: &BTreeMap<String, usize>, name: &'static str) -> Result<usize, FeedError> {
    idx.get(name).copied().ok_or(FeedError::MissingHeader(name))
}

fn field<'a>(fields: &'a [String], col: usize, line_no: usize) -> Result<&'a str, FeedError> {
    fields
        .get(col)
        .map(|s| s.as_str())
        .ok_or_else(|| FeedError::BadRow {
            line: line_no,
            reason: format!("missing column index {col}"),
        })
}

fn parse_levels(
    fields: &[String],
    cols: &[(usize, Option<usize>)],
    line_no: usize,
    side: &str,
) -> Result<Vec<(i64, i64)>, FeedError> {
    let mut out = Vec::new();
    for (i, (price_col, vol_col)) in cols.iter().enumerate() {
        let price_field = field(fields, *price_col, line_no)?;
        let Some(price) = parse_opt_i64(price_field, &format!("{side}_price_{}", i + 1))? else {
            continue;
        };
        let qty = match vol_col {
            Some(c) => parse_opt_i64(field(fields, *c, line_no)?, &format!("{side}_volume_{}", i + 1))?
                .unwrap_or(0),
            None => 0,
        };
        out.push((price, qty));
    }
    Ok(out)
}

/// Minimal splitting (no quoting support); the delimiter is a semicolon.
fn split_line(line: &str) -> Vec<String> {
    line.split(';').map(|s| s.trim().to_string()).collect()
}

fn parse_i64(s: &str, col: &str) -> Result<i64, FeedError> {
    match parse_opt_i64(s, col)? {
        Some(v) => Ok(v),
        None => Err(FeedError::ParseInt {
            column: col.to_string(),
            value: s.trim().to_string(),
        }),
    }
}

/// Blank means absent. Values may be written as floats ("99.0"); they are
/// rounded to the integer tick grid.
fn parse_opt_i64(s: &str, col: &str) -> Result<Option<i64>, FeedError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(None);
    }
    if let Ok(v) = t.parse::<i64>() {
        return Ok(Some(v));
    }
    match t.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v.round() as i64)),
        _ => Err(FeedError::ParseInt {
            column: col.to_string(),
            value: t.to_string(),
        }),
    }
}

fn parse_opt_f64(s: &str, col: &str) -> Result<Option<f64>, FeedError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(None);
    }
    t.parse::<f64>()
        .map(Some)
        .map_err(|_| FeedError::ParseInt {
            column: col.to_string(),
            value: t.to_string(),
        })
}
