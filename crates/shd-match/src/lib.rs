//! shd-match
//!
//! Order matching against recorded snapshot liquidity.
//! - Price priority: buys walk asks low-to-high, sells walk bids high-to-low
//! - Depth-capped: each level fills at most its resting quantity
//! - Optional look-ahead: unfilled remainder may match the next tick's
//!   recorded market trades whose price crosses the limit
//! - Pure deterministic logic (no IO, no time, no randomness)
//!
//! Missing instruments and empty book sides are zero liquidity, not errors:
//! the engine returns an empty trade list. Order validation (zero quantity)
//! happens upstream in the ledger before an order reaches the engine.

use shd_model::{MarketSnapshot, Order, Trade};

/// Match one order against a snapshot's book, optionally extending unfilled
/// remainder into the next tick's recorded trades.
///
/// Returns one `Trade` per consumed price level (and per consumed look-ahead
/// trade). Generated trades carry the current snapshot's timestamp and the
/// `SUBMISSION` tag on the strategy's side. Unfilled remainder is dropped;
/// no order persists across ticks.
pub fn match_order(
    order: &Order,
    snapshot: &MarketSnapshot,
    lookahead: Option<&MarketSnapshot>,
) -> Vec<Trade> {
    debug_assert!(order.quantity != 0, "zero-quantity orders are rejected upstream");
    if order.quantity == 0 {
        return Vec::new();
    }

    let mut trades = Vec::new();
    let mut remaining = order.abs_quantity();

    if let Some(depth) = snapshot.depth(&order.symbol) {
        if order.is_buy() {
            // asks ascending; stop once the level price exceeds the limit
            for (&price, &level_qty) in depth.sell_orders.iter() {
                if remaining == 0 || price > order.price {
                    break;
                }
                let fill = remaining.min(level_qty);
                trades.push(Trade::submission_buy(
                    order.symbol.clone(),
                    price,
                    fill,
                    snapshot.timestamp,
                ));
                remaining -= fill;
            }
        } else {
            // bids descending; stop once the level price drops below the limit
            for (&price, &level_qty) in depth.buy_orders.iter().rev() {
                if remaining == 0 || price < order.price {
                    break;
                }
                let fill = remaining.min(level_qty);
                trades.push(Trade::submission_sell(
                    order.symbol.clone(),
                    price,
                    fill,
                    snapshot.timestamp,
                ));
                remaining -= fill;
            }
        }
    }

    if remaining > 0 {
        if let Some(next) = lookahead {
            fill_from_recorded_trades(order, next, snapshot.timestamp, remaining, &mut trades);
        }
    }

    trades
}

/// Look-ahead path: the remainder rests and is filled by the market's
/// subsequent evolution, modeled as the next tick's recorded trades whose
/// price crosses the order's limit. Fills price at the recorded trade's own
/// price, in recorded order.
fn fill_from_recorded_trades(
    order: &Order,
    next: &MarketSnapshot,
    timestamp: i64,
    mut remaining: i64,
    out: &mut Vec<Trade>,
) {
    for t in next.market_trades_for(&order.symbol) {
        if remaining == 0 {
            break;
        }
        let qty = t.quantity.abs();
        if qty == 0 {
            continue;
        }
        if order.is_buy() && t.price <= order.price {
            let fill = remaining.min(qty);
            out.push(Trade::submission_buy(
                order.symbol.clone(),
                t.price,
                fill,
                timestamp,
            ));
            remaining -= fill;
        } else if order.is_sell() && t.price >= order.price {
            let fill = remaining.min(qty);
            out.push(Trade::submission_sell(
                order.symbol.clone(),
                t.price,
                fill,
                timestamp,
            ));
            remaining -= fill;
        }
    }
}

/// Signed filled quantity across a set of trades (strategy's perspective).
pub fn total_filled(trades: &[Trade]) -> i64 {
    trades.iter().map(|t| t.quantity).sum()
}
