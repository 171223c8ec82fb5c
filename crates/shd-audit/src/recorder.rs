use serde::{Deserialize, Serialize};

use shd_model::{MarketSnapshot, Symbol, Trade};

/// Default number of book levels captured per side.
pub const DEFAULT_DEPTH: usize = 3;

/// One activity row: top-of-book and cumulative PnL for one instrument at
/// one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub tick: u64,
    pub timestamp: i64,
    pub symbol: Symbol,
    /// (price, quantity) pairs, best first, at most `depth` entries.
    pub bids: Vec<(i64, i64)>,
    pub asks: Vec<(i64, i64)>,
    /// Mid-price at this tick; `None` on a one-sided book.
    pub mid: Option<f64>,
    /// Cumulative aggregate PnL after this tick settled.
    pub pnl: f64,
}

/// Append-only, replay-ordered audit accumulator.
///
/// Owned exclusively by the orchestrator; one `record` call per tick.
/// Finalization/export is the caller's concern (see [`crate::export`]).
#[derive(Debug, Default)]
pub struct AuditRecorder {
    depth: usize,
    rows: Vec<ActivityRow>,
    trades: Vec<Trade>,
}

impl AuditRecorder {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            rows: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Append one tick's result: a row per instrument present in the
    /// snapshot, plus every trade generated this tick.
    pub fn record(
        &mut self,
        tick: u64,
        snapshot: &MarketSnapshot,
        aggregate_pnl: f64,
        trades: &[Trade],
    ) {
        for (symbol, depth) in &snapshot.order_depths {
            self.rows.push(ActivityRow {
                tick,
                timestamp: snapshot.timestamp,
                symbol: symbol.clone(),
                bids: depth.top_bids(self.depth),
                asks: depth.top_asks(self.depth),
                mid: depth.mid_price(),
                pnl: aggregate_pnl,
            });
        }
        self.trades.extend_from_slice(trades);
    }

    /// All activity rows in replay order.
    pub fn rows(&self) -> &[ActivityRow] {
        &self.rows
    }

    /// All synthetic trades in replay order.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shd_model::OrderDepth;

    fn snapshot() -> MarketSnapshot {
        let mut depth = OrderDepth::new();
        for (p, q) in [(99, 5), (98, 3), (97, 2), (96, 1)] {
            depth.buy_orders.insert(p, q);
        }
        depth.sell_orders.insert(101, 4);
        let mut s = MarketSnapshot {
            timestamp: 100,
            ..Default::default()
        };
        s.order_depths.insert("X".to_string(), depth);
        s
    }

    #[test]
    fn record_captures_depth_limited_book_and_pnl() {
        let mut rec = AuditRecorder::new(DEFAULT_DEPTH);
        rec.record(0, &snapshot(), 12.5, &[]);

        assert_eq!(rec.rows().len(), 1);
        let row = &rec.rows()[0];
        assert_eq!(row.bids, vec![(99, 5), (98, 3), (97, 2)]);
        assert_eq!(row.asks, vec![(101, 4)]);
        assert_eq!(row.mid, Some(100.0));
        assert_eq!(row.pnl, 12.5);
    }

    #[test]
    fn trades_accumulate_in_replay_order() {
        let mut rec = AuditRecorder::new(DEFAULT_DEPTH);
        rec.record(0, &snapshot(), 0.0, &[Trade::submission_buy("X", 101, 1, 100)]);
        rec.record(1, &snapshot(), 0.0, &[Trade::submission_sell("X", 99, 1, 200)]);

        assert_eq!(rec.trades().len(), 2);
        assert_eq!(rec.trades()[0].quantity, 1);
        assert_eq!(rec.trades()[1].quantity, -1);
    }

    #[test]
    fn empty_tick_still_appends_rows() {
        let mut rec = AuditRecorder::new(DEFAULT_DEPTH);
        rec.record(0, &snapshot(), -1.0, &[]);
        assert_eq!(rec.rows().len(), 1);
        assert!(rec.trades().is_empty());
    }
}
