//! Built-in strategies.
//!
//! `FairValueMaker` quotes both sides around a fixed fair value, skewing the
//! quotes against its inventory. `HoldStrategy` never trades; useful as a
//! replay smoke test and as the passthrough baseline.

use std::collections::BTreeMap;

use shd_model::{MarketSnapshot, Order, Symbol};

use crate::{Strategy, StrategyDecision, StrategyError, StrategyMeta, StrategyRegistry, StrategySpec};

/// Fixed-theo market maker for one instrument.
///
/// Quote sizes always target the full limit: buy size `limit - position`,
/// sell size `-(position + limit)`. The skew moves the quotes one tick
/// against inventory so the maker leans back toward flat.
pub struct FairValueMaker {
    pub symbol: Symbol,
    pub theo: i64,
    pub limit: i64,
}

impl FairValueMaker {
    pub fn new(symbol: impl Into<Symbol>, theo: i64, limit: i64) -> Self {
        Self {
            symbol: symbol.into(),
            theo,
            limit,
        }
    }
}

impl Strategy for FairValueMaker {
    fn spec(&self) -> StrategySpec {
        StrategySpec::new("fair_value_maker")
    }

    fn run(
        &mut self,
        snapshot: &MarketSnapshot,
        state_blob: &str,
    ) -> Result<StrategyDecision, StrategyError> {
        let mut orders: BTreeMap<Symbol, Vec<Order>> = BTreeMap::new();

        if snapshot.depth(&self.symbol).is_some() {
            let position = snapshot.position.get(&self.symbol).copied().unwrap_or(0);
            let bid_qty = self.limit - position;
            let ask_qty = -position - self.limit;

            let (bid_px, ask_px) = if position == 0 {
                (self.theo - 1, self.theo + 1)
            } else if position > 0 {
                (self.theo - 2, self.theo)
            } else {
                (self.theo, self.theo + 2)
            };

            let mut batch = Vec::new();
            if bid_qty > 0 {
                batch.push(Order::new(self.symbol.clone(), bid_px, bid_qty));
            }
            if ask_qty < 0 {
                batch.push(Order::new(self.symbol.clone(), ask_px, ask_qty));
            }
            if !batch.is_empty() {
                orders.insert(self.symbol.clone(), batch);
            }
        }

        Ok(StrategyDecision {
            orders,
            conversions: 0,
            state_blob: state_blob.to_string(),
        })
    }
}

/// Never submits an order.
pub struct HoldStrategy;

impl Strategy for HoldStrategy {
    fn spec(&self) -> StrategySpec {
        StrategySpec::new("hold")
    }

    fn run(
        &mut self,
        _snapshot: &MarketSnapshot,
        state_blob: &str,
    ) -> Result<StrategyDecision, StrategyError> {
        Ok(StrategyDecision {
            orders: BTreeMap::new(),
            conversions: 0,
            state_blob: state_blob.to_string(),
        })
    }
}

/// Register the built-in strategies on an existing registry.
pub fn register_builtins(reg: &mut StrategyRegistry) {
    // registration on a fresh registry cannot collide
    let _ = reg.register(
        StrategyMeta::new(
            "fair_value_maker",
            "1.0.0",
            "fixed-theo two-sided maker with inventory skew",
        ),
        || Box::new(FairValueMaker::new("RAINFOREST_RESIN", 10_000, 50)),
    );
    let _ = reg.register(
        StrategyMeta::new("hold", "1.0.0", "submits no orders"),
        || Box::new(HoldStrategy),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use shd_model::OrderDepth;

    fn snapshot(symbol: &str, position: i64) -> MarketSnapshot {
        let mut depth = OrderDepth::new();
        depth.buy_orders.insert(9_998, 5);
        depth.sell_orders.insert(10_002, 5);
        let mut s = MarketSnapshot::default();
        s.order_depths.insert(symbol.to_string(), depth);
        s.position.insert(symbol.to_string(), position);
        s
    }

    #[test]
    fn flat_maker_quotes_symmetrically_around_theo() {
        let mut m = FairValueMaker::new("X", 10_000, 50);
        let d = m.run(&snapshot("X", 0), "").unwrap();

        let batch = &d.orders["X"];
        assert_eq!(batch.len(), 2);
        assert_eq!((batch[0].price, batch[0].quantity), (9_999, 50));
        assert_eq!((batch[1].price, batch[1].quantity), (10_001, -50));
    }

    #[test]
    fn long_maker_skews_quotes_down() {
        let mut m = FairValueMaker::new("X", 10_000, 50);
        let d = m.run(&snapshot("X", 20), "").unwrap();

        let batch = &d.orders["X"];
        assert_eq!((batch[0].price, batch[0].quantity), (9_998, 30));
        assert_eq!((batch[1].price, batch[1].quantity), (10_000, -70));
    }

    #[test]
    fn maker_is_silent_for_unknown_instrument() {
        let mut m = FairValueMaker::new("GHOST", 10_000, 50);
        let d = m.run(&snapshot("X", 0), "").unwrap();
        assert!(d.orders.is_empty());
    }

    #[test]
    fn hold_never_trades_and_passes_blob_through() {
        let mut h = HoldStrategy;
        let d = h.run(&snapshot("X", 0), "carried").unwrap();
        assert!(d.orders.is_empty());
        assert_eq!(d.state_blob, "carried");
    }
}
