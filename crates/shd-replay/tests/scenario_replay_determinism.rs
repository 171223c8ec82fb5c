use std::collections::BTreeMap;

use shd_audit::{activity_csv_string, trades_csv_string};
use shd_ledger::limits;
use shd_model::{MarketSnapshot, Order, OrderDepth, Trade};
use shd_replay::{ReplayConfig, ReplayEngine, ReplayReport};
use shd_strategy::{Strategy, StrategyDecision, StrategyError, StrategyHost, StrategySpec};

/// Crosses the spread on every tick, alternating sides by tick parity.
struct Alternator;

impl Strategy for Alternator {
    fn spec(&self) -> StrategySpec {
        StrategySpec::new("alternator")
    }

    fn run(
        &mut self,
        snapshot: &MarketSnapshot,
        state_blob: &str,
    ) -> Result<StrategyDecision, StrategyError> {
        let n: u64 = state_blob.parse().unwrap_or(0);
        let mut orders: BTreeMap<String, Vec<Order>> = BTreeMap::new();

        for symbol in snapshot.order_depths.keys() {
            let qty = if n % 2 == 0 { 4 } else { -4 };
            let price = if qty > 0 { 200 } else { 1 };
            orders
                .entry(symbol.clone())
                .or_default()
                .push(Order::new(symbol.clone(), price, qty));
        }

        Ok(StrategyDecision {
            orders,
            conversions: 0,
            state_blob: (n + 1).to_string(),
        })
    }
}

fn make_snapshots() -> Vec<MarketSnapshot> {
    (0..6)
        .map(|i| {
            let mut s = MarketSnapshot {
                timestamp: i * 100,
                ..MarketSnapshot::default()
            };
            for symbol in ["A", "B"] {
                let mut depth = OrderDepth::new();
                depth.buy_orders.insert(98 + i, 6);
                depth.sell_orders.insert(102 + i, 6);
                s.order_depths.insert(symbol.to_string(), depth);
            }
            s.market_trades.insert(
                "A".to_string(),
                vec![Trade::new("A", 100 + i, 3, "", "", (i - 1).max(0) * 100)],
            );
            s
        })
        .collect()
}

fn run_once(lookahead: bool) -> (ReplayReport, String, String) {
    let mut host = StrategyHost::new();
    host.register(Box::new(Alternator)).unwrap();

    let config = ReplayConfig::new(limits([("A", 20), ("B", 20)])).with_lookahead(lookahead);
    let mut engine = ReplayEngine::new(config, host);

    let report = engine.run(&make_snapshots()).unwrap();
    let activity = activity_csv_string(engine.audit().rows());
    let trades = trades_csv_string(engine.audit().trades());
    (report, activity, trades)
}

#[test]
fn identical_runs_produce_identical_histories() {
    let (r1, a1, t1) = run_once(false);
    let (r2, a2, t2) = run_once(false);

    assert_eq!(r1, r2);
    assert_eq!(a1, a2);
    assert_eq!(t1, t2);
    assert!(r1.ticks == 6);
}

#[test]
fn lookahead_runs_are_deterministic_too() {
    let (r1, a1, t1) = run_once(true);
    let (r2, a2, t2) = run_once(true);

    assert_eq!(r1, r2);
    assert_eq!(a1, a2);
    assert_eq!(t1, t2);
}
