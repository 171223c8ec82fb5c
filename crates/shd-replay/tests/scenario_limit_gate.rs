use std::collections::BTreeMap;

use shd_ledger::limits;
use shd_model::{MarketSnapshot, Order, OrderDepth};
use shd_replay::{ReplayConfig, ReplayEngine};
use shd_strategy::{Strategy, StrategyDecision, StrategyError, StrategyHost, StrategySpec};

fn snap(timestamp: i64, symbols: &[&str]) -> MarketSnapshot {
    let mut s = MarketSnapshot {
        timestamp,
        ..MarketSnapshot::default()
    };
    for symbol in symbols {
        let mut depth = OrderDepth::new();
        depth.buy_orders.insert(99, 50);
        depth.sell_orders.insert(101, 50);
        s.order_depths.insert(symbol.to_string(), depth);
    }
    s
}

/// Tries to buy `size` on every tick regardless of position.
struct Greedy {
    size: i64,
}

impl Strategy for Greedy {
    fn spec(&self) -> StrategySpec {
        StrategySpec::new("greedy")
    }

    fn run(
        &mut self,
        snapshot: &MarketSnapshot,
        state_blob: &str,
    ) -> Result<StrategyDecision, StrategyError> {
        let mut orders: BTreeMap<String, Vec<Order>> = BTreeMap::new();
        for symbol in snapshot.order_depths.keys() {
            orders
                .entry(symbol.clone())
                .or_default()
                .push(Order::new(symbol.clone(), 101, self.size));
        }
        Ok(StrategyDecision {
            orders,
            conversions: 0,
            state_blob: state_blob.to_string(),
        })
    }
}

#[test]
fn position_never_exceeds_the_limit() {
    let snapshots: Vec<_> = (0..8).map(|i| snap(i * 100, &["X"])).collect();

    let mut host = StrategyHost::new();
    host.register(Box::new(Greedy { size: 4 })).unwrap();
    let mut engine = ReplayEngine::new(ReplayConfig::new(limits([("X", 10)])), host);

    let report = engine.run(&snapshots).unwrap();

    // 4 + 4 fill, the next 4 would project to 12 and every later batch
    // is rejected identically
    assert_eq!(report.positions.get("X"), Some(&8));
    assert_eq!(report.rejected_batches, 6);
}

#[test]
fn batch_with_one_breaching_side_cancels_entirely() {
    /// One batch: a safe sell and a breaching buy on the same instrument.
    struct MixedBatch;

    impl Strategy for MixedBatch {
        fn spec(&self) -> StrategySpec {
            StrategySpec::new("mixed_batch")
        }

        fn run(
            &mut self,
            _snapshot: &MarketSnapshot,
            state_blob: &str,
        ) -> Result<StrategyDecision, StrategyError> {
            let mut orders: BTreeMap<String, Vec<Order>> = BTreeMap::new();
            orders.insert(
                "X".to_string(),
                vec![Order::new("X", 99, -3), Order::new("X", 101, 15)],
            );
            Ok(StrategyDecision {
                orders,
                conversions: 0,
                state_blob: state_blob.to_string(),
            })
        }
    }

    let snapshots = vec![snap(0, &["X"])];
    let mut host = StrategyHost::new();
    host.register(Box::new(MixedBatch)).unwrap();
    let mut engine = ReplayEngine::new(ReplayConfig::new(limits([("X", 10)])), host);

    let report = engine.run(&snapshots).unwrap();

    // worst-case long projection 0+15 breaches; the safe sell dies with it
    assert_eq!(report.rejected_batches, 1);
    assert!(report.positions.is_empty());
    assert!(engine.audit().trades().is_empty());
}

#[test]
fn rejection_is_per_instrument_not_per_tick() {
    /// X breaches its limit, Y stays inside its own.
    struct TwoBooks;

    impl Strategy for TwoBooks {
        fn spec(&self) -> StrategySpec {
            StrategySpec::new("two_books")
        }

        fn run(
            &mut self,
            _snapshot: &MarketSnapshot,
            state_blob: &str,
        ) -> Result<StrategyDecision, StrategyError> {
            let mut orders: BTreeMap<String, Vec<Order>> = BTreeMap::new();
            orders.insert("X".to_string(), vec![Order::new("X", 101, 15)]);
            orders.insert("Y".to_string(), vec![Order::new("Y", 101, 5)]);
            Ok(StrategyDecision {
                orders,
                conversions: 0,
                state_blob: state_blob.to_string(),
            })
        }
    }

    let snapshots = vec![snap(0, &["X", "Y"])];
    let mut host = StrategyHost::new();
    host.register(Box::new(TwoBooks)).unwrap();
    let mut engine =
        ReplayEngine::new(ReplayConfig::new(limits([("X", 10), ("Y", 10)])), host);

    let report = engine.run(&snapshots).unwrap();

    assert_eq!(report.rejected_batches, 1);
    assert_eq!(report.positions.get("X"), None);
    assert_eq!(report.positions.get("Y"), Some(&5));
}

#[test]
fn unconfigured_instrument_gets_limit_zero() {
    let snapshots = vec![snap(0, &["X"])];
    let mut host = StrategyHost::new();
    host.register(Box::new(Greedy { size: 1 })).unwrap();
    // no limits configured at all
    let mut engine = ReplayEngine::new(ReplayConfig::default(), host);

    let report = engine.run(&snapshots).unwrap();

    assert_eq!(report.rejected_batches, 1);
    assert!(report.positions.is_empty());
}
