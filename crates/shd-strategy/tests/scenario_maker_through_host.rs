use shd_model::{MarketSnapshot, OrderDepth};
use shd_strategy::builtin::FairValueMaker;
use shd_strategy::{StrategyHost, StrategyRegistry};

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
fn maker_quotes_stay_inside_the_gate_envelope() {
    // the maker's batch always projects to exactly +/- limit, so an
    // all-or-nothing gate with the same limit never rejects it
    let limit = 50;
    let mut maker = FairValueMaker::new("X", 10_000, limit);

    for position in [-limit, -20, 0, 20, limit] {
        use shd_strategy::Strategy;
        let d = maker.run(&snapshot("X", position), "").unwrap();
        let batch = d.orders.get("X").cloned().unwrap_or_default();

        let buys: i64 = batch.iter().filter(|o| o.is_buy()).map(|o| o.quantity).sum();
        let sells: i64 = batch
            .iter()
            .filter(|o| o.is_sell())
            .map(|o| o.abs_quantity())
            .sum();

        assert!(position + buys <= limit);
        assert!(position - sells >= -limit);
    }
}

#[test]
fn registry_instance_runs_through_the_host() {
    let registry = StrategyRegistry::with_builtins();
    let mut host = StrategyHost::new();
    host.register(registry.instantiate("fair_value_maker").unwrap())
        .unwrap();

    assert_eq!(host.spec().unwrap().name, "fair_value_maker");

    // the builtin quotes RAINFOREST_RESIN; an X-only snapshot yields nothing
    let d = host.on_tick(&snapshot("X", 0)).unwrap();
    assert!(d.orders.is_empty());

    let d = host.on_tick(&snapshot("RAINFOREST_RESIN", 0)).unwrap();
    assert_eq!(d.orders.len(), 1);
    let batch = &d.orders["RAINFOREST_RESIN"];
    assert_eq!(batch.len(), 2);
}

#[test]
fn fresh_instances_do_not_share_state() {
    let registry = StrategyRegistry::with_builtins();
    let a = registry.instantiate("hold").unwrap();
    let b = registry.instantiate("hold").unwrap();

    let mut host_a = StrategyHost::new();
    let mut host_b = StrategyHost::new();
    host_a.register(a).unwrap();
    host_b.register(b).unwrap();

    host_a.on_tick(&snapshot("X", 0)).unwrap();
    // host_b's blob is untouched by host_a's tick
    assert_eq!(host_b.state_blob(), "");
}
