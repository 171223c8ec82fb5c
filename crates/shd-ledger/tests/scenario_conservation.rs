use shd_ledger::{check_batch, limits, GateDecision, Ledger};
use shd_match::match_order;
use shd_model::{MarketSnapshot, Order, OrderDepth};

fn snap(timestamp: i64, symbol: &str, bids: &[(i64, i64)], asks: &[(i64, i64)]) -> MarketSnapshot {
    let mut depth = OrderDepth::new();
    for (p, q) in bids {
        depth.buy_orders.insert(*p, *q);
    }
    for (p, q) in asks {
        depth.sell_orders.insert(*p, *q);
    }
    let mut s = MarketSnapshot {
        timestamp,
        ..MarketSnapshot::default()
    };
    s.order_depths.insert(symbol.to_string(), depth);
    s
}

/// `cash + Σ(position × last_mid)` must equal the aggregate PnL after every
/// settle/mark cycle.
fn assert_conserved(ledger: &Ledger) {
    let mut expected = ledger.aggregate_cash() as f64;
    for (symbol, pos) in ledger.positions() {
        if let Some(mid) = ledger.last_mid(symbol) {
            expected += *pos as f64 * mid;
        }
    }
    assert!(
        (ledger.aggregate_pnl() - expected).abs() < 1e-9,
        "pnl {} diverged from cash+marked positions {}",
        ledger.aggregate_pnl(),
        expected
    );
}

#[test]
fn conservation_holds_across_fills_and_marks() {
    let mut ledger = Ledger::new();

    let ticks = [
        (0, Order::new("X", 102, 5)),
        (100, Order::new("X", 99, -2)),
        (200, Order::new("X", 103, 4)),
    ];

    for (ts, order) in ticks {
        let s = snap(ts, "X", &[(99, 10)], &[(101, 10)]);
        let fills = match_order(&order, &s, None);
        ledger.settle(&fills);
        ledger.mark(&s);
        assert_conserved(&ledger);
    }

    assert_eq!(ledger.position("X"), 7);
}

#[test]
fn worked_example_buy_five_at_the_ask() {
    // limit 10, book bids 99x5 / asks 101x5, buy 5 @ 102
    let lims = limits([("X", 10)]);
    let s = snap(0, "X", &[(99, 5)], &[(101, 5)]);
    let order = Order::new("X", 102, 5);

    let decision = check_batch("X", lims["X"], 0, std::slice::from_ref(&order));
    assert!(decision.is_accept());

    let fills = match_order(&order, &s, None);
    assert_eq!(fills.len(), 1);
    assert_eq!((fills[0].price, fills[0].quantity), (101, 5));

    let mut ledger = Ledger::new();
    ledger.settle(&fills);
    ledger.mark(&s);

    assert_eq!(ledger.position("X"), 5);
    assert_eq!(ledger.cash("X"), -505);
    // marked at mid 100: -505 + 5*100 = -5
    assert_eq!(ledger.pnl("X"), -5.0);
    assert_conserved(&ledger);
}

#[test]
fn worked_example_oversized_sell_batch_is_rejected_whole() {
    // limit 10, position 0: a single sell of 20 projects to -20
    let orders = vec![Order::new("X", 99, -20)];
    match check_batch("X", 10, 0, &orders) {
        GateDecision::RejectBatch(breach) => {
            assert_eq!(breach.projected_short, -20);
            assert_eq!(breach.limit, 10);
        }
        GateDecision::Accept => panic!("batch must be rejected"),
    }
}

#[test]
fn gate_measures_against_simulated_position_not_feed() {
    let mut ledger = Ledger::new();
    let s = snap(0, "X", &[], &[(101, 10)]);
    let fills = match_order(&Order::new("X", 101, 8), &s, None);
    ledger.settle(&fills);
    assert_eq!(ledger.position("X"), 8);

    // 8 held + 5 more projects to 13 > 10
    let orders = vec![Order::new("X", 101, 5)];
    assert!(!check_batch("X", 10, ledger.position("X"), &orders).is_accept());

    // 8 held + 2 more is exactly the limit
    let orders = vec![Order::new("X", 101, 2)];
    assert!(check_batch("X", 10, ledger.position("X"), &orders).is_accept());
}

#[test]
fn unconfigured_instrument_rejects_any_batch() {
    let lims = limits([("X", 10)]);
    let limit = lims.get("GHOST").copied().unwrap_or(0);
    assert!(!check_batch("GHOST", limit, 0, &[Order::new("GHOST", 1, 1)]).is_accept());
}
