//! shd-ledger
//!
//! Position ledger and risk-limit gate.
//! - Per-instrument signed inventory and realized cash
//! - Mark-to-mid PnL, carrying the previous mark forward on one-sided books
//! - All-or-nothing per-instrument batch limit gate (worst-case projection)
//! - Pure deterministic logic (no IO, no time, no randomness)
//!
//! Core invariant: `cash + Σ(position_i × last_mid_i)` equals the reported
//! aggregate PnL at every tick boundary.

mod gate;
mod ledger;

pub use gate::{check_batch, BatchTotals, GateDecision, LimitBreach};
pub use ledger::{validate_order, InvalidOrder, Ledger};

use std::collections::BTreeMap;

use shd_model::Symbol;

/// Per-instrument position limits (symmetric around zero).
///
/// An instrument with no configured limit has limit 0; any nonempty order
/// batch for it is rejected by the gate.
pub type PositionLimits = BTreeMap<Symbol, i64>;

/// Helper to build a `PositionLimits` map with minimal boilerplate.
pub fn limits<I, S>(items: I) -> PositionLimits
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<Symbol>,
{
    let mut m = PositionLimits::new();
    for (sym, lim) in items {
        m.insert(sym.into(), lim);
    }
    m
}
