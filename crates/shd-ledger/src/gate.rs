//! Per-instrument, per-tick batch limit gate.
//!
//! The check is all-or-nothing: the worst-case post-fill position for the
//! whole batch is projected, and one breach rejects every order the strategy
//! submitted for that instrument this tick. There is no per-order throttling.

use std::fmt;

use shd_model::{Order, Symbol};

/// Aggregate buy/sell quantities of one instrument's order batch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchTotals {
    /// Sum of positive order quantities.
    pub buys: i64,
    /// Sum of absolute negative order quantities.
    pub sells: i64,
}

impl BatchTotals {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut t = Self::default();
        for o in orders {
            if o.quantity > 0 {
                t.buys = t.buys.saturating_add(o.quantity);
            } else {
                t.sells = t.sells.saturating_add(-o.quantity);
            }
        }
        t
    }
}

/// Details of a rejected batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LimitBreach {
    pub symbol: Symbol,
    pub limit: i64,
    pub current_position: i64,
    /// `current_position + Σ buys`; breach if greater than `+limit`.
    pub projected_long: i64,
    /// `current_position - Σ |sells|`; breach if less than `-limit`.
    pub projected_short: i64,
}

impl fmt::Display for LimitBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position limit breach for {}: position {} projects to [{}, {}] against limit ±{}",
            self.symbol, self.current_position, self.projected_short, self.projected_long, self.limit
        )
    }
}

/// Outcome of the gate for one instrument's batch this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    RejectBatch(LimitBreach),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

/// Worst-case projection for a batch of orders against a symmetric limit.
///
/// Both extremes are checked independently: all buys filling with no sells,
/// and all sells filling with no buys. Either breach rejects the whole batch.
pub fn check_batch(
    symbol: &str,
    limit: i64,
    current_position: i64,
    orders: &[Order],
) -> GateDecision {
    let totals = BatchTotals::from_orders(orders);
    let projected_long = current_position.saturating_add(totals.buys);
    let projected_short = current_position.saturating_sub(totals.sells);

    if projected_long > limit || projected_short < -limit {
        return GateDecision::RejectBatch(LimitBreach {
            symbol: symbol.to_string(),
            limit,
            current_position,
            projected_long,
            projected_short,
        });
    }
    GateDecision::Accept
}
