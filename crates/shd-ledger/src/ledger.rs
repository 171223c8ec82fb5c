//! Cash/inventory ledger with mark-to-mid PnL.
//!
//! Settlement is integer arithmetic only (i128 intermediates, clamped to
//! i64); floating point enters exactly once, at the marking boundary where
//! mids are averaged and positions are valued.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use shd_model::{MarketSnapshot, Order, Symbol, Trade};

fn mul_price_qty(price: i64, qty: i64) -> i128 {
    (price as i128) * (qty as i128)
}

fn clamp_to_i64(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

/// Orders that never reach the matching engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidOrder {
    /// Zero quantity carries no side and no size.
    ZeroQuantity { symbol: Symbol },
    /// An order must name an instrument.
    EmptySymbol,
}

impl fmt::Display for InvalidOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroQuantity { symbol } => {
                write!(f, "invalid order for {symbol}: quantity must be nonzero")
            }
            Self::EmptySymbol => write!(f, "invalid order: symbol must not be empty"),
        }
    }
}

impl std::error::Error for InvalidOrder {}

/// Validate an order before it may enter the gate/engine.
///
/// Quantity magnitude bounds are deliberately not checked here; the batch
/// gate owns limit enforcement.
pub fn validate_order(order: &Order) -> Result<(), InvalidOrder> {
    if order.symbol.trim().is_empty() {
        return Err(InvalidOrder::EmptySymbol);
    }
    if order.quantity == 0 {
        return Err(InvalidOrder::ZeroQuantity {
            symbol: order.symbol.clone(),
        });
    }
    Ok(())
}

/// Per-instrument inventory, cash, and last-known mark.
///
/// Mutated only by the orchestrator after a tick's fills are finalized.
/// Two ledgers fed the same trade/mark sequence always produce identical
/// state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ledger {
    positions: BTreeMap<Symbol, i64>,
    cash: BTreeMap<Symbol, i64>,
    last_mids: BTreeMap<Symbol, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settle executed trades: inventory += signed quantity,
    /// cash -= price × signed quantity (buys reduce cash, sells increase it).
    pub fn settle(&mut self, trades: &[Trade]) {
        for t in trades {
            let pos = self.positions.entry(t.symbol.clone()).or_insert(0);
            *pos = pos.saturating_add(t.quantity);

            let cost = clamp_to_i64(mul_price_qty(t.price, t.quantity));
            let cash = self.cash.entry(t.symbol.clone()).or_insert(0);
            *cash = cash.saturating_sub(cost);
        }
    }

    /// Update last-known mids from a snapshot, once per tick after all
    /// instruments settle. One-sided books leave the previous mark in place.
    pub fn mark(&mut self, snapshot: &MarketSnapshot) {
        for (symbol, depth) in &snapshot.order_depths {
            if let Some(mid) = depth.mid_price() {
                self.last_mids.insert(symbol.clone(), mid);
            }
        }
    }

    /// Signed inventory for an instrument (0 if never traded).
    pub fn position(&self, symbol: &str) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// The full position vector (only instruments that have traded).
    pub fn positions(&self) -> &BTreeMap<Symbol, i64> {
        &self.positions
    }

    /// Realized cash for an instrument.
    pub fn cash(&self, symbol: &str) -> i64 {
        self.cash.get(symbol).copied().unwrap_or(0)
    }

    /// Realized cash across all instruments.
    pub fn aggregate_cash(&self) -> i64 {
        self.cash.values().fold(0i64, |acc, c| acc.saturating_add(*c))
    }

    /// Last-known mid for an instrument, if one has ever been observed.
    pub fn last_mid(&self, symbol: &str) -> Option<f64> {
        self.last_mids.get(symbol).copied()
    }

    /// Mark-to-market PnL for one instrument: `cash + position × last_mid`.
    ///
    /// An instrument whose mid has never been observable contributes cash
    /// only until its first valid mark.
    pub fn pnl(&self, symbol: &str) -> f64 {
        let cash = self.cash(symbol) as f64;
        match (self.position(symbol), self.last_mid(symbol)) {
            (0, _) => cash,
            (pos, Some(mid)) => cash + pos as f64 * mid,
            (_, None) => cash,
        }
    }

    /// PnL per instrument, over every instrument the ledger has touched.
    pub fn pnl_by_instrument(&self) -> BTreeMap<Symbol, f64> {
        let mut symbols: BTreeSet<&Symbol> = self.positions.keys().collect();
        symbols.extend(self.cash.keys());

        symbols
            .into_iter()
            .map(|s| (s.clone(), self.pnl(s)))
            .collect()
    }

    /// Aggregate PnL: the sum of per-instrument PnL.
    pub fn aggregate_pnl(&self) -> f64 {
        self.pnl_by_instrument().values().sum()
    }
}
