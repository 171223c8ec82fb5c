//! shd-model
//!
//! Snapshot data model for the replay engine.
//! - One `MarketSnapshot` per recorded tick: order books, recent trades,
//!   observations, and the strategy-visible position vector
//! - Orders encode side by signed quantity (+buy, -sell)
//! - Trades are immutable once created
//! - Pure data + small accessors; no IO, no time, no behavior

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Instrument identifier.
pub type Symbol = String;

/// Counterparty tag carried on the strategy's side of a synthetic fill.
pub const SUBMISSION: &str = "SUBMISSION";

/// Per-instrument listing metadata from the feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub symbol: Symbol,
    pub product: String,
    pub denomination: String,
}

impl Listing {
    pub fn new(
        symbol: impl Into<Symbol>,
        product: impl Into<String>,
        denomination: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            product: product.into(),
            denomination: denomination.into(),
        }
    }
}

/// Two-sided depth for one instrument at one tick.
///
/// price -> positive resting quantity; prices are unique per side by
/// construction (map keys). `BTreeMap` iteration gives ascending prices,
/// so asks walk low-to-high directly and bids walk high-to-low via `.rev()`.
///
/// Invariant: no zero or negative quantities on either side. Crossed books
/// (best bid >= best ask) are legal input and are matched as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDepth {
    pub buy_orders: BTreeMap<i64, i64>,
    pub sell_orders: BTreeMap<i64, i64>,
}

impl OrderDepth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest resting bid price, if any.
    pub fn best_bid(&self) -> Option<i64> {
        self.buy_orders.keys().next_back().copied()
    }

    /// Lowest resting ask price, if any.
    pub fn best_ask(&self) -> Option<i64> {
        self.sell_orders.keys().next().copied()
    }

    /// Mid-price: average of best bid and best ask.
    ///
    /// `None` when either side is empty; the caller carries the previous
    /// mark forward in that case.
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Top `depth` bid levels, best (highest price) first.
    pub fn top_bids(&self, depth: usize) -> Vec<(i64, i64)> {
        self.buy_orders
            .iter()
            .rev()
            .take(depth)
            .map(|(p, q)| (*p, *q))
            .collect()
    }

    /// Top `depth` ask levels, best (lowest price) first.
    pub fn top_asks(&self, depth: usize) -> Vec<(i64, i64)> {
        self.sell_orders
            .iter()
            .take(depth)
            .map(|(p, q)| (*p, *q))
            .collect()
    }
}

/// Conversion observation for an instrument (informational; the replay core
/// never settles conversions).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionObservation {
    pub bid_price: f64,
    pub ask_price: f64,
    pub transport_fees: f64,
    pub export_tariff: f64,
    pub import_tariff: f64,
}

/// One discrete-time recorded view of all instruments.
///
/// Created once by the feed and read-only for the duration of a tick.
/// `position` is the strategy-visible position vector at tick start; the
/// orchestrator overwrites it with the simulated ledger positions before
/// handing the snapshot view to the strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Monotonically increasing, fixed-step tick timestamp.
    pub timestamp: i64,
    pub listings: BTreeMap<Symbol, Listing>,
    pub order_depths: BTreeMap<Symbol, OrderDepth>,
    /// Trades executed elsewhere in the market around this tick (informational,
    /// and the look-ahead liquidity source for the matcher).
    pub market_trades: BTreeMap<Symbol, Vec<Trade>>,
    /// The strategy's own past fills, as the original feed records them.
    pub own_trades: BTreeMap<Symbol, Vec<Trade>>,
    /// Plain per-instrument observed values.
    pub plain_observations: BTreeMap<Symbol, i64>,
    /// Conversion observations per instrument.
    pub conversion_observations: BTreeMap<Symbol, ConversionObservation>,
    /// Strategy-visible position vector at the start of the tick.
    pub position: BTreeMap<Symbol, i64>,
}

impl MarketSnapshot {
    /// Depth for an instrument; `None` when the instrument is absent
    /// (absent means zero liquidity, not an error).
    pub fn depth(&self, symbol: &str) -> Option<&OrderDepth> {
        self.order_depths.get(symbol)
    }

    /// Recorded market trades for an instrument (empty slice when absent).
    pub fn market_trades_for(&self, symbol: &str) -> &[Trade] {
        self.market_trades
            .get(symbol)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All instrument symbols present at this tick, sorted.
    pub fn symbols(&self) -> Vec<&Symbol> {
        self.order_depths.keys().collect()
    }
}

/// A candidate order from the strategy.
///
/// Sign encodes side: positive quantity buys, negative sells. There is no
/// separate side field; the matching rules key off the sign. Quantity
/// magnitude is not validated at construction; the ledger's order
/// validation and batch gate own that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub symbol: Symbol,
    pub price: i64,
    pub quantity: i64,
}

impl Order {
    pub fn new(symbol: impl Into<Symbol>, price: i64, quantity: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            quantity,
        }
    }

    pub fn is_buy(&self) -> bool {
        self.quantity > 0
    }

    pub fn is_sell(&self) -> bool {
        self.quantity < 0
    }

    /// Unsigned order size.
    pub fn abs_quantity(&self) -> i64 {
        self.quantity.abs()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.is_buy() { "BUY" } else { "SELL" };
        write!(
            f,
            "{} {} {}x @ {}",
            side,
            self.symbol,
            self.abs_quantity(),
            self.price
        )
    }
}

/// An executed trade.
///
/// For synthetic fills the strategy's side carries the `SUBMISSION` tag and
/// the quantity is signed from the strategy's perspective (+bought, -sold).
/// Feed-recorded market trades keep whatever tags the feed carried (often
/// empty for anonymous participants) and positive quantities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub price: i64,
    pub quantity: i64,
    pub buyer: String,
    pub seller: String,
    pub timestamp: i64,
}

impl Trade {
    pub fn new(
        symbol: impl Into<Symbol>,
        price: i64,
        quantity: i64,
        buyer: impl Into<String>,
        seller: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            quantity,
            buyer: buyer.into(),
            seller: seller.into(),
            timestamp,
        }
    }

    /// A synthetic fill where the strategy bought `qty` (positive) units.
    pub fn submission_buy(symbol: impl Into<Symbol>, price: i64, qty: i64, timestamp: i64) -> Self {
        debug_assert!(qty > 0, "submission_buy qty must be > 0");
        Self::new(symbol, price, qty, SUBMISSION, "", timestamp)
    }

    /// A synthetic fill where the strategy sold `qty` (positive) units.
    /// The stored quantity is negative (strategy's perspective).
    pub fn submission_sell(
        symbol: impl Into<Symbol>,
        price: i64,
        qty: i64,
        timestamp: i64,
    ) -> Self {
        debug_assert!(qty > 0, "submission_sell qty must be > 0");
        Self::new(symbol, price, -qty, "", SUBMISSION, timestamp)
    }

    /// True if this trade was generated for the strategy (either side).
    pub fn is_submission(&self) -> bool {
        self.buyer == SUBMISSION || self.seller == SUBMISSION
    }
}
