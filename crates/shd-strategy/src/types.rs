use std::collections::BTreeMap;
use std::fmt;

use shd_model::{MarketSnapshot, Order, Symbol};

/// Strategy identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySpec {
    pub name: String,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.trim().is_empty());
        Self { name }
    }
}

/// What a strategy returns for one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategyDecision {
    /// Candidate orders, grouped per instrument. The whole group for an
    /// instrument passes or fails the limit gate as a unit.
    pub orders: BTreeMap<Symbol, Vec<Order>>,
    /// Conversion request (informational; recorded, never settled).
    pub conversions: i64,
    /// New opaque state blob, handed back on the next tick.
    pub state_blob: String,
}

impl StrategyDecision {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: BTreeMap<Symbol, Vec<Order>>, state_blob: String) -> Self {
        Self {
            orders,
            conversions: 0,
            state_blob,
        }
    }
}

/// A failure inside the strategy callback.
///
/// These are fatal for the run: continuing past a failed callback would
/// silently produce an inconsistent ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyError {
    pub message: String,
}

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strategy error: {}", self.message)
    }
}

impl std::error::Error for StrategyError {}

/// The strategy callback contract.
///
/// `snapshot` is the current tick's view with the simulated position vector
/// injected; `state_blob` is whatever the strategy returned last tick (empty
/// string on the first tick). The callback must be deterministic for
/// reproducible replay.
pub trait Strategy: Send + Sync {
    fn spec(&self) -> StrategySpec;

    fn run(
        &mut self,
        snapshot: &MarketSnapshot,
        state_blob: &str,
    ) -> Result<StrategyDecision, StrategyError>;
}
