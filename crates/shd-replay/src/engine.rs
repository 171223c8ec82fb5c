use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use shd_audit::AuditRecorder;
use shd_ledger::{check_batch, validate_order, GateDecision, Ledger};
use shd_match::match_order;
use shd_model::{MarketSnapshot, Order, Symbol, Trade};
use shd_strategy::{StrategyHost, StrategyHostError};

use crate::ReplayConfig;

/// Fatal replay failures. Non-fatal conditions (invalid orders, gate
/// rejections) are counted and logged, never returned.
#[derive(Debug)]
pub enum ReplayError {
    MalformedSnapshot {
        tick_index: usize,
        timestamp: i64,
        reason: String,
    },
    Strategy {
        tick_index: usize,
        source: StrategyHostError,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSnapshot {
                tick_index,
                timestamp,
                reason,
            } => write!(
                f,
                "malformed snapshot at tick {} (timestamp {}): {}",
                tick_index, timestamp, reason
            ),
            Self::Strategy { tick_index, source } => {
                write!(f, "strategy failed at tick {}: {}", tick_index, source)
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Strategy { source, .. } => Some(source),
            Self::MalformedSnapshot { .. } => None,
        }
    }
}

/// End-of-run summary: final PnL with per-instrument breakdown, plus the
/// non-fatal incident counters.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayReport {
    pub ticks: usize,
    pub last_timestamp: Option<i64>,
    pub aggregate_pnl: f64,
    pub pnl_by_instrument: BTreeMap<Symbol, f64>,
    pub positions: BTreeMap<Symbol, i64>,
    pub aggregate_cash: i64,
    pub rejected_batches: u64,
    pub invalid_orders: u64,
    pub conversion_requests: u64,
}

/// One replay run: owns the strategy host, ledger, and audit recorder.
pub struct ReplayEngine {
    config: ReplayConfig,
    host: StrategyHost,
    ledger: Ledger,
    recorder: AuditRecorder,
    /// Previous tick's fills, shown to the strategy as its own trades.
    last_fills: BTreeMap<Symbol, Vec<Trade>>,
    ticks: usize,
    last_timestamp: Option<i64>,
    rejected_batches: u64,
    invalid_orders: u64,
    conversion_requests: u64,
}

impl ReplayEngine {
    /// The host must already carry its strategy; registration errors belong
    /// to the caller.
    pub fn new(config: ReplayConfig, host: StrategyHost) -> Self {
        let recorder = AuditRecorder::new(config.audit_depth);
        Self {
            config,
            host,
            ledger: Ledger::new(),
            recorder,
            last_fills: BTreeMap::new(),
            ticks: 0,
            last_timestamp: None,
            rejected_batches: 0,
            invalid_orders: 0,
            conversion_requests: 0,
        }
    }

    /// Replay the snapshots in order. Returns the end-of-run report, or the
    /// first fatal error; partial state stays readable via `report()` and
    /// `audit()` after an abort.
    pub fn run(&mut self, snapshots: &[MarketSnapshot]) -> Result<ReplayReport, ReplayError> {
        let cutoff = self.config.max_ticks.unwrap_or(snapshots.len());

        for (i, snapshot) in snapshots.iter().take(cutoff).enumerate() {
            self.validate_snapshot(i, snapshot)?;
            self.step(i, snapshot, snapshots.get(i + 1))?;
        }

        Ok(self.report())
    }

    fn step(
        &mut self,
        tick_index: usize,
        snapshot: &MarketSnapshot,
        next: Option<&MarketSnapshot>,
    ) -> Result<(), ReplayError> {
        let view = self.strategy_view(snapshot);

        let decision = self
            .host
            .on_tick(&view)
            .map_err(|source| ReplayError::Strategy { tick_index, source })?;

        if decision.conversions != 0 {
            // recorded for the audit trail; conversions are never settled
            self.conversion_requests += 1;
            debug!(tick = tick_index, conversions = decision.conversions, "conversion request");
        }

        let lookahead = if self.config.lookahead { next } else { None };

        let mut tick_trades: Vec<Trade> = Vec::new();
        for (symbol, orders) in &decision.orders {
            let accepted = self.gate_batch(tick_index, symbol, orders);
            for order in accepted {
                let fills = match_order(&order, snapshot, lookahead);
                self.ledger.settle(&fills);
                tick_trades.extend(fills);
            }
        }

        self.ledger.mark(snapshot);
        self.recorder.record(
            tick_index as u64,
            snapshot,
            self.ledger.aggregate_pnl(),
            &tick_trades,
        );

        self.last_fills.clear();
        for t in &tick_trades {
            self.last_fills
                .entry(t.symbol.clone())
                .or_default()
                .push(t.clone());
        }

        self.ticks = tick_index + 1;
        self.last_timestamp = Some(snapshot.timestamp);

        debug!(
            tick = tick_index,
            timestamp = snapshot.timestamp,
            fills = tick_trades.len(),
            pnl = self.ledger.aggregate_pnl(),
            "tick settled"
        );
        Ok(())
    }

    /// Drop invalid orders as no-ops, then apply the all-or-nothing limit
    /// gate to what remains. Returns the orders cleared to match.
    fn gate_batch(&mut self, tick_index: usize, symbol: &Symbol, orders: &[Order]) -> Vec<Order> {
        let mut valid: Vec<Order> = Vec::with_capacity(orders.len());
        for order in orders {
            if let Err(e) = validate_order(order) {
                self.invalid_orders += 1;
                warn!(tick = tick_index, "dropped order: {e}");
                continue;
            }
            if order.symbol != *symbol {
                self.invalid_orders += 1;
                warn!(
                    tick = tick_index,
                    batch = %symbol,
                    order = %order,
                    "dropped order: batch instrument mismatch"
                );
                continue;
            }
            valid.push(order.clone());
        }
        if valid.is_empty() {
            return valid;
        }

        let limit = self.config.limits.get(symbol).copied().unwrap_or(0);
        let current = self.ledger.position(symbol);
        match check_batch(symbol, limit, current, &valid) {
            GateDecision::Accept => valid,
            GateDecision::RejectBatch(breach) => {
                self.rejected_batches += 1;
                warn!(tick = tick_index, "batch rejected: {breach}");
                Vec::new()
            }
        }
    }

    /// The strategy sees the feed snapshot with the simulated positions and
    /// the previous tick's fills in place of whatever the feed recorded.
    fn strategy_view(&self, snapshot: &MarketSnapshot) -> MarketSnapshot {
        let mut view = snapshot.clone();
        view.position = self.ledger.positions().clone();
        for symbol in snapshot.order_depths.keys() {
            view.position.entry(symbol.clone()).or_insert(0);
        }
        view.own_trades = self.last_fills.clone();
        view
    }

    fn validate_snapshot(
        &self,
        tick_index: usize,
        snapshot: &MarketSnapshot,
    ) -> Result<(), ReplayError> {
        let malformed = |reason: String| ReplayError::MalformedSnapshot {
            tick_index,
            timestamp: snapshot.timestamp,
            reason,
        };

        if let Some(prev) = self.last_timestamp {
            if snapshot.timestamp <= prev {
                return Err(malformed(format!(
                    "timestamp must increase (previous {prev})"
                )));
            }
        }

        for (symbol, depth) in &snapshot.order_depths {
            for (price, qty) in depth.buy_orders.iter().chain(depth.sell_orders.iter()) {
                if *qty <= 0 {
                    return Err(malformed(format!(
                        "non-positive quantity {qty} at price {price} for {symbol}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Snapshot of the run so far (valid mid-run and after an abort).
    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            ticks: self.ticks,
            last_timestamp: self.last_timestamp,
            aggregate_pnl: self.ledger.aggregate_pnl(),
            pnl_by_instrument: self.ledger.pnl_by_instrument(),
            positions: self.ledger.positions().clone(),
            aggregate_cash: self.ledger.aggregate_cash(),
            rejected_batches: self.rejected_batches,
            invalid_orders: self.invalid_orders,
            conversion_requests: self.conversion_requests,
        }
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.recorder
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}
