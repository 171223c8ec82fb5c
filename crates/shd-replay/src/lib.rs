//! shd-replay
//!
//! The replay orchestrator: walks recorded snapshots in order and, per tick,
//! runs Observe -> Decide -> Settle:
//! - hand the strategy a snapshot view carrying the simulated positions
//! - validate orders, gate each instrument's batch against its limit
//! - match accepted orders against recorded liquidity and settle fills
//! - mark the ledger and append the tick to the audit recorder
//!
//! Single-threaded and strictly sequential; two runs over the same snapshots
//! with the same strategy and config produce identical histories.

mod config;
mod engine;

pub use config::ReplayConfig;
pub use engine::{ReplayEngine, ReplayError, ReplayReport};
