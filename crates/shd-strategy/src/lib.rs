//! shd-strategy
//!
//! Strategy contract and host adapter.
//! - `Strategy::run(snapshot, state_blob)` is a synchronous, side-effect-pure
//!   callback: (snapshot, prior blob) -> (orders by instrument, conversions,
//!   new blob)
//! - The state blob is an opaque string; only the strategy knows its schema
//! - `StrategyHost` owns the blob between ticks and enforces single-strategy
//!   registration
//! - `StrategyRegistry` catalogues named factories; strategies are
//!   registered implementations, never dynamically loaded files

pub mod builtin;
mod host;
mod registry;
mod types;

pub use host::{StrategyHost, StrategyHostError};
pub use registry::{RegistryError, StrategyFactory, StrategyMeta, StrategyRegistry};
pub use types::{Strategy, StrategyDecision, StrategyError, StrategySpec};
