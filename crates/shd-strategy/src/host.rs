use std::fmt;

use shd_model::MarketSnapshot;

use crate::{Strategy, StrategyDecision, StrategyError, StrategySpec};

/// Host-level policy errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyHostError {
    MultiStrategyNotAllowed,
    NoStrategyRegistered,
    /// Forwarded callback failure.
    Strategy(StrategyError),
}

impl fmt::Display for StrategyHostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiStrategyNotAllowed => {
                write!(f, "a strategy is already registered on this host")
            }
            Self::NoStrategyRegistered => write!(f, "no strategy registered"),
            Self::Strategy(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StrategyHostError {}

/// StrategyHost enforces:
/// - exactly one strategy per run
/// - the opaque state blob is threaded between ticks (never interpreted)
pub struct StrategyHost {
    strategy: Option<Box<dyn Strategy>>,
    spec: Option<StrategySpec>,
    state_blob: String,
}

impl StrategyHost {
    pub fn new() -> Self {
        Self {
            strategy: None,
            spec: None,
            state_blob: String::new(),
        }
    }

    /// Register a strategy. Only one per host.
    pub fn register(&mut self, s: Box<dyn Strategy>) -> Result<(), StrategyHostError> {
        if self.strategy.is_some() {
            return Err(StrategyHostError::MultiStrategyNotAllowed);
        }
        let spec = s.spec();
        self.spec = Some(spec);
        self.strategy = Some(s);
        Ok(())
    }

    pub fn spec(&self) -> Result<StrategySpec, StrategyHostError> {
        self.spec
            .clone()
            .ok_or(StrategyHostError::NoStrategyRegistered)
    }

    /// The blob that will be handed to the strategy on the next tick.
    pub fn state_blob(&self) -> &str {
        &self.state_blob
    }

    /// Run one tick evaluation, carrying the state blob across the call.
    pub fn on_tick(
        &mut self,
        view: &MarketSnapshot,
    ) -> Result<StrategyDecision, StrategyHostError> {
        let s = self
            .strategy
            .as_mut()
            .ok_or(StrategyHostError::NoStrategyRegistered)?;

        let decision = s
            .run(view, &self.state_blob)
            .map_err(StrategyHostError::Strategy)?;

        self.state_blob = decision.state_blob.clone();
        Ok(decision)
    }
}

impl Default for StrategyHost {
    fn default() -> Self {
        Self::new()
    }
}
