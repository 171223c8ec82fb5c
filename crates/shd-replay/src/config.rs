use shd_audit::DEFAULT_DEPTH;
use shd_ledger::PositionLimits;

/// Replay run configuration.
///
/// Limits are per-instrument and symmetric; an instrument absent from the
/// map has limit 0 and the gate rejects any nonempty batch for it.
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub limits: PositionLimits,
    /// Extend unfilled remainder into the next tick's recorded trades.
    pub lookahead: bool,
    /// Book levels per side captured in the activity log.
    pub audit_depth: usize,
    /// Stop after this many ticks (all ticks when `None`).
    pub max_ticks: Option<usize>,
}

impl ReplayConfig {
    pub fn new(limits: PositionLimits) -> Self {
        Self {
            limits,
            lookahead: false,
            audit_depth: DEFAULT_DEPTH,
            max_ticks: None,
        }
    }

    pub fn with_lookahead(mut self, lookahead: bool) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<usize>) -> Self {
        self.max_ticks = max_ticks;
        self
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self::new(PositionLimits::new())
    }
}
