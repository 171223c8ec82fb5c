//! shd-audit
//!
//! Audit trail for replay runs.
//! - `AuditRecorder`: append-only, replay-ordered per-(tick, instrument)
//!   activity rows plus the full synthetic trade list
//! - CSV export matching the original activity-log / trade-history shapes
//! - JSONL run log with an optional SHA-256 hash chain for tamper-evident
//!   run artifacts

mod export;
mod recorder;
mod runlog;

pub use export::{
    activity_csv_string, trades_csv_string, write_activity_csv, write_trades_csv,
};
pub use recorder::{ActivityRow, AuditRecorder, DEFAULT_DEPTH};
pub use runlog::{verify_hash_chain, verify_hash_chain_str, RunEvent, RunLogWriter, VerifyResult};
