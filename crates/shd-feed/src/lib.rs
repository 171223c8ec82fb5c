//! shd-feed
//!
//! Snapshot loaders (deterministic).
//!
//! Two input shapes, one output: a timestamp-sorted `Vec<MarketSnapshot>`.
//! - JSON: an array of recorded tick objects (string-keyed depth maps,
//!   negative-encoded ask quantities)
//! - CSV: semicolon-delimited prices + trades tables, grouped by timestamp
//!
//! Structural violations are fatal `FeedError`s; an absent book side is
//! ordinary data, not an error.

pub mod csv;
pub mod json;

pub use csv::{load_csv_feed, parse_csv_feed};
pub use json::{load_json_feed, parse_json_feed};

/// Loader errors are small, explicit, and test-friendly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    EmptyInput,
    MissingHeader(&'static str),
    ParseInt { column: String, value: String },
    BadRow { line: usize, reason: String },
    /// Snapshot timestamps must be strictly increasing after grouping.
    NonMonotonicTimestamp { prev: i64, next: i64 },
    BadDepthKey { symbol: String, key: String },
    Json(String),
    Io(String),
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Json(e.to_string())
    }
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::EmptyInput => write!(f, "empty input"),
            FeedError::MissingHeader(h) => write!(f, "missing header: {}", h),
            FeedError::ParseInt { column, value } => {
                write!(f, "failed to parse int in column {}: {}", column, value)
            }
            FeedError::BadRow { line, reason } => {
                write!(f, "bad row at line {}: {}", line, reason)
            }
            FeedError::NonMonotonicTimestamp { prev, next } => {
                write!(f, "non-monotonic timestamps: {} then {}", prev, next)
            }
            FeedError::BadDepthKey { symbol, key } => {
                write!(f, "bad depth price key for {}: {:?}", symbol, key)
            }
            FeedError::Json(e) => write!(f, "json error: {}", e),
            FeedError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for FeedError {}

/// Snapshots must arrive strictly increasing in time.
pub(crate) fn check_monotonic(
    snapshots: &[shd_model::MarketSnapshot],
) -> Result<(), FeedError> {
    for pair in snapshots.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(FeedError::NonMonotonicTimestamp {
                prev: pair[0].timestamp,
                next: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
