//! Hash-chained run log.
//!
//! One JSON object per line, appended as the replay progresses. With the
//! chain enabled every event records the previous event's hash and its own,
//! so any edit to an already-written line is detectable afterwards.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// One line of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub event_id: Uuid,
    pub run_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Append-only writer. Keeps the file open for the lifetime of the run and
/// carries the chain tip plus a sequence counter for event-id derivation.
pub struct RunLogWriter {
    file: File,
    hash_chain: bool,
    last_hash: Option<String>,
    seq: u64,
}

impl RunLogWriter {
    /// Opens (or creates) the log at `path`, creating parent directories.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create_dir_all {:?}", dir))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open run log {:?}", path))?;

        Ok(Self {
            file,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    /// Number of events appended so far.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event and return it as written.
    pub fn append(&mut self, run_id: Uuid, event_type: &str, payload: Value) -> Result<RunEvent> {
        // No RNG anywhere in here: the id is a function of the chain tip,
        // the sequence number and the payload.
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq)?;
        self.seq += 1;

        let mut ev = RunEvent {
            event_id,
            run_id,
            ts_utc: Utc::now(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            ev.hash_prev = self.last_hash.take();
            let tip = compute_event_hash(&ev)?;
            ev.hash_self = Some(tip.clone());
            self.last_hash = Some(tip);
        }

        let mut line = canonical_json(&ev)?;
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .context("append run log line")?;

        Ok(ev)
    }
}

/// Deterministic event id: uuid v5 over SHA-256(chain tip, seq, payload).
/// Replaying the same feed with the same strategy reproduces the ids line
/// for line.
fn derive_event_id(last_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let mut hasher = Sha256::new();
    hasher.update(last_hash.unwrap_or("").as_bytes());
    hasher.update(seq.to_be_bytes());
    hasher.update(canonical_json(payload)?.as_bytes());
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &hasher.finalize()))
}

/// Compact JSON with object keys sorted at every level. Hashes and ids are
/// computed over this form so they do not depend on serializer key order.
fn canonical_json<T: Serialize>(v: &T) -> Result<String> {
    let value = serde_json::to_value(v).context("serialize run event")?;
    serde_json::to_string(&sorted(value)).context("stringify run event")
}

fn sorted(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, inner)| (k, sorted(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// Hash of the event's canonical JSON with `hash_self` blanked out.
pub fn compute_event_hash(ev: &RunEvent) -> Result<String> {
    let mut unsealed = ev.clone();
    unsealed.hash_self = None;
    let canonical = canonical_json(&unsealed)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Check the chain in a run log file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read run log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Check the chain in JSONL content already in memory.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut tip: Option<String> = None;
    let mut lines = 0usize;

    for (idx, raw) in content.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let line = idx + 1;
        let ev: RunEvent = serde_json::from_str(raw)
            .with_context(|| format!("parse run event at line {line}"))?;
        lines += 1;

        if let Some(reason) = chain_fault(&tip, &ev)? {
            return Ok(VerifyResult::Broken { line, reason });
        }
        tip = ev.hash_self;
    }

    Ok(VerifyResult::Valid { lines })
}

/// Returns why `ev` does not extend the chain at `tip`, or `None` if it does.
fn chain_fault(tip: &Option<String>, ev: &RunEvent) -> Result<Option<String>> {
    if ev.hash_prev != *tip {
        return Ok(Some(format!(
            "hash_prev mismatch: expected {:?}, got {:?}",
            tip, ev.hash_prev
        )));
    }
    if let Some(claimed) = &ev.hash_self {
        let recomputed = compute_event_hash(ev)?;
        if *claimed != recomputed {
            return Ok(Some(format!(
                "hash_self mismatch: claimed {claimed}, recomputed {recomputed}"
            )));
        }
    }
    Ok(None)
}

/// Outcome of a chain check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    /// First line that fails, 1-based.
    Broken { line: usize, reason: String },
}
