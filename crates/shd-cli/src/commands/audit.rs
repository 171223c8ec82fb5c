//! `shd audit verify`: check a run log's hash chain.

use std::path::Path;

use anyhow::Result;

use shd_audit::{verify_hash_chain, VerifyResult};

pub fn verify(path: &Path) -> Result<()> {
    match verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("chain_valid=true lines={}", lines);
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("chain_valid=false line={} reason={}", line, reason);
            anyhow::bail!("hash chain broken at line {}", line)
        }
    }
}
