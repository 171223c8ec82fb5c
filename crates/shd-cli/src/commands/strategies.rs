//! `shd strategies`: list the registered strategies.

use anyhow::Result;

use shd_strategy::StrategyRegistry;

pub fn execute() -> Result<()> {
    let registry = StrategyRegistry::with_builtins();
    for meta in registry.list() {
        println!(
            "name={} version={} description={}",
            meta.name, meta.version, meta.description
        );
    }
    Ok(())
}
