//! Registry of available strategies.
//!
//! The original system loaded strategy modules from arbitrary file paths at
//! runtime and called a conventionally-named method. Here strategies are
//! compiled implementations registered under a name; the runner enumerates
//! them, instantiates by name, and hands the instance to `StrategyHost`.
//!
//! Each `instantiate` call produces a fresh instance; strategies carry
//! mutable state that must not leak across runs.

use std::fmt;

use crate::Strategy;

/// Factory closure producing a fresh strategy instance. `Send + Sync` so a
/// registry can be shared across threads.
pub type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

/// Static metadata for a registered strategy, queryable without
/// instantiating it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyMeta {
    /// Unique registry key.
    pub name: String,
    pub version: String,
    pub description: String,
}

impl StrategyMeta {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
        }
    }
}

/// Errors returned by registry operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateName { name: String },
    UnknownStrategy { name: String },
    EmptyName,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "duplicate strategy name '{name}'"),
            Self::UnknownStrategy { name } => write!(f, "unknown strategy '{name}'"),
            Self::EmptyName => write!(f, "strategy name must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Catalogue of named strategy factories. Entries keep registration order so
/// `list()` output is deterministic.
pub struct StrategyRegistry {
    entries: Vec<(StrategyMeta, StrategyFactory)>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registry pre-loaded with the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        crate::builtin::register_builtins(&mut reg);
        reg
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(meta, _)| meta.name == name)
    }

    pub fn register<F>(&mut self, meta: StrategyMeta, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        if meta.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        match self.index_of(&meta.name) {
            Some(_) => Err(RegistryError::DuplicateName { name: meta.name }),
            None => {
                self.entries.push((meta, Box::new(factory)));
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata for every registered strategy, in registration order.
    pub fn list(&self) -> Vec<&StrategyMeta> {
        self.entries.iter().map(|(meta, _)| meta).collect()
    }

    /// Instantiate a fresh strategy by name.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Strategy>, RegistryError> {
        match self.index_of(name) {
            Some(i) => Ok((self.entries[i].1)()),
            None => Err(RegistryError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
