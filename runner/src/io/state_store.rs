//! Read-only view of the environment's authoritative state.
//!
//! The engine never caches what it reads here: every eligibility and
//! completion check goes back to the store.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::step_state::parse_step;
use crate::error::QuestError;

/// Key/value source of progress markers and counters.
pub trait StateStore {
    /// Current raw value of `key`, if the environment knows it.
    fn property(&self, key: &str) -> Option<String>;
}

/// Read and interpret a quest progress marker.
///
/// A missing key is a format error, not "unstarted".
pub fn read_step<S: StateStore + ?Sized>(store: &S, key: &str) -> Result<i32, QuestError> {
    let raw = store.property(key).ok_or_else(|| QuestError::StateFormat {
        key: key.to_string(),
        raw: String::new(),
    })?;
    parse_step(&raw).map_err(|err| err.for_key(key))
}

/// Read a numeric counter.
pub fn read_number<S: StateStore + ?Sized>(store: &S, key: &str) -> Result<i64, QuestError> {
    let raw = store.property(key).unwrap_or_default();
    raw.trim().parse::<i64>().map_err(|_| QuestError::StateFormat {
        key: key.to_string(),
        raw,
    })
}

/// In-memory store. Doubles as a state snapshot loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Parse a flat TOML table of scalars (`questL05Goblin = "step1"`, `ascensions = 12`).
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents).context("parse state snapshot")?;
        let mut store = Self::new();
        for (key, value) in table {
            let raw = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(n) => n.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(anyhow!(
                        "state key '{key}' must be a string, integer or boolean (found {})",
                        other.type_str()
                    ));
                }
            };
            store.values.insert(key, raw);
        }
        Ok(store)
    }
}

impl StateStore for MemoryStore {
    fn property(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Load a state snapshot from disk.
pub fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    debug!(path = %path.display(), "loading state snapshot");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    MemoryStore::from_toml_str(&contents).with_context(|| format!("load {}", path.display()))
}
