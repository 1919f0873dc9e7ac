//! Persistent settings store
//!
//! Simple durable key-value state shared across stages: running score,
//! accumulated total score and the power-up cycle index. No transactions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigError;

/// Key-value store injected into the simulation at construction
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);

    /// Read an unsigned integer, falling back to `default` when absent or mistyped
    fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            Some(value) => value.as_u64().unwrap_or_else(|| {
                log::warn!("Settings key {key} holds {value}, expected integer");
                default
            }),
            None => default,
        }
    }

    fn set_u64(&mut self, key: &str, value: u64) {
        self.set(key, Value::from(value));
    }

    /// Persist pending writes. Volatile stores have nothing to do.
    fn flush(&mut self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// In-memory store (tests, headless runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Store persisted as a single JSON object on disk
///
/// Writes are buffered until [`SettingsStore::flush`].
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: serde_json::Map<String, Value>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open a store, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, starting fresh", path.display());
                serde_json::Map::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    /// Write pending changes to disk
    fn flush(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)?;
        self.dirty = false;
        log::info!("Settings saved to {}", self.path.display());
        Ok(())
    }
}
