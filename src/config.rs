//! JSON-file-backed key-value settings.
//!
//! Persists the filter set, the exclude-known toggle, and the saved-wallet
//! shortlist across sessions. Every failure here is non-fatal: a missing or
//! corrupt file behaves like an empty one, and a failed write is reported
//! as `false` and logged, never propagated.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const FILTERS_KEY: &str = "smartfilter_filters";
pub const EXCLUDE_KNOWN_KEY: &str = "smartfilter_exclude_known";
pub const SAVED_WALLETS_KEY: &str = "smartfilter_saved_wallets";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a value by key, falling back to `default` when the key is
    /// absent or the stored value does not deserialize.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.read_map().remove(key) {
            Some(value) => match serde_json::from_value(value) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!("Stored value for '{}' is unreadable, using default: {}", key, err);
                    default
                }
            },
            None => default,
        }
    }

    /// Write a value under a key. Returns false (and logs) when the value
    /// cannot be serialized or the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let serialized = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(err) => {
                warn!("Failed to serialize value for '{}': {}", key, err);
                return false;
            }
        };

        let mut map = self.read_map();
        map.insert(key.to_string(), serialized);
        self.write_map(&map)
    }

    /// Drop a key. Returns false when the file cannot be rewritten.
    pub fn remove(&self, key: &str) -> bool {
        let mut map = self.read_map();
        if map.remove(key).is_none() {
            return true;
        }
        self.write_map(&map)
    }

    fn read_map(&self) -> Map<String, Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            // A missing settings file is the normal first-run state.
            Err(_) => return Map::new(),
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(
                    "Settings file {} does not hold an object, starting empty",
                    self.path.display()
                );
                Map::new()
            }
            Err(err) => {
                warn!(
                    "Settings file {} is unreadable, starting empty: {}",
                    self.path.display(),
                    err
                );
                Map::new()
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> bool {
        let text = match serde_json::to_string_pretty(&Value::Object(map.clone())) {
            Ok(text) => text,
            Err(err) => {
                warn!("Failed to serialize settings: {}", err);
                return false;
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(parent) {
                    warn!("Failed to create settings directory: {}", err);
                    return false;
                }
            }
        }

        match fs::write(&self.path, text) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "Failed to write settings file {}: {}",
                    self.path.display(),
                    err
                );
                false
            }
        }
    }
}
