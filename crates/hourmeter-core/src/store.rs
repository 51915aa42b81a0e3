//! Persistent storage for accumulated counters.
//!
//! The engine only needs a narrow key/value surface: five non-negative
//! integers read at startup and written at shutdown. [`StateStore`] is that
//! surface; [`JsonFileStore`] keeps the counters in a small JSON document
//! and [`MemoryStore`] keeps them in process.
//!
//! Malformed values never stop the engine from starting. Each key is
//! validated on its own and falls back to `0` with a warning.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::error::{HourmeterError, Result};

/// Persisted key for the machine timer.
pub const KEY_MACHINE_TIME: &str = "machine_time";
/// Persisted key for the spindle timer.
pub const KEY_SPINDLE_TIME: &str = "spindle_time";
/// Persisted key for the running timer.
pub const KEY_RUNNING_TIME: &str = "running_time";
/// Persisted key for acknowledged machine periods.
pub const KEY_PERIODS_MACHINE: &str = "num_periodes_machine";
/// Persisted key for acknowledged spindle periods.
pub const KEY_PERIODS_SPINDLE: &str = "num_periodes_spindle";

/// Counters that survive a restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Counters {
    /// Seconds the machine has been on.
    pub machine_time: u64,
    /// Seconds the spindle has been turning.
    pub spindle_time: u64,
    /// Seconds a program has been running.
    pub running_time: u64,
    /// Acknowledged machine maintenance periods.
    pub num_periodes_machine: u32,
    /// Acknowledged spindle maintenance periods.
    pub num_periodes_spindle: u32,
}

impl Counters {
    /// Build counters from an untyped key/value map.
    ///
    /// Missing keys default to `0`. Values that are negative, fractional,
    /// non-numeric or out of range are logged and replaced with `0`.
    #[must_use]
    pub fn from_raw(raw: &Map<String, Value>) -> Self {
        Self {
            machine_time: read_u64(raw, KEY_MACHINE_TIME),
            spindle_time: read_u64(raw, KEY_SPINDLE_TIME),
            running_time: read_u64(raw, KEY_RUNNING_TIME),
            num_periodes_machine: read_u32(raw, KEY_PERIODS_MACHINE),
            num_periodes_spindle: read_u32(raw, KEY_PERIODS_SPINDLE),
        }
    }

    /// Flatten into a key/value map using the persisted key names.
    #[must_use]
    pub fn to_raw(&self) -> Map<String, Value> {
        let mut raw = Map::new();
        raw.insert(KEY_MACHINE_TIME.into(), self.machine_time.into());
        raw.insert(KEY_SPINDLE_TIME.into(), self.spindle_time.into());
        raw.insert(KEY_RUNNING_TIME.into(), self.running_time.into());
        raw.insert(KEY_PERIODS_MACHINE.into(), self.num_periodes_machine.into());
        raw.insert(KEY_PERIODS_SPINDLE.into(), self.num_periodes_spindle.into());
        raw
    }
}

fn read_u64(raw: &Map<String, Value>, key: &str) -> u64 {
    match raw.get(key) {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().unwrap_or_else(|| {
            warn!(key, %value, "Rejecting malformed persisted value, using 0");
            0
        }),
    }
}

fn read_u32(raw: &Map<String, Value>, key: &str) -> u32 {
    match raw.get(key) {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or_else(|| {
                warn!(key, %value, "Rejecting malformed persisted value, using 0");
                0
            }),
    }
}

/// Key/value store the counters are loaded from and saved to.
pub trait StateStore {
    /// Load counters. A store that has never been written yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read or decoded.
    fn load(&self) -> Result<Counters>;

    /// Persist counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn save(&self, counters: &Counters) -> Result<()>;
}

impl<T: StateStore + ?Sized> StateStore for Box<T> {
    fn load(&self) -> Result<Counters> {
        (**self).load()
    }

    fn save(&self, counters: &Counters) -> Result<()> {
        (**self).save(counters)
    }
}

/// Metadata key written next to the counters by [`JsonFileStore`].
pub const KEY_SAVED_AT: &str = "saved_at_utc";

/// Counters stored as a JSON document on disk.
///
/// The document is a flat object holding the five counter keys plus a
/// `saved_at_utc` timestamp. A file that cannot be decoded is moved aside
/// to `<name>.corrupt` before the error is returned, so a later save never
/// overwrites the only copy.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by `path`. Nothing is touched until the first
    /// load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Where an undecodable state file is moved to.
    #[must_use]
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn quarantine(&self, reason: &str) {
        let target = self.corrupt_path();
        match std::fs::rename(&self.path, &target) {
            Ok(()) => warn!(
                path = %self.path.display(),
                moved_to = %target.display(),
                reason,
                "State file unreadable, moved aside"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                error = %e,
                "Failed to move unreadable state file aside"
            ),
        }
    }
}

fn log_saved_at(path: &Path, raw: &Map<String, Value>) {
    match raw.get(KEY_SAVED_AT) {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) if text.parse::<DateTime<Utc>>().is_ok() => {
            debug!(path = %path.display(), saved_at = %text, "Loaded state file");
        }
        Some(value) => {
            warn!(path = %path.display(), %value, "Ignoring malformed saved_at_utc");
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Counters> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet, starting from zero");
            return Ok(Counters::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            HourmeterError::PersistenceError(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))
        })?;
        let raw = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(raw)) => raw,
            Ok(other) => {
                self.quarantine("not a JSON object");
                return Err(HourmeterError::PersistenceError(format!(
                    "{} holds {other} instead of an object",
                    self.path.display()
                )));
            }
            Err(e) => {
                self.quarantine("not valid JSON");
                return Err(e.into());
            }
        };
        log_saved_at(&self.path, &raw);
        Ok(Counters::from_raw(&raw))
    }

    fn save(&self, counters: &Counters) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HourmeterError::PersistenceError(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        let mut raw = counters.to_raw();
        raw.insert(KEY_SAVED_AT.into(), Utc::now().to_rfc3339().into());
        let content = serde_json::to_string_pretty(&raw)?;
        let temp = self.temp_path();
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            HourmeterError::PersistenceError(format!(
                "Failed to write {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

/// In-process store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Arc<Mutex<Map<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with raw values, which may be malformed.
    #[must_use]
    pub fn with_raw(raw: Map<String, Value>) -> Self {
        Self {
            raw: Arc::new(Mutex::new(raw)),
        }
    }

    /// Copy of the raw stored values.
    #[must_use]
    pub fn raw(&self) -> Map<String, Value> {
        self.raw.lock().map(|raw| raw.clone()).unwrap_or_default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Counters> {
        let raw = self
            .raw
            .lock()
            .map_err(|_| HourmeterError::PersistenceError("memory store poisoned".into()))?;
        Ok(Counters::from_raw(&raw))
    }

    fn save(&self, counters: &Counters) -> Result<()> {
        let mut raw = self
            .raw
            .lock()
            .map_err(|_| HourmeterError::PersistenceError("memory store poisoned".into()))?;
        *raw = counters.to_raw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn sample() -> Counters {
        Counters {
            machine_time: 7_265,
            spindle_time: 3_600,
            running_time: 1_800,
            num_periodes_machine: 2,
            num_periodes_spindle: 1,
        }
    }

    #[test]
    fn test_missing_keys_default_to_zero() {
        let counters = Counters::from_raw(&raw(json!({ "machine_time": 12 })));
        assert_eq!(
            counters,
            Counters {
                machine_time: 12,
                ..Counters::default()
            }
        );
    }

    #[test]
    fn test_malformed_values_fall_back_per_key() {
        let counters = Counters::from_raw(&raw(json!({
            "machine_time": -5,
            "spindle_time": 12.5,
            "running_time": "forty",
            "num_periodes_machine": 4_294_967_296_u64,
            "num_periodes_spindle": 3,
        })));
        assert_eq!(counters.machine_time, 0);
        assert_eq!(counters.spindle_time, 0);
        assert_eq!(counters.running_time, 0);
        assert_eq!(counters.num_periodes_machine, 0);
        assert_eq!(counters.num_periodes_spindle, 3);
    }

    #[test]
    fn test_raw_uses_persisted_key_names() {
        let map = sample().to_raw();
        assert_eq!(map.get("num_periodes_spindle"), Some(&json!(1)));
        assert_eq!(Counters::from_raw(&map), sample());
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), Counters::default());
    }

    #[test]
    fn test_file_store_persists_counters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = JsonFileStore::new(&path);
        store.save(&sample()).unwrap();

        assert!(path.exists());
        assert!(!store.temp_path().exists());
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), sample());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"machine_time\": 7265"));
        assert!(content.contains("saved_at_utc"));
    }

    #[test]
    fn test_file_store_moves_garbage_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "machine_time = 12").unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.load().unwrap_err();
        assert!(matches!(err, HourmeterError::StateEncoding(_)));
        assert!(!path.exists());
        assert_eq!(
            std::fs::read_to_string(store.corrupt_path()).unwrap(),
            "machine_time = 12"
        );
    }

    #[test]
    fn test_file_store_moves_non_object_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[360000, 7200]").unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.load().unwrap_err();
        assert!(matches!(err, HourmeterError::PersistenceError(_)));
        assert!(store.corrupt_path().exists());
    }

    #[test]
    fn test_file_store_ignores_bad_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"machine_time": 360000, "spindle_time": 7200, "running_time": 99,
                "num_periodes_machine": 4, "num_periodes_spindle": 1,
                "saved_at_utc": "yesterday"}"#,
        )
        .unwrap();

        let counters = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(
            counters,
            Counters {
                machine_time: 360_000,
                spindle_time: 7_200,
                running_time: 99,
                num_periodes_machine: 4,
                num_periodes_spindle: 1,
            }
        );
    }

    #[test]
    fn test_file_store_sanitizes_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"machine_time": -1, "running_time": 99}"#).unwrap();
        let counters = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(counters.machine_time, 0);
        assert_eq!(counters.running_time, 99);
    }

    #[test]
    fn test_memory_store_clones_share_contents() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(&sample()).unwrap();
        assert_eq!(handle.load().unwrap(), sample());
        assert_eq!(handle.raw().get("running_time"), Some(&json!(1800)));
    }
}
