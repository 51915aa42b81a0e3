//! Engine bound to a state store with flush-on-exit.
//!
//! [`PersistentEngine`] loads counters when opened and writes them back
//! exactly once when closed. If the owner never calls
//! [`close`](PersistentEngine::close), because the host was torn down or a
//! panic is unwinding, the counters are written from `Drop` instead.

use std::ops::{Deref, DerefMut};

use tracing::{debug, error, info, warn};

use crate::engine::{Engine, PeriodSettings};
use crate::error::Result;
use crate::store::{Counters, StateStore};

/// An [`Engine`] that owns the store its counters live in.
#[derive(Debug)]
pub struct PersistentEngine<S: StateStore> {
    engine: Engine,
    store: S,
    closed: bool,
}

impl<S: StateStore> PersistentEngine<S> {
    /// Load counters from `store` and build the engine.
    ///
    /// A store that cannot be read is logged and treated as empty so the
    /// engine always starts.
    pub fn open(store: S, periods: PeriodSettings) -> Self {
        let counters = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load persisted counters, starting from zero");
            Counters::default()
        });
        info!(
            machine_time = counters.machine_time,
            spindle_time = counters.spindle_time,
            running_time = counters.running_time,
            num_periodes_machine = counters.num_periodes_machine,
            num_periodes_spindle = counters.num_periodes_spindle,
            "Counters restored"
        );
        Self {
            engine: Engine::new(counters, periods),
            store,
            closed: false,
        }
    }

    /// Write the current counters without closing.
    ///
    /// Returns the counters that were written.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the write fails.
    pub fn checkpoint(&self) -> Result<Counters> {
        let counters = self.engine.counters();
        self.store.save(&counters)?;
        debug!(?counters, "Counters checkpointed");
        Ok(counters)
    }

    /// Write the counters and release the store.
    ///
    /// The write is attempted once; a failure is returned to the caller and
    /// not retried on drop.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the final write fails.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        let counters = self.engine.counters();
        self.store.save(&counters)?;
        info!(?counters, "Counters saved");
        Ok(())
    }
}

impl<S: StateStore> Deref for PersistentEngine<S> {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl<S: StateStore> DerefMut for PersistentEngine<S> {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}

impl<S: StateStore> Drop for PersistentEngine<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let counters = self.engine.counters();
        match self.store.save(&counters) {
            Ok(()) => info!(?counters, "Counters saved on drop"),
            Err(e) => error!(error = %e, "Failed to save counters on drop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HourmeterError;
    use crate::store::{JsonFileStore, MemoryStore};
    use crate::types::{AlarmId, TimerId};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const PERIODS: PeriodSettings = PeriodSettings {
        machine_minutes: 1,
        spindle_minutes: 2,
    };

    #[derive(Debug, Clone, Default)]
    struct CountingStore {
        saves: Arc<AtomicUsize>,
        fail: bool,
    }

    impl StateStore for CountingStore {
        fn load(&self) -> Result<Counters> {
            Err(HourmeterError::PersistenceError("unreadable".into()))
        }

        fn save(&self, _counters: &Counters) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HourmeterError::PersistenceError("disk full".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_drop_flushes_counters() {
        let store = MemoryStore::new();
        {
            let mut engine = PersistentEngine::open(store.clone(), PERIODS);
            engine.set_gate(TimerId::Running, true);
            engine.tick();
            engine.tick();
        }
        assert_eq!(store.load().unwrap().running_time, 2);
    }

    #[test]
    fn test_close_flushes_once() {
        let store = CountingStore::default();
        let engine = PersistentEngine::open(store.clone(), PERIODS);
        engine.close().unwrap();
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_failure_is_reported_not_retried() {
        let store = CountingStore {
            fail: true,
            ..CountingStore::default()
        };
        let engine = PersistentEngine::open(store.clone(), PERIODS);
        assert!(engine.close().is_err());
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unreadable_store_starts_from_zero() {
        let engine = PersistentEngine::open(CountingStore::default(), PERIODS);
        assert_eq!(engine.counters(), Counters::default());
    }

    #[test]
    fn test_malformed_values_start_from_zero() {
        let store = MemoryStore::with_raw(
            json!({ "machine_time": -3, "spindle_time": 150 })
                .as_object()
                .cloned()
                .unwrap(),
        );
        let engine = PersistentEngine::open(store, PERIODS);
        assert_eq!(engine.elapsed_seconds(TimerId::Machine), 0);
        assert_eq!(engine.elapsed_seconds(TimerId::Spindle), 150);
        assert!(engine.is_alarm_active(AlarmId::Spindle));
    }

    #[test]
    fn test_checkpoint_writes_without_closing() {
        let store = MemoryStore::new();
        let mut engine = PersistentEngine::open(store.clone(), PERIODS);
        engine.set_gate(TimerId::Spindle, true);
        engine.tick();

        let written = engine.checkpoint().unwrap();
        assert_eq!(written.spindle_time, 1);
        assert_eq!(store.load().unwrap(), written);

        engine.tick();
        drop(engine);
        assert_eq!(store.load().unwrap().spindle_time, 2);
    }

    #[test]
    fn test_checkpoint_failure_keeps_engine_open() {
        let store = CountingStore {
            fail: true,
            ..CountingStore::default()
        };
        let engine = PersistentEngine::open(store.clone(), PERIODS);
        assert!(engine.checkpoint().is_err());
        drop(engine);
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bad_timestamp_keeps_counters_across_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            json!({
                "machine_time": 360_000,
                "spindle_time": 7_200,
                "running_time": 99,
                "num_periodes_machine": 4,
                "num_periodes_spindle": 1,
                "saved_at_utc": "yesterday",
            })
            .to_string(),
        )
        .unwrap();

        let engine = PersistentEngine::open(JsonFileStore::new(&path), PERIODS);
        assert_eq!(engine.elapsed_seconds(TimerId::Machine), 360_000);
        drop(engine);

        let reloaded = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(reloaded.machine_time, 360_000);
        assert_eq!(reloaded.num_periodes_machine, 4);
        assert_eq!(reloaded.running_time, 99);
    }

    #[test]
    fn test_undecodable_file_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"machine_time\": 360000,").unwrap();

        let engine = PersistentEngine::open(JsonFileStore::new(&path), PERIODS);
        assert_eq!(engine.counters(), Counters::default());
        drop(engine);

        let store = JsonFileStore::new(&path);
        assert_eq!(store.load().unwrap(), Counters::default());
        assert_eq!(
            std::fs::read_to_string(store.corrupt_path()).unwrap(),
            "{\"machine_time\": 360000,"
        );
    }

    #[test]
    fn test_restart_reproduces_counters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut first = PersistentEngine::open(JsonFileStore::new(&path), PERIODS);
        for timer in TimerId::ALL {
            first.set_gate(timer, true);
        }
        for _ in 0..61 {
            first.tick();
        }
        first.acknowledge(AlarmId::Machine);
        let before = first.counters();
        first.close().unwrap();

        let second = PersistentEngine::open(JsonFileStore::new(&path), PERIODS);
        assert_eq!(second.counters(), before);
        assert_eq!(second.elapsed_periods(AlarmId::Machine), 1);
        assert!(!second.is_alarm_active(AlarmId::Machine));
    }
}
