//! Application state shared across handlers and the tick task.
//!
//! Every event takes the write lock for its whole duration, so ticks,
//! input updates and acknowledgments are applied one at a time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hourmeter_core::{HourmeterConfig, PersistentEngine, StateStore};
use tokio::sync::RwLock;
use tracing::{error, info};

#[cfg(test)]
use hourmeter_core::{Counters, HourmeterError};

/// Store type held by the server; boxed so tests can swap in memory stores.
pub type DynStore = Box<dyn StateStore + Send + Sync>;

/// Engine type held by the server.
pub type ServerEngine = PersistentEngine<DynStore>;

/// Shared state handle.
pub type SharedState = Arc<RwLock<AppState>>;

/// Application state.
pub struct AppState {
    /// Loaded configuration.
    pub config: HourmeterConfig,
    /// The engine; `None` once shutdown has flushed it.
    pub engine: Option<ServerEngine>,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Open the engine on `store` with the configured initial periods.
    pub fn new(config: HourmeterConfig, store: DynStore) -> Self {
        let engine = PersistentEngine::open(store, config.engine.periods());
        Self {
            config,
            engine: Some(engine),
            started_at: Utc::now(),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        u64::try_from((Utc::now() - self.started_at).num_seconds()).unwrap_or(0)
    }
}

/// Release the engine and write its counters once.
///
/// Returns `true` if the write succeeded. A failed write is logged and not
/// retried; later calls find no engine and return `false`.
pub async fn flush(state: &SharedState) -> bool {
    let Some(engine) = state.write().await.engine.take() else {
        return false;
    };
    match engine.close() {
        Ok(()) => {
            info!("State flushed");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to flush state on shutdown");
            false
        }
    }
}

/// Store whose writes always fail.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStore {
    pub saves: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl StateStore for FailingStore {
    fn load(&self) -> hourmeter_core::Result<Counters> {
        Ok(Counters::default())
    }

    fn save(&self, _counters: &Counters) -> hourmeter_core::Result<()> {
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Err(HourmeterError::PersistenceError("disk full".into()))
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> SharedState {
    use hourmeter_core::MemoryStore;

    let mut config = HourmeterConfig::default();
    config.engine.machine_period_minutes = 1;
    config.engine.spindle_period_minutes = 1;
    AppState::new(config, Box::new(MemoryStore::new())).into_shared()
}
