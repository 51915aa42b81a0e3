//! The clock that drives the engine.

use std::time::Duration;

use hourmeter_core::OutputChange;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

use crate::state::SharedState;

/// Apply one tick to the engine.
///
/// Returns `None` once the engine has been shut down.
pub async fn tick_once(state: &SharedState) -> Option<Vec<OutputChange>> {
    let mut guard = state.write().await;
    let engine = guard.engine.as_mut()?;
    Some(engine.tick())
}

/// Spawn the tick loop. Each interval counts as one second of run time.
///
/// Missed ticks are skipped rather than replayed in a burst.
pub fn spawn(state: SharedState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; start counting one period in.
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(changes) = tick_once(&state).await else {
                warn!("Engine closed, stopping tick loop");
                break;
            };
            for change in changes {
                match change {
                    OutputChange::Elapsed { timer, seconds } => {
                        trace!(timer = %timer, seconds, "Timer advanced");
                    }
                    other => debug!(change = ?other, "Output changed"),
                }
            }
        }
    })
}
