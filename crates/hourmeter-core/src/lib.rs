//! # hourmeter-core
//!
//! Core logic for the hourmeter machine-time tracker.
//!
//! This crate provides:
//! - Gated elapsed-second accumulation for the machine, spindle and running timers
//! - Maintenance-period alarms with edge-triggered acknowledgment
//! - Persistence of accumulated counters across restarts
//! - Configuration loading and validation
//!
//! ## Architecture
//!
//! - [`accumulator`] - Gated seconds counters
//! - [`alarm`] - Period boundary arithmetic, alarm state machine, edge detection
//! - [`engine`] - The engine owning all timers; ticks, inputs and acknowledgments
//! - [`persistent`] - Engine bound to a store, flushed on close or drop
//! - [`store`] - Counter persistence (`StateStore`, JSON file, in-memory)
//! - [`format`] - `H:MM:SS` labels
//! - [`config`] - Layered configuration
//! - [`error`] - Unified error types for the crate
//! - [`types`] - Timer and alarm identities

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod accumulator;
pub mod alarm;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod persistent;
pub mod store;
pub mod types;

// Re-export primary types for convenience
pub use accumulator::Accumulator;
pub use alarm::{AckOutcome, AlarmState, AlarmTransition, EdgeDetector, PeriodAlarm};
pub use config::{
    config_path, default_config_path, default_log_dir, default_state_path, EngineConfig,
    HourmeterConfig, LogRotation, LoggingConfig, ServerConfig, StorageConfig,
};
pub use engine::{
    AlarmSnapshot, Engine, EngineSnapshot, OutputChange, PeriodSettings, TimerSnapshot,
};
pub use error::{Error, HourmeterError, Result};
pub use format::format_elapsed;
pub use persistent::PersistentEngine;
pub use store::{Counters, JsonFileStore, MemoryStore, StateStore};
pub use types::{AlarmId, TimerId};
