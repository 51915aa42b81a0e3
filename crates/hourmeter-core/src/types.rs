//! Timer identities shared across the engine and its adapters.
//!
//! Signal names coming from the outside world are resolved to these enums
//! once, at the adapter boundary, via [`FromStr`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::HourmeterError;

/// One of the three accumulating timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimerId {
    /// Accumulates while the machine is switched on.
    Machine,
    /// Accumulates while the spindle turns.
    Spindle,
    /// Accumulates while a program is running.
    Running,
}

impl TimerId {
    /// All timers, in display order.
    pub const ALL: [Self; 3] = [Self::Machine, Self::Spindle, Self::Running];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Spindle => "spindle",
            Self::Running => "running",
        }
    }

    /// The alarm channel attached to this timer, if any.
    #[must_use]
    pub const fn alarm(self) -> Option<AlarmId> {
        match self {
            Self::Machine => Some(AlarmId::Machine),
            Self::Spindle => Some(AlarmId::Spindle),
            Self::Running => None,
        }
    }
}

/// A timer that carries a maintenance period and alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlarmId {
    /// Machine maintenance alarm.
    Machine,
    /// Spindle maintenance alarm.
    Spindle,
}

impl AlarmId {
    /// Both alarm channels.
    pub const ALL: [Self; 2] = [Self::Machine, Self::Spindle];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Machine => "machine",
            Self::Spindle => "spindle",
        }
    }
}

impl From<AlarmId> for TimerId {
    fn from(id: AlarmId) -> Self {
        match id {
            AlarmId::Machine => Self::Machine,
            AlarmId::Spindle => Self::Spindle,
        }
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerId {
    type Err = HourmeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "machine" | "machine_on" => Ok(Self::Machine),
            "spindle" | "spindle_on" => Ok(Self::Spindle),
            "running" => Ok(Self::Running),
            _ => Err(HourmeterError::UnknownTimer(s.to_string())),
        }
    }
}

impl FromStr for AlarmId {
    type Err = HourmeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "machine" | "reset_alarm_machine" => Ok(Self::Machine),
            "spindle" | "reset_alarm_spindle" => Ok(Self::Spindle),
            _ => Err(HourmeterError::UnknownAlarm(s.to_string())),
        }
    }
}
