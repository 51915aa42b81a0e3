//! Maintenance-period alarms.
//!
//! # State Machine
//!
//! ```text
//!                 elapsed > boundary
//!  Accumulating ──────────────────────► Alarmed
//!       ▲                                  │
//!       └────────── acknowledge() ─────────┘
//! ```
//!
//! The boundary is `period_minutes * 60 * (elapsed_periods + 1)` seconds.
//! Each acknowledgment while alarmed bumps `elapsed_periods`, pushing the
//! boundary out by one period. Acknowledging while accumulating does
//! nothing, so periods cannot be banked ahead of time.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed conversion between the configured unit and the counting unit.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Alarm state of a single alarm-bearing timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    /// Below the current period boundary.
    #[default]
    Accumulating,
    /// Past the boundary and waiting for acknowledgment.
    Alarmed,
}

/// Transition reported by [`PeriodAlarm::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    /// No change.
    Unchanged,
    /// The boundary was just crossed.
    Raised,
    /// The boundary moved past the elapsed time (period length increased).
    Cleared,
}

/// Result of an acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AckOutcome {
    /// The alarm was cleared and the period counter advanced.
    Acknowledged {
        /// Period count after the acknowledgment.
        elapsed_periods: u32,
    },
    /// There was no active alarm; nothing changed.
    NotAlarmed,
}

/// Period bookkeeping and alarm state for one timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodAlarm {
    period_minutes: u32,
    elapsed_periods: u32,
    state: AlarmState,
}

impl PeriodAlarm {
    /// Restore an alarm and derive its state from `elapsed_seconds`.
    #[must_use]
    pub fn restore(period_minutes: u32, elapsed_periods: u32, elapsed_seconds: u64) -> Self {
        let mut alarm = Self {
            period_minutes,
            elapsed_periods,
            state: AlarmState::Accumulating,
        };
        alarm.evaluate(elapsed_seconds);
        alarm
    }

    /// Configured period length in minutes.
    #[must_use]
    pub const fn period_minutes(&self) -> u32 {
        self.period_minutes
    }

    /// Number of acknowledged periods.
    #[must_use]
    pub const fn elapsed_periods(&self) -> u32 {
        self.elapsed_periods
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AlarmState {
        self.state
    }

    /// Whether the alarm output is asserted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == AlarmState::Alarmed
    }

    /// Seconds after which the next alarm fires.
    #[must_use]
    pub const fn boundary_seconds(&self) -> u64 {
        (self.period_minutes as u64)
            .saturating_mul(SECONDS_PER_MINUTE)
            .saturating_mul(self.elapsed_periods as u64 + 1)
    }

    /// Change the period length. The state is re-derived on the next
    /// [`evaluate`](Self::evaluate).
    pub fn set_period_minutes(&mut self, minutes: u32) {
        self.period_minutes = minutes;
    }

    /// Re-derive the alarm state from the elapsed time.
    pub fn evaluate(&mut self, elapsed_seconds: u64) -> AlarmTransition {
        let over = elapsed_seconds > self.boundary_seconds();
        match (self.state, over) {
            (AlarmState::Accumulating, true) => {
                self.state = AlarmState::Alarmed;
                AlarmTransition::Raised
            }
            (AlarmState::Alarmed, false) => {
                self.state = AlarmState::Accumulating;
                AlarmTransition::Cleared
            }
            _ => AlarmTransition::Unchanged,
        }
    }

    /// Clear an active alarm and advance the period counter.
    pub fn acknowledge(&mut self) -> AckOutcome {
        if self.state != AlarmState::Alarmed {
            return AckOutcome::NotAlarmed;
        }
        self.elapsed_periods = self.elapsed_periods.saturating_add(1);
        self.state = AlarmState::Accumulating;
        AckOutcome::Acknowledged {
            elapsed_periods: self.elapsed_periods,
        }
    }
}

/// Rising-edge detector for boolean signals.
///
/// Duplicate notifications of the same level are ignored, as is any
/// transition to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    /// Last seen level.
    #[must_use]
    pub const fn level(&self) -> bool {
        self.previous
    }

    /// Feed the current level; returns `true` on a `false -> true` edge.
    pub fn update(&mut self, level: bool) -> bool {
        let rising = level && !self.previous;
        self.previous = level;
        rising
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_scales_with_periods() {
        let alarm = PeriodAlarm::restore(1, 0, 0);
        assert_eq!(alarm.boundary_seconds(), 60);
        let alarm = PeriodAlarm::restore(1, 1, 0);
        assert_eq!(alarm.boundary_seconds(), 120);
        let alarm = PeriodAlarm::restore(90, 2, 0);
        assert_eq!(alarm.boundary_seconds(), 90 * 60 * 3);
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let mut alarm = PeriodAlarm::restore(1, 0, 0);
        assert_eq!(alarm.evaluate(60), AlarmTransition::Unchanged);
        assert!(!alarm.is_active());
        assert_eq!(alarm.evaluate(61), AlarmTransition::Raised);
        assert!(alarm.is_active());
        assert_eq!(alarm.evaluate(62), AlarmTransition::Unchanged);
    }

    #[test]
    fn test_restore_past_boundary_starts_alarmed() {
        let alarm = PeriodAlarm::restore(1, 0, 500);
        assert_eq!(alarm.state(), AlarmState::Alarmed);

        let alarm = PeriodAlarm::restore(1, 10, 500);
        assert_eq!(alarm.state(), AlarmState::Accumulating);
    }

    #[test]
    fn test_acknowledge_while_alarmed() {
        let mut alarm = PeriodAlarm::restore(1, 0, 61);
        assert_eq!(
            alarm.acknowledge(),
            AckOutcome::Acknowledged { elapsed_periods: 1 }
        );
        assert!(!alarm.is_active());
        assert_eq!(alarm.boundary_seconds(), 120);
    }

    #[test]
    fn test_acknowledge_without_alarm_is_noop() {
        let mut alarm = PeriodAlarm::restore(1, 0, 10);
        assert_eq!(alarm.acknowledge(), AckOutcome::NotAlarmed);
        assert_eq!(alarm.acknowledge(), AckOutcome::NotAlarmed);
        assert_eq!(alarm.elapsed_periods(), 0);
        assert_eq!(alarm.boundary_seconds(), 60);
    }

    #[test]
    fn test_longer_period_clears_alarm() {
        let mut alarm = PeriodAlarm::restore(1, 0, 90);
        assert!(alarm.is_active());
        alarm.set_period_minutes(5);
        assert_eq!(alarm.evaluate(90), AlarmTransition::Cleared);
        assert!(!alarm.is_active());
    }

    #[test]
    fn test_zero_period_alarms_after_first_second() {
        let mut alarm = PeriodAlarm::restore(0, 0, 0);
        assert!(!alarm.is_active());
        assert_eq!(alarm.evaluate(1), AlarmTransition::Raised);
    }

    #[test]
    fn test_boundary_saturates() {
        let alarm = PeriodAlarm::restore(u32::MAX, u32::MAX, 0);
        assert_eq!(alarm.boundary_seconds(), u64::MAX);
    }

    #[test]
    fn test_edge_detector_fires_once_per_rising_edge() {
        let mut edge = EdgeDetector::default();
        assert!(edge.update(true));
        assert!(!edge.update(true));
        assert!(!edge.update(false));
        assert!(!edge.update(false));
        assert!(edge.update(true));
        assert!(edge.level());
    }
}
