//! The accumulation and alarm engine.
//!
//! [`Engine`] owns every timer. State changes only through three kinds of
//! events, each of which runs to completion before returning:
//!
//! - [`tick`](Engine::tick) once per second from the host clock
//! - input updates ([`set_gate`](Engine::set_gate),
//!   [`set_period_minutes`](Engine::set_period_minutes),
//!   [`set_reset_signal`](Engine::set_reset_signal))
//! - [`acknowledge`](Engine::acknowledge) for a direct operator reset
//!
//! The engine does no I/O. Persisted counters come in through
//! [`Engine::new`] and go out through [`Engine::counters`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::accumulator::Accumulator;
use crate::alarm::{AckOutcome, AlarmState, AlarmTransition, EdgeDetector, PeriodAlarm};
use crate::format::format_elapsed;
use crate::store::Counters;
use crate::types::{AlarmId, TimerId};

/// Period lengths supplied by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PeriodSettings {
    /// Machine maintenance period in minutes.
    pub machine_minutes: u32,
    /// Spindle maintenance period in minutes.
    pub spindle_minutes: u32,
}

/// An output signal that changed during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputChange {
    /// A timer advanced.
    Elapsed {
        /// Timer that advanced.
        timer: TimerId,
        /// New elapsed seconds.
        seconds: u64,
    },
    /// An alarm output flipped.
    Alarm {
        /// Alarm channel.
        alarm: AlarmId,
        /// New alarm level.
        active: bool,
    },
    /// An acknowledged-period counter advanced.
    Periods {
        /// Alarm channel.
        alarm: AlarmId,
        /// New period count.
        elapsed_periods: u32,
    },
}

impl OutputChange {
    /// Outputs changed by acknowledging `alarm`.
    ///
    /// A successful acknowledgment drops the alarm output and advances the
    /// period counter; an ignored one changes nothing.
    #[must_use]
    pub fn from_acknowledgment(alarm: AlarmId, outcome: AckOutcome) -> Vec<Self> {
        match outcome {
            AckOutcome::Acknowledged { elapsed_periods } => vec![
                Self::Alarm {
                    alarm,
                    active: false,
                },
                Self::Periods {
                    alarm,
                    elapsed_periods,
                },
            ],
            AckOutcome::NotAlarmed => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct AlarmTimer {
    accumulator: Accumulator,
    alarm: PeriodAlarm,
    reset: EdgeDetector,
}

impl AlarmTimer {
    fn restore(elapsed_seconds: u64, elapsed_periods: u32, period_minutes: u32) -> Self {
        Self {
            accumulator: Accumulator::new(elapsed_seconds),
            alarm: PeriodAlarm::restore(period_minutes, elapsed_periods, elapsed_seconds),
            reset: EdgeDetector::default(),
        }
    }
}

/// Time accumulation and maintenance-period alarm engine.
#[derive(Debug, Clone)]
pub struct Engine {
    machine: AlarmTimer,
    spindle: AlarmTimer,
    running: Accumulator,
}

impl Engine {
    /// Build an engine from persisted counters.
    ///
    /// Alarm state is derived from the counters, so an engine restored past
    /// a period boundary starts out alarmed.
    #[must_use]
    pub fn new(counters: Counters, periods: PeriodSettings) -> Self {
        let engine = Self {
            machine: AlarmTimer::restore(
                counters.machine_time,
                counters.num_periodes_machine,
                periods.machine_minutes,
            ),
            spindle: AlarmTimer::restore(
                counters.spindle_time,
                counters.num_periodes_spindle,
                periods.spindle_minutes,
            ),
            running: Accumulator::new(counters.running_time),
        };
        for id in AlarmId::ALL {
            if engine.is_alarm_active(id) {
                info!(alarm = %id, "Restored state is past the maintenance boundary");
            }
        }
        engine
    }

    const fn alarm_timer(&self, id: AlarmId) -> &AlarmTimer {
        match id {
            AlarmId::Machine => &self.machine,
            AlarmId::Spindle => &self.spindle,
        }
    }

    fn alarm_timer_mut(&mut self, id: AlarmId) -> &mut AlarmTimer {
        match id {
            AlarmId::Machine => &mut self.machine,
            AlarmId::Spindle => &mut self.spindle,
        }
    }

    const fn accumulator(&self, id: TimerId) -> &Accumulator {
        match id {
            TimerId::Machine => &self.machine.accumulator,
            TimerId::Spindle => &self.spindle.accumulator,
            TimerId::Running => &self.running,
        }
    }

    fn accumulator_mut(&mut self, id: TimerId) -> &mut Accumulator {
        match id {
            TimerId::Machine => &mut self.machine.accumulator,
            TimerId::Spindle => &mut self.spindle.accumulator,
            TimerId::Running => &mut self.running,
        }
    }

    /// Set a gate input.
    pub fn set_gate(&mut self, timer: TimerId, on: bool) {
        self.accumulator_mut(timer).set_gate(on);
    }

    /// Current gate input.
    #[must_use]
    pub const fn gate(&self, timer: TimerId) -> bool {
        self.accumulator(timer).gate()
    }

    /// Set a period length input. The alarm is re-derived on the next tick.
    pub fn set_period_minutes(&mut self, alarm: AlarmId, minutes: u32) {
        self.alarm_timer_mut(alarm).alarm.set_period_minutes(minutes);
    }

    /// Feed the level of a reset signal.
    ///
    /// Only a `false -> true` edge acknowledges; repeated `true` levels and
    /// falling edges return `None`.
    pub fn set_reset_signal(&mut self, alarm: AlarmId, level: bool) -> Option<AckOutcome> {
        if self.alarm_timer_mut(alarm).reset.update(level) {
            Some(self.acknowledge(alarm))
        } else {
            None
        }
    }

    /// Acknowledge an alarm.
    ///
    /// Clears the alarm and advances the period counter by one. Does
    /// nothing unless the alarm is active.
    pub fn acknowledge(&mut self, alarm: AlarmId) -> AckOutcome {
        let outcome = self.alarm_timer_mut(alarm).alarm.acknowledge();
        match outcome {
            AckOutcome::Acknowledged { elapsed_periods } => {
                info!(alarm = %alarm, elapsed_periods, "Maintenance alarm acknowledged");
            }
            AckOutcome::NotAlarmed => {
                debug!(alarm = %alarm, "Ignoring acknowledgment, alarm not active");
            }
        }
        outcome
    }

    /// Advance every gated timer by one second and re-evaluate alarms.
    ///
    /// Returns the outputs that changed.
    pub fn tick(&mut self) -> Vec<OutputChange> {
        let mut changes = Vec::new();
        for timer in TimerId::ALL {
            if let Some(seconds) = self.accumulator_mut(timer).tick() {
                changes.push(OutputChange::Elapsed { timer, seconds });
            }
        }
        for alarm in AlarmId::ALL {
            let slot = self.alarm_timer_mut(alarm);
            let elapsed = slot.accumulator.elapsed_seconds();
            match slot.alarm.evaluate(elapsed) {
                AlarmTransition::Raised => {
                    info!(
                        alarm = %alarm,
                        elapsed_seconds = elapsed,
                        boundary_seconds = slot.alarm.boundary_seconds(),
                        "Maintenance alarm raised"
                    );
                    changes.push(OutputChange::Alarm {
                        alarm,
                        active: true,
                    });
                }
                AlarmTransition::Cleared => {
                    info!(alarm = %alarm, "Maintenance alarm cleared by period change");
                    changes.push(OutputChange::Alarm {
                        alarm,
                        active: false,
                    });
                }
                AlarmTransition::Unchanged => {}
            }
        }
        changes
    }

    /// Elapsed seconds of a timer.
    #[must_use]
    pub const fn elapsed_seconds(&self, timer: TimerId) -> u64 {
        self.accumulator(timer).elapsed_seconds()
    }

    /// Whether an alarm output is asserted.
    #[must_use]
    pub fn is_alarm_active(&self, alarm: AlarmId) -> bool {
        self.alarm_timer(alarm).alarm.is_active()
    }

    /// Acknowledged periods of an alarm-bearing timer.
    #[must_use]
    pub const fn elapsed_periods(&self, alarm: AlarmId) -> u32 {
        self.alarm_timer(alarm).alarm.elapsed_periods()
    }

    /// Seconds after which the next alarm fires.
    #[must_use]
    pub const fn boundary_seconds(&self, alarm: AlarmId) -> u64 {
        self.alarm_timer(alarm).alarm.boundary_seconds()
    }

    /// Counters to persist.
    #[must_use]
    pub const fn counters(&self) -> Counters {
        Counters {
            machine_time: self.machine.accumulator.elapsed_seconds(),
            spindle_time: self.spindle.accumulator.elapsed_seconds(),
            running_time: self.running.elapsed_seconds(),
            num_periodes_machine: self.machine.alarm.elapsed_periods(),
            num_periodes_spindle: self.spindle.alarm.elapsed_periods(),
        }
    }

    /// Snapshot of one timer's inputs and outputs.
    #[must_use]
    pub fn timer_snapshot(&self, timer: TimerId) -> TimerSnapshot {
        let acc = self.accumulator(timer);
        TimerSnapshot {
            timer,
            gate: acc.gate(),
            elapsed_seconds: acc.elapsed_seconds(),
            label: format_elapsed(acc.elapsed_seconds()),
            alarm: timer.alarm().map(|id| {
                let slot = self.alarm_timer(id);
                AlarmSnapshot {
                    period_minutes: slot.alarm.period_minutes(),
                    elapsed_periods: slot.alarm.elapsed_periods(),
                    state: slot.alarm.state(),
                    active: slot.alarm.is_active(),
                    boundary_seconds: slot.alarm.boundary_seconds(),
                    reset_signal: slot.reset.level(),
                }
            }),
        }
    }

    /// Snapshot of every timer.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            timers: TimerId::ALL
                .into_iter()
                .map(|timer| self.timer_snapshot(timer))
                .collect(),
        }
    }
}

/// Alarm-related state of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AlarmSnapshot {
    /// Configured period length in minutes.
    #[schema(example = 480)]
    pub period_minutes: u32,
    /// Acknowledged periods.
    #[schema(example = 2)]
    pub elapsed_periods: u32,
    /// Alarm state.
    pub state: AlarmState,
    /// Alarm output level.
    pub active: bool,
    /// Elapsed seconds after which the next alarm fires.
    #[schema(example = 86_400)]
    pub boundary_seconds: u64,
    /// Last seen level of the reset signal.
    pub reset_signal: bool,
}

/// Inputs and outputs of one timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerSnapshot {
    /// Which timer.
    pub timer: TimerId,
    /// Gate input level.
    pub gate: bool,
    /// Accumulated seconds.
    #[schema(example = 3661)]
    pub elapsed_seconds: u64,
    /// Accumulated time as `H:MM:SS`.
    #[schema(example = "1:01:01")]
    pub label: String,
    /// Alarm state, absent for the running timer.
    pub alarm: Option<AlarmSnapshot>,
}

/// Inputs and outputs of every timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EngineSnapshot {
    /// Machine, spindle and running timers, in that order.
    pub timers: Vec<TimerSnapshot>,
}

impl EngineSnapshot {
    /// Look up one timer.
    #[must_use]
    pub fn timer(&self, id: TimerId) -> Option<&TimerSnapshot> {
        self.timers.iter().find(|t| t.timer == id)
    }
}
