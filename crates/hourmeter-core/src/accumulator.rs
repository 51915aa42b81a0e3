//! Gated elapsed-second counters.
//!
//! An [`Accumulator`] counts seconds while its gate input is asserted. The
//! gate is sampled on every [`tick`](Accumulator::tick); the counter never
//! decrements and saturates instead of wrapping.

use serde::{Deserialize, Serialize};

/// A single gated seconds counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    elapsed_seconds: u64,
    gate: bool,
}

impl Accumulator {
    /// Create an accumulator restored to `elapsed_seconds`, gate deasserted.
    #[must_use]
    pub const fn new(elapsed_seconds: u64) -> Self {
        Self {
            elapsed_seconds,
            gate: false,
        }
    }

    /// Seconds accumulated so far.
    #[must_use]
    pub const fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Current gate input.
    #[must_use]
    pub const fn gate(&self) -> bool {
        self.gate
    }

    /// Update the gate input. Takes effect on the next tick.
    pub fn set_gate(&mut self, on: bool) {
        self.gate = on;
    }

    /// Advance by one second if the gate is asserted.
    ///
    /// Returns the new count when it advanced, `None` otherwise.
    pub fn tick(&mut self) -> Option<u64> {
        if !self.gate {
            return None;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        Some(self.elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_while_gate_asserted() {
        let mut acc = Accumulator::new(100);
        acc.set_gate(true);
        for _ in 0..25 {
            acc.tick();
        }
        assert_eq!(acc.elapsed_seconds(), 125);
    }

    #[test]
    fn test_holds_while_gate_deasserted() {
        let mut acc = Accumulator::new(42);
        for _ in 0..10 {
            assert_eq!(acc.tick(), None);
        }
        assert_eq!(acc.elapsed_seconds(), 42);
    }

    #[test]
    fn test_tick_reports_new_value() {
        let mut acc = Accumulator::default();
        acc.set_gate(true);
        assert_eq!(acc.tick(), Some(1));
        assert_eq!(acc.tick(), Some(2));
        acc.set_gate(false);
        assert_eq!(acc.tick(), None);
        assert_eq!(acc.elapsed_seconds(), 2);
    }

    #[test]
    fn test_saturates_instead_of_wrapping() {
        let mut acc = Accumulator::new(u64::MAX);
        acc.set_gate(true);
        assert_eq!(acc.tick(), Some(u64::MAX));
    }
}
