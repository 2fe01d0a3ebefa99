//! Pulse id sequence checks.

use serde::Serialize;
use tracing::warn;

/// Classification of a pulse id relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOrder {
    /// First pulse seen by the tracker.
    First,
    /// Exactly one more than the previous pulse.
    InOrder,
    /// Same id as the previous pulse.
    Duplicate,
    /// Ahead of the expected id; carries how many pulses were skipped.
    Missed(u64),
    /// Older than the previous pulse.
    Reverted,
}

/// Pulse sequence statistics for one receive session.
///
/// Purely observational: every pulse is still delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyTracker {
    last_pulse_id: Option<u64>,
    received: u64,
    missed: u64,
    duplicate: u64,
    reverted: u64,
}

impl ConsistencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received pulse id.
    pub fn observe(&mut self, pulse_id: u64) -> PulseOrder {
        self.received += 1;
        let Some(last) = self.last_pulse_id else {
            self.last_pulse_id = Some(pulse_id);
            return PulseOrder::First;
        };

        if pulse_id == last {
            self.duplicate += 1;
            warn!(pulse_id, "duplicate pulse");
            PulseOrder::Duplicate
        } else if pulse_id < last {
            self.reverted += 1;
            warn!(pulse_id, last, "pulse id went backwards");
            PulseOrder::Reverted
        } else if pulse_id == last + 1 {
            self.last_pulse_id = Some(pulse_id);
            PulseOrder::InOrder
        } else {
            let skipped = pulse_id - last - 1;
            self.missed += skipped;
            self.last_pulse_id = Some(pulse_id);
            warn!(expected = last + 1, pulse_id, skipped, "missed pulses");
            PulseOrder::Missed(skipped)
        }
    }

    pub fn last_pulse_id(&self) -> Option<u64> {
        self.last_pulse_id
    }

    pub fn received_count(&self) -> u64 {
        self.received
    }

    pub fn missed_count(&self) -> u64 {
        self.missed
    }

    pub fn duplicate_count(&self) -> u64 {
        self.duplicate
    }

    pub fn reverted_count(&self) -> u64 {
        self.reverted
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
