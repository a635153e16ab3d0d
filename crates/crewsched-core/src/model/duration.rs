//! Execution/preparation/buffer durations.

use serde::{Deserialize, Serialize};

/// Unit of a [`WorkDuration`]; also the project's execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Hours,
    Days,
}

/// A non-negative duration in working hours or working days.
///
/// Values may be fractional; day-based consumers take the ceiling
/// before iterating (a 2.5-day execution occupies 3 working days).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkDuration {
    pub value: f64,
    pub unit: DurationUnit,
}

impl WorkDuration {
    pub fn hours(value: f64) -> Self {
        Self {
            value,
            unit: DurationUnit::Hours,
        }
    }

    pub fn days(value: f64) -> Self {
        Self {
            value,
            unit: DurationUnit::Days,
        }
    }

    /// Whether this duration consumes no time at all.
    pub fn is_zero(&self) -> bool {
        self.value <= 0.0
    }

    /// Whole working days this duration occupies, never less than one.
    pub fn whole_days(&self) -> u32 {
        (self.value.ceil() as i64).max(1) as u32
    }

    /// Duration length in minutes (hours unit only makes this exact;
    /// day durations use the caller's working-day length).
    pub fn minutes(&self) -> i64 {
        (self.value * 60.0).round() as i64
    }
}
