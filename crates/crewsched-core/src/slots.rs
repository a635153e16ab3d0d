//! Hours-mode slot generation: 30-minute-aligned start slots for one
//! candidate day that fit execution plus buffer inside working hours
//! and collide with no blocks.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::blocks::{any_overlap, BlockSet, ResourceBlocks};
use crate::calendar::{format_minutes, WorkCalendar};
use crate::model::{DurationUnit, WorkDuration};
use crate::subset::{find_first_eligible_subset_for_hours, SubsetSearch};
use crate::tz;
use crate::working_time::buffer_end;

/// Slot grid granularity.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// One bookable start slot on a specific day.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSlot {
    /// Wall-clock `"HH:MM"` start in the professional's zone.
    pub start_time: String,
    pub start: DateTime<Utc>,
    pub execution_end: DateTime<Utc>,
    /// Equals `execution_end` when no buffer applies.
    pub buffer_end: DateTime<Utc>,
    /// Satisfying subset in multi-resource mode; empty otherwise.
    pub team: Vec<String>,
}

/// Day-independent inputs for slot generation.
pub struct SlotQuery<'a> {
    pub execution_hours: f64,
    pub buffer: Option<&'a WorkDuration>,
    /// Slots may not start before this instant (preparation end).
    pub not_before: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
    pub calendar: &'a WorkCalendar,
    /// Blocks governing buffer arithmetic (customer blocks excluded).
    pub buffer_blocks: &'a BlockSet,
    pub zone: Tz,
    pub debug: bool,
}

/// Which availability model gates each slot.
pub enum SlotMode<'a> {
    /// Strict intersection against the merged block set.
    Single { merged: &'a BlockSet },
    /// Subset search with the window-level overlap policy.
    Multi {
        per_resource: &'a HashMap<String, ResourceBlocks>,
        ordered: &'a [String],
        min_resources: usize,
        required_overlap: u32,
        deadline: Option<Instant>,
    },
}

/// Enumerate the valid slots of one candidate day, earliest first.
pub fn day_slots(day: DateTime<Tz>, query: &SlotQuery<'_>, mode: &SlotMode<'_>) -> Vec<CandidateSlot> {
    let window = query.calendar.window(day.weekday());
    if !window.available {
        return Vec::new();
    }
    let execution_minutes = (query.execution_hours * 60.0).round() as i64;
    if execution_minutes <= 0 {
        return Vec::new();
    }
    let last_start = window.end_minutes - execution_minutes;
    if last_start < window.start_minutes {
        return Vec::new();
    }

    if let SlotMode::Single { merged } = mode {
        if merged.dates.contains(&tz::date_key(day)) {
            return Vec::new();
        }
    }

    let mut first_minute = window.start_minutes;
    let day_key = tz::date_key(day);
    let now_local = tz::to_zone(query.now, query.zone);
    if tz::date_key(now_local) == day_key {
        first_minute = first_minute.max(tz::minutes_of_day(now_local));
    }
    if let Some(not_before) = query.not_before {
        let not_before_local = tz::to_zone(not_before, query.zone);
        if tz::date_key(not_before_local) == day_key {
            first_minute = first_minute.max(tz::minutes_of_day(not_before_local));
        }
    }
    // Round up to the slot grid.
    first_minute = (first_minute + SLOT_STEP_MINUTES - 1) / SLOT_STEP_MINUTES * SLOT_STEP_MINUTES;

    let mut slots = Vec::new();
    let mut minute = first_minute;
    while minute <= last_start {
        let slot_start_zoned = tz::at_minutes(day, minute);
        let exec_end_zoned = tz::at_minutes(day, minute + execution_minutes);
        let slot_start = tz::to_instant(slot_start_zoned);
        let exec_end = tz::to_instant(exec_end_zoned);

        let buffer_end_zoned = buffer_end(
            exec_end_zoned,
            query.buffer,
            DurationUnit::Hours,
            query.buffer_blocks,
            query.calendar,
            query.zone,
        );
        let buffer_end_instant = tz::to_instant(buffer_end_zoned);
        let buffer_interval =
            (buffer_end_instant > exec_end).then_some((exec_end, buffer_end_instant));

        match mode {
            SlotMode::Single { merged } => {
                let exec_clear = !any_overlap(&merged.ranges, slot_start, exec_end, query.zone);
                let buffer_clear = buffer_interval
                    .map(|(s, e)| !any_overlap(&query.buffer_blocks.ranges, s, e, query.zone))
                    .unwrap_or(true);
                if query.debug {
                    tracing::debug!(
                        slot = %format_minutes(minute),
                        exec_clear,
                        buffer_clear,
                        "evaluated single-resource slot"
                    );
                }
                if exec_clear && buffer_clear {
                    slots.push(CandidateSlot {
                        start_time: format_minutes(minute),
                        start: slot_start,
                        execution_end: exec_end,
                        buffer_end: buffer_end_instant,
                        team: Vec::new(),
                    });
                }
            }
            SlotMode::Multi {
                per_resource,
                ordered,
                min_resources,
                required_overlap,
                deadline,
            } => {
                let search = find_first_eligible_subset_for_hours(
                    ordered,
                    *min_resources,
                    *required_overlap,
                    slot_start,
                    exec_end,
                    buffer_interval,
                    per_resource,
                    query.calendar,
                    query.zone,
                    *deadline,
                );
                match search {
                    SubsetSearch::Found(team) => {
                        if query.debug {
                            tracing::debug!(
                                slot = %format_minutes(minute),
                                team = ?team,
                                "found eligible team for slot"
                            );
                        }
                        slots.push(CandidateSlot {
                            start_time: format_minutes(minute),
                            start: slot_start,
                            execution_end: exec_end,
                            buffer_end: buffer_end_instant,
                            team,
                        });
                    }
                    // The pool size is fixed for the whole request, so
                    // a cap refusal repeats for every slot of the day.
                    SubsetSearch::CapExceeded => return Vec::new(),
                    SubsetSearch::NotFound => {}
                }
            }
        }
        minute += SLOT_STEP_MINUTES;
    }
    slots
}
