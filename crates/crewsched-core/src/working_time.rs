//! Working-time arithmetic: day advancement, hour consumption,
//! preparation and buffer ends.
//!
//! Every walk is bounded; on cap exhaustion the cursor reached so far
//! is returned and a warning is logged.

use std::collections::HashMap;

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

use crate::blocks::{BlockSet, HolidayCalendar, ResourceBlocks};
use crate::calendar::WorkCalendar;
use crate::day_block::is_day_blocked;
use crate::model::{DurationUnit, WorkDuration};
use crate::tz;

/// Iteration bound for every day-by-day walk (two years of slack).
pub const MAX_DAY_WALK: u32 = 732;

/// How a single day's blocked state is decided while walking.
///
/// The multi-resource variant checks only that enough resources are
/// unblocked; the window-level overlap percentage is deliberately not
/// enforced here.
pub enum DayEvaluator<'a> {
    /// Strict intersection over one merged block set.
    Merged(&'a BlockSet),
    /// At least `min_resources` of the listed resources unblocked.
    MinAvailable {
        per_resource: &'a HashMap<String, ResourceBlocks>,
        ordered: &'a [String],
        min_resources: usize,
    },
}

impl DayEvaluator<'_> {
    pub fn is_blocked(&self, day: DateTime<Tz>, calendar: &WorkCalendar, zone: Tz) -> bool {
        match self {
            DayEvaluator::Merged(blocks) => is_day_blocked(day, blocks, calendar, zone),
            DayEvaluator::MinAvailable {
                per_resource,
                ordered,
                min_resources,
            } => {
                let available = ordered
                    .iter()
                    .filter(|id| {
                        per_resource
                            .get(*id)
                            .map(|r| !is_day_blocked(day, &r.all, calendar, zone))
                            .unwrap_or(false)
                    })
                    .count();
                available < *min_resources
            }
        }
    }
}

/// Walk forward from `start` until `days` unblocked days have been
/// seen; returns the day the count lands on. The start day itself
/// counts when unblocked.
pub fn advance_working_days(
    start: DateTime<Tz>,
    days: u32,
    evaluator: &DayEvaluator<'_>,
    calendar: &WorkCalendar,
    zone: Tz,
) -> DateTime<Tz> {
    if days == 0 {
        return start;
    }
    let mut day = start;
    let mut counted = 0u32;
    for _ in 0..MAX_DAY_WALK {
        if !evaluator.is_blocked(day, calendar, zone) {
            counted += 1;
            if counted == days {
                return day;
            }
        }
        day = tz::add_days(day, 1);
    }
    tracing::warn!(days, "advance_working_days hit the iteration cap");
    day
}

/// Consume `hours` of working time starting at `start`, skipping
/// blocked days and clipping to each day's working window.
pub fn add_working_hours(
    start: DateTime<Tz>,
    hours: f64,
    blocks: &BlockSet,
    calendar: &WorkCalendar,
    zone: Tz,
) -> DateTime<Tz> {
    let mut remaining = (hours * 60.0).round() as i64;
    if remaining <= 0 {
        return start;
    }

    let mut cursor = start;
    for _ in 0..MAX_DAY_WALK {
        let window = calendar.window(cursor.weekday());
        if is_day_blocked(cursor, blocks, calendar, zone) {
            cursor = tz::day_start(tz::add_days(cursor, 1));
            continue;
        }
        let from = tz::minutes_of_day(cursor).max(window.start_minutes);
        if from >= window.end_minutes {
            cursor = tz::day_start(tz::add_days(cursor, 1));
            continue;
        }
        let available = window.end_minutes - from;
        if remaining <= available {
            return tz::at_minutes(cursor, from + remaining);
        }
        remaining -= available;
        cursor = tz::day_start(tz::add_days(cursor, 1));
    }
    tracing::warn!(hours, "add_working_hours hit the iteration cap");
    cursor
}

/// End of the preparation lead-in starting at `now`.
///
/// Preparation runs on the default calendar's hours regardless of the
/// professional's overrides, and skips weekends and holiday-flagged
/// company blocks. Day-unit preparation consumes whole working days
/// and ends at the midnight after the last one; hour-unit preparation
/// consumes working minutes.
pub fn prep_end(
    now: DateTime<Tz>,
    preparation: Option<&WorkDuration>,
    holidays: &HolidayCalendar,
    zone: Tz,
) -> DateTime<Tz> {
    let Some(prep) = preparation else {
        return now;
    };
    if prep.is_zero() {
        return now;
    }
    let calendar = WorkCalendar::preparation();

    match prep.unit {
        DurationUnit::Days => {
            let needed = prep.value.ceil() as u32;
            let mut day = now;
            let mut counted = 0u32;
            for _ in 0..MAX_DAY_WALK {
                let window = calendar.window(day.weekday());
                let eligible = window.available
                    && !holidays.is_holiday(day)
                    && tz::minutes_of_day(day) < window.end_minutes;
                if eligible {
                    counted += 1;
                    if counted == needed {
                        return tz::day_start(tz::add_days(day, 1));
                    }
                }
                day = tz::day_start(tz::add_days(day, 1));
            }
            tracing::warn!(days = needed, "prep_end hit the iteration cap");
            day
        }
        DurationUnit::Hours => {
            let mut remaining = prep.minutes();
            let mut cursor = now;
            for _ in 0..MAX_DAY_WALK {
                let window = calendar.window(cursor.weekday());
                if !window.available || holidays.is_holiday(cursor) {
                    cursor = tz::day_start(tz::add_days(cursor, 1));
                    continue;
                }
                let from = tz::minutes_of_day(cursor).max(window.start_minutes);
                if from >= window.end_minutes {
                    cursor = tz::day_start(tz::add_days(cursor, 1));
                    continue;
                }
                let available = window.end_minutes - from;
                if remaining <= available {
                    return tz::at_minutes(cursor, from + remaining);
                }
                remaining -= available;
                cursor = tz::day_start(tz::add_days(cursor, 1));
            }
            tracing::warn!("prep_end hit the iteration cap");
            cursor
        }
    }
}

/// End of the post-execution buffer.
///
/// An hour buffer after an hour execution starts exactly at execution
/// end; every other combination starts at the next day's midnight. Day
/// buffers advance whole working days and clamp to the landing day's
/// working end.
pub fn buffer_end(
    execution_end: DateTime<Tz>,
    buffer: Option<&WorkDuration>,
    execution_unit: DurationUnit,
    blocks: &BlockSet,
    calendar: &WorkCalendar,
    zone: Tz,
) -> DateTime<Tz> {
    let Some(buffer) = buffer else {
        return execution_end;
    };
    if buffer.is_zero() {
        return execution_end;
    }

    let start = if execution_unit == DurationUnit::Hours && buffer.unit == DurationUnit::Hours {
        execution_end
    } else {
        tz::day_start(tz::add_days(execution_end, 1))
    };

    match buffer.unit {
        DurationUnit::Hours => add_working_hours(start, buffer.value, blocks, calendar, zone),
        DurationUnit::Days => {
            let evaluator = DayEvaluator::Merged(blocks);
            let last = advance_working_days(start, buffer.whole_days(), &evaluator, calendar, zone);
            tz::at_minutes(last, calendar.window(last.weekday()).end_minutes)
        }
    }
}

/// Working days between two zoned datetimes, inclusive of both ends,
/// counted off the calendar alone; blocked days still count.
pub fn count_working_days_between(
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    calendar: &WorkCalendar,
) -> u32 {
    let mut day = tz::day_start(start);
    let last = tz::day_start(end);
    let mut count = 0u32;
    for _ in 0..MAX_DAY_WALK {
        if calendar.is_working_day(day.weekday()) {
            count += 1;
        }
        if day >= last {
            break;
        }
        day = tz::add_days(day, 1);
    }
    count
}
