//! Joint-availability evaluation for a candidate resource subset over
//! a candidate window.
//!
//! Days mode counts fully-joint working days under a throughput limit;
//! hours mode samples the execution interval at 30-minute granularity.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;

use crate::blocks::ResourceBlocks;
use crate::calendar::WorkCalendar;
use crate::day_block::is_day_blocked;
use crate::tz;
use crate::working_time::MAX_DAY_WALK;

/// Sampling granularity for hours-mode overlap.
pub const SAMPLE_MINUTES: i64 = 30;

/// Result of a days-mode overlap walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaysOverlap {
    pub overlap_percentage: f64,
    pub can_complete: bool,
}

/// Walk working days from `start_day`, counting the days on which
/// every subset member is unblocked, until the execution-day target is
/// met or the throughput limit is reached.
pub fn days_window_overlap(
    start_day: DateTime<Tz>,
    execution_days: u32,
    max_throughput_days: u32,
    subset: &[String],
    per_resource: &HashMap<String, ResourceBlocks>,
    calendar: &WorkCalendar,
    zone: Tz,
) -> DaysOverlap {
    let throughput_limit = execution_days.max(max_throughput_days);
    let mut day = start_day;
    let mut working_seen = 0u32;
    let mut available = 0u32;

    for _ in 0..MAX_DAY_WALK {
        if calendar.is_working_day(day.weekday()) {
            working_seen += 1;
            let joint = subset.iter().all(|id| {
                per_resource
                    .get(id)
                    .map(|r| !is_day_blocked(day, &r.all, calendar, zone))
                    .unwrap_or(false)
            });
            if joint {
                available += 1;
                if available >= execution_days {
                    break;
                }
            }
            if working_seen >= throughput_limit {
                break;
            }
        }
        day = tz::add_days(day, 1);
    }

    DaysOverlap {
        overlap_percentage: f64::from(available) / f64::from(execution_days.max(1)) * 100.0,
        can_complete: available >= execution_days,
    }
}

/// Fraction of 30-minute samples of `[exec_start, exec_end)` during
/// which every subset member is on a working weekday, not date-blocked
/// and free of range collisions. Empty or reversed intervals are 100%.
pub fn hours_window_overlap(
    exec_start: DateTime<Utc>,
    exec_end: DateTime<Utc>,
    subset: &[String],
    per_resource: &HashMap<String, ResourceBlocks>,
    calendar: &WorkCalendar,
    zone: Tz,
) -> f64 {
    let total_minutes = (exec_end - exec_start).num_minutes();
    if total_minutes <= 0 {
        return 100.0;
    }
    let samples = (total_minutes + SAMPLE_MINUTES - 1) / SAMPLE_MINUTES;
    let mut available = 0i64;

    for i in 0..samples {
        let sample_start = exec_start + Duration::minutes(i * SAMPLE_MINUTES);
        let sample_end = (sample_start + Duration::minutes(SAMPLE_MINUTES)).min(exec_end);
        let local = tz::to_zone(sample_start, zone);

        let joint = subset.iter().all(|id| {
            let Some(resource) = per_resource.get(id) else {
                return false;
            };
            calendar.is_working_day(local.weekday())
                && !resource.all.dates.contains(&tz::date_key(local))
                && !crate::blocks::any_overlap(
                    &resource.all.ranges,
                    sample_start,
                    sample_end,
                    zone,
                )
        });
        if joint {
            available += 1;
        }
    }

    available as f64 / samples as f64 * 100.0
}
