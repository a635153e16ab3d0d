//! Per-day blocked decision for one block set.
//!
//! A calendar day is blocked when its date key is listed, when the
//! weekday is not a working day, or when the blocked ranges clipped to
//! the working window union to at least the partial-block threshold.

use chrono::{DateTime, Datelike};
use chrono_tz::Tz;

use crate::blocks::BlockSet;
use crate::calendar::WorkCalendar;
use crate::tz;

/// Clipped block time at or above this makes the whole day blocked.
pub const PARTIAL_BLOCK_THRESHOLD_MINUTES: i64 = 4 * 60;

/// Evaluate one calendar day against one block set.
pub fn is_day_blocked(
    day: DateTime<Tz>,
    blocks: &BlockSet,
    calendar: &WorkCalendar,
    zone: Tz,
) -> bool {
    if blocks.dates.contains(&tz::date_key(day)) {
        return true;
    }
    let window = calendar.window(day.weekday());
    if !window.available {
        return true;
    }
    blocked_minutes_in_window(day, blocks, calendar, zone) >= PARTIAL_BLOCK_THRESHOLD_MINUTES
}

/// Total minutes of the day's working window covered by blocked
/// ranges, after clipping and merging overlaps (sort-then-sweep).
pub fn blocked_minutes_in_window(
    day: DateTime<Tz>,
    blocks: &BlockSet,
    calendar: &WorkCalendar,
    zone: Tz,
) -> i64 {
    let window = calendar.window(day.weekday());
    if !window.available {
        return 0;
    }

    let start = tz::to_instant(tz::at_minutes(day, window.start_minutes));
    let end = tz::to_instant(tz::at_minutes(day, window.end_minutes));

    let mut clipped: Vec<(DateTime<chrono::Utc>, DateTime<chrono::Utc>)> = blocks
        .ranges
        .iter()
        .filter_map(|span| {
            let span_end = tz::normalize_range_end_inclusive(span.end, zone);
            let s = span.start.max(start);
            let e = span_end.min(end);
            (s < e).then_some((s, e))
        })
        .collect();
    clipped.sort_by_key(|(s, _)| *s);

    let mut total = 0i64;
    let mut cursor: Option<(DateTime<chrono::Utc>, DateTime<chrono::Utc>)> = None;
    for (s, e) in clipped {
        match cursor {
            None => cursor = Some((s, e)),
            Some((cs, ce)) => {
                if s <= ce {
                    cursor = Some((cs, ce.max(e)));
                } else {
                    total += (ce - cs).num_minutes();
                    cursor = Some((s, e));
                }
            }
        }
    }
    if let Some((cs, ce)) = cursor {
        total += (ce - cs).num_minutes();
    }
    total
}
