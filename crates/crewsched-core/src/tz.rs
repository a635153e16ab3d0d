//! Timezone kernel: conversions between absolute instants and
//! wall-clock datetimes in an IANA zone.
//!
//! Absolute instants are `DateTime<Utc>`; zoned wall-clocks are
//! `DateTime<Tz>`. The zone travels in the type, and converting back
//! re-resolves offsets so DST transitions are handled by construction.
//! Every operation except zone resolution is total: local datetimes
//! that fall into a DST gap resolve forward to the earliest valid
//! instant, ambiguous ones take the earlier offset.

use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;

/// Resolve an IANA zone name.
pub fn resolve_zone(name: &str) -> Result<Tz, ScheduleError> {
    name.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimeZone(name.to_string()))
}

/// View an absolute instant as wall-clock in `tz`.
pub fn to_zone(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// The absolute instant of a zoned wall-clock.
pub fn to_instant(zoned: DateTime<Tz>) -> DateTime<Utc> {
    zoned.with_timezone(&Utc)
}

/// Resolve a naive local datetime in `tz`.
///
/// DST-gap times roll forward in 30-minute steps until a valid local
/// time is found; ambiguous times take the earlier instant.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    let mut candidate = naive;
    // Real-world gaps are at most a few hours (Lord Howe uses 30 min).
    for _ in 0..48 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earlier, _) => return earlier,
            LocalResult::None => {
                candidate += chrono::Duration::minutes(30);
            }
        }
    }
    // Unreachable for real zone data; pin to the UTC reading.
    tz.from_utc_datetime(&naive)
}

/// Midnight at the start of the zoned datetime's calendar day.
pub fn day_start(zoned: DateTime<Tz>) -> DateTime<Tz> {
    resolve_local(zoned.date_naive().and_time(NaiveTime::MIN), zoned.timezone())
}

/// Shift a zoned datetime by whole calendar days, preserving the
/// wall-clock time. Offsets re-resolve, so crossing a DST boundary
/// keeps the local reading rather than the absolute delta.
pub fn add_days(zoned: DateTime<Tz>, days: i64) -> DateTime<Tz> {
    let date = if days >= 0 {
        zoned.date_naive() + Days::new(days as u64)
    } else {
        zoned.date_naive() - Days::new(days.unsigned_abs())
    };
    resolve_local(date.and_time(zoned.time()), zoned.timezone())
}

/// Canonical `"YYYY-MM-DD"` key for blocked-dates sets.
pub fn date_key(zoned: DateTime<Tz>) -> String {
    zoned.format("%Y-%m-%d").to_string()
}

/// Minutes elapsed since the wall-clock midnight of the same day.
pub fn minutes_of_day(zoned: DateTime<Tz>) -> i64 {
    (zoned.hour() as i64) * 60 + zoned.minute() as i64
}

/// The instant at `minutes` past wall-clock midnight on the zoned
/// datetime's day.
pub fn at_minutes(zoned: DateTime<Tz>, minutes: i64) -> DateTime<Tz> {
    let time = NaiveTime::from_num_seconds_from_midnight_opt((minutes.max(0) as u32) * 60, 0)
        .unwrap_or(NaiveTime::MIN);
    resolve_local(zoned.date_naive().and_time(time), zoned.timezone())
}

/// Treat a range end lying exactly on wall-clock midnight in `tz` as
/// inclusive of that calendar day: advance it to the next day's
/// midnight. Any other end is returned unchanged.
///
/// This is the only end-of-range policy the engine applies, and it is
/// applied where per-day block state is derived, never to the stored
/// range itself.
pub fn normalize_range_end_inclusive(end: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = end.with_timezone(&tz);
    if local.time() == NaiveTime::MIN {
        let next = resolve_local(
            (local.date_naive() + Days::new(1)).and_time(NaiveTime::MIN),
            tz,
        );
        to_instant(next)
    } else {
        end
    }
}
