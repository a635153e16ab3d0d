//! Professional records: timezone, company working hours, company blocks.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Working-hours override for a single weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayHours {
    /// Whether the professional works this weekday at all.
    #[serde(default = "default_true")]
    pub available: bool,

    /// Day start as `"HH:MM"` wall-clock in the professional's zone.
    #[serde(default)]
    pub start_time: Option<String>,

    /// Day end as `"HH:MM"` wall-clock in the professional's zone.
    #[serde(default)]
    pub end_time: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A full-day company block, optionally flagged as a holiday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A blocked interval of absolute time.
///
/// Invariant: `start < end`. An `end` falling exactly on wall-clock
/// midnight in the owner's zone is treated as inclusive of that
/// calendar day when per-day block state is derived; the raw record is
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// The professional owning a project: calendar authority and company
/// block sources for every resource working under them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: String,

    /// IANA zone name; all wall-clock interpretation happens here.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Per-weekday overrides keyed `"Mon"`…`"Sun"`. Missing days fall
    /// back to the default calendar.
    #[serde(default)]
    pub company_availability: HashMap<String, DayHours>,

    #[serde(default)]
    pub company_blocked_dates: Vec<BlockedDate>,

    #[serde(default)]
    pub company_blocked_ranges: Vec<BlockedRange>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Parse a day abbreviation to a `chrono::Weekday`.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim() {
        "Mon" => Some(Weekday::Mon),
        "Tue" => Some(Weekday::Tue),
        "Wed" => Some(Weekday::Wed),
        "Thu" => Some(Weekday::Thu),
        "Fri" => Some(Weekday::Fri),
        "Sat" => Some(Weekday::Sat),
        "Sun" => Some(Weekday::Sun),
        _ => None,
    }
}
