//! Working-calendar model: per-weekday windows with a default calendar
//! and a professional override overlay.

use chrono::Weekday;

use crate::model::professional::{parse_weekday, Professional};

/// Default working day: 09:00–17:00.
const DEFAULT_START_MINUTES: i64 = 9 * 60;
const DEFAULT_END_MINUTES: i64 = 17 * 60;

/// Resolved working hours for one weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingWindow {
    pub available: bool,
    /// Minutes from wall-clock midnight.
    pub start_minutes: i64,
    pub end_minutes: i64,
}

impl WorkingWindow {
    fn off() -> Self {
        Self {
            available: false,
            start_minutes: DEFAULT_START_MINUTES,
            end_minutes: DEFAULT_END_MINUTES,
        }
    }

    fn default_for(weekday: Weekday) -> Self {
        Self {
            available: !matches!(weekday, Weekday::Sat | Weekday::Sun),
            start_minutes: DEFAULT_START_MINUTES,
            end_minutes: DEFAULT_END_MINUTES,
        }
    }

    /// Window length in minutes; zero when unavailable.
    pub fn length_minutes(&self) -> i64 {
        if self.available {
            self.end_minutes - self.start_minutes
        } else {
            0
        }
    }

    pub fn start_time(&self) -> String {
        format_minutes(self.start_minutes)
    }

    pub fn end_time(&self) -> String {
        format_minutes(self.end_minutes)
    }
}

/// A full resolved calendar, one window per weekday.
#[derive(Debug, Clone)]
pub struct WorkCalendar {
    days: [WorkingWindow; 7],
}

impl WorkCalendar {
    /// The implementation-provided default: Monday–Friday 09:00–17:00.
    pub fn default_hours() -> Self {
        Self {
            days: std::array::from_fn(|i| WorkingWindow::default_for(weekday_from_index(i))),
        }
    }

    /// Overlay a professional's per-weekday overrides on the default.
    ///
    /// Missing weekdays keep the default. A day marked unavailable, or
    /// whose resolved start is not before its end, is unavailable.
    /// Unparseable override times fall back to the default field.
    pub fn for_professional(professional: &Professional) -> Self {
        let mut calendar = Self::default_hours();
        for (day_name, hours) in &professional.company_availability {
            let Some(weekday) = parse_weekday(day_name) else {
                tracing::warn!(day = %day_name, "ignoring availability override for unknown weekday");
                continue;
            };
            let idx = weekday.num_days_from_monday() as usize;
            let window = &mut calendar.days[idx];

            window.start_minutes = resolve_time(hours.start_time.as_deref(), window.start_minutes);
            window.end_minutes = resolve_time(hours.end_time.as_deref(), window.end_minutes);
            window.available =
                hours.available && window.start_minutes < window.end_minutes;
        }
        calendar
    }

    /// The calendar preparation runs on: default hours on weekdays,
    /// regardless of the professional's availability overrides.
    pub fn preparation() -> Self {
        Self::default_hours()
    }

    pub fn window(&self, weekday: Weekday) -> &WorkingWindow {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.window(weekday).available
    }
}

fn weekday_from_index(i: usize) -> Weekday {
    match i {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

fn resolve_time(raw: Option<&str>, fallback: i64) -> i64 {
    match raw {
        None => fallback,
        Some(s) => match parse_hhmm(s) {
            Some(minutes) => minutes,
            None => {
                tracing::warn!(time = %s, "unparseable working-hours time, keeping default");
                fallback
            }
        },
    }
}

/// Parse an `"HH:MM"` string into minutes from midnight.
pub fn parse_hhmm(s: &str) -> Option<i64> {
    let (h, m) = s.split_once(':')?;
    let hour: i64 = h.parse().ok()?;
    let minute: i64 = m.parse().ok()?;
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Format minutes from midnight as `"HH:MM"`.
pub fn format_minutes(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::professional::DayHours;
    use std::collections::HashMap;

    fn professional_with(availability: HashMap<String, DayHours>) -> Professional {
        Professional {
            id: "pro-1".into(),
            timezone: "UTC".into(),
            company_availability: availability,
            company_blocked_dates: Vec::new(),
            company_blocked_ranges: Vec::new(),
        }
    }

    #[test]
    fn default_is_weekdays_nine_to_five() {
        let cal = WorkCalendar::default_hours();
        assert!(cal.is_working_day(Weekday::Mon));
        assert!(cal.is_working_day(Weekday::Fri));
        assert!(!cal.is_working_day(Weekday::Sat));
        assert!(!cal.is_working_day(Weekday::Sun));
        assert_eq!(cal.window(Weekday::Wed).start_minutes, 540);
        assert_eq!(cal.window(Weekday::Wed).end_minutes, 1020);
        assert_eq!(cal.window(Weekday::Wed).start_time(), "09:00");
        assert_eq!(cal.window(Weekday::Wed).end_time(), "17:00");
        assert_eq!(cal.window(Weekday::Wed).length_minutes(), 480);
        assert_eq!(cal.window(Weekday::Sat).length_minutes(), 0);
    }

    #[test]
    fn override_changes_only_named_days() {
        let mut avail = HashMap::new();
        avail.insert(
            "Mon".to_string(),
            DayHours {
                available: true,
                start_time: Some("10:30".into()),
                end_time: Some("14:00".into()),
            },
        );
        avail.insert(
            "Sat".to_string(),
            DayHours {
                available: true,
                start_time: Some("09:00".into()),
                end_time: Some("12:00".into()),
            },
        );
        let cal = WorkCalendar::for_professional(&professional_with(avail));

        assert_eq!(cal.window(Weekday::Mon).start_minutes, 630);
        assert_eq!(cal.window(Weekday::Mon).end_minutes, 840);
        assert!(cal.is_working_day(Weekday::Sat));
        // Tuesday untouched.
        assert_eq!(cal.window(Weekday::Tue).start_minutes, 540);
    }

    #[test]
    fn inverted_window_is_unavailable() {
        let mut avail = HashMap::new();
        avail.insert(
            "Wed".to_string(),
            DayHours {
                available: true,
                start_time: Some("17:00".into()),
                end_time: Some("09:00".into()),
            },
        );
        let cal = WorkCalendar::for_professional(&professional_with(avail));
        assert!(!cal.is_working_day(Weekday::Wed));
    }

    #[test]
    fn unavailable_override_wins() {
        let mut avail = HashMap::new();
        avail.insert(
            "Mon".to_string(),
            DayHours {
                available: false,
                start_time: None,
                end_time: None,
            },
        );
        let cal = WorkCalendar::for_professional(&professional_with(avail));
        assert!(!cal.is_working_day(Weekday::Mon));
        // The preparation calendar ignores the override entirely.
        assert!(WorkCalendar::preparation().is_working_day(Weekday::Mon));
    }

    #[test]
    fn bad_time_string_keeps_default_field() {
        let mut avail = HashMap::new();
        avail.insert(
            "Thu".to_string(),
            DayHours {
                available: true,
                start_time: Some("25:99".into()),
                end_time: Some("16:00".into()),
            },
        );
        let cal = WorkCalendar::for_professional(&professional_with(avail));
        assert_eq!(cal.window(Weekday::Thu).start_minutes, 540);
        assert_eq!(cal.window(Weekday::Thu).end_minutes, 960);
    }

    #[test]
    fn hhmm_parsing() {
        assert_eq!(parse_hhmm("09:15"), Some(555));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("9"), None);
        assert_eq!(parse_hhmm("ab:cd"), None);
        assert_eq!(format_minutes(555), "09:15");
    }
}
