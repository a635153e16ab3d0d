//! Block aggregation: build the merged and per-resource block sets for
//! one request from company data, personal data, live bookings, and
//! customer-supplied blocks.
//!
//! All derived sets are request-scoped and discarded with the response.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::calendar::parse_hhmm;
use crate::model::{Booking, CustomerBlocks, Professional, Resource};
use crate::tz;

/// Stable reason code for a booking's execution range.
pub const REASON_BOOKING: &str = "booking";
/// Stable reason code for a booking's buffer range.
pub const REASON_BOOKING_BUFFER: &str = "booking-buffer";
/// Stable reason code for customer-supplied blocks.
pub const REASON_CUSTOMER_BLOCK: &str = "customer-block";

/// A blocked interval with its provenance reason.
#[derive(Debug, Clone, Serialize)]
pub struct BlockSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: Option<String>,
}

impl BlockSpan {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>, reason: Option<String>) -> Option<Self> {
        // start < end is an invariant of every source; drop violations
        // rather than letting a reversed range poison the sweep.
        if start < end {
            Some(Self { start, end, reason })
        } else {
            None
        }
    }

    /// Whether this span intersects `[start, end)`, with the
    /// midnight-inclusive end normalization applied to the span.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> bool {
        let span_end = tz::normalize_range_end_inclusive(self.end, zone);
        self.start < end && start < span_end
    }
}

/// Whether any span in the slice intersects `[start, end)`.
pub fn any_overlap(spans: &[BlockSpan], start: DateTime<Utc>, end: DateTime<Utc>, zone: Tz) -> bool {
    spans.iter().any(|s| s.overlaps(start, end, zone))
}

/// Full-day keys plus blocked intervals for one availability scope.
#[derive(Debug, Clone, Default)]
pub struct BlockSet {
    /// `"YYYY-MM-DD"` keys in the professional's zone.
    pub dates: BTreeSet<String>,
    pub ranges: Vec<BlockSpan>,
}

/// Per-resource derived blocks.
#[derive(Debug, Clone, Default)]
pub struct ResourceBlocks {
    /// Everything that blocks this resource: inherited company and
    /// customer blocks plus personal and booking-attributed ones.
    pub all: BlockSet,
    /// Only the resource's own ranges (personal + booking-attributed).
    /// Buffer feasibility checks look at these; inherited customer
    /// blocks never constrain buffers.
    pub personal_ranges: Vec<BlockSpan>,
}

/// The two shapes block aggregation produces for a request.
#[derive(Debug, Clone, Default)]
pub struct AggregatedBlocks {
    /// Strict-intersection view: union of every block source over every
    /// listed resource.
    pub merged: BlockSet,
    pub per_resource: HashMap<String, ResourceBlocks>,
}

/// Company holiday data, used by preparation walking.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: BTreeSet<String>,
    ranges: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl HolidayCalendar {
    pub fn from_professional(professional: &Professional, zone: Tz) -> Self {
        let dates = professional
            .company_blocked_dates
            .iter()
            .filter(|d| d.is_holiday)
            .map(|d| naive_date_key(d.date))
            .collect();
        let ranges = professional
            .company_blocked_ranges
            .iter()
            .filter(|r| r.is_holiday && r.start < r.end)
            .map(|r| (r.start, tz::normalize_range_end_inclusive(r.end, zone)))
            .collect();
        Self { dates, ranges }
    }

    /// Whether the zoned day is holiday-flagged.
    pub fn is_holiday(&self, day: DateTime<Tz>) -> bool {
        if self.dates.contains(&tz::date_key(day)) {
            return true;
        }
        let start = tz::to_instant(tz::day_start(day));
        let end = tz::to_instant(tz::add_days(tz::day_start(day), 1));
        self.ranges.iter().any(|(s, e)| *s < end && start < *e)
    }
}

/// Canonical date key for a naive calendar date.
pub fn naive_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Everything block aggregation reads for one request.
pub struct BlockSources<'a> {
    pub project_id: &'a str,
    pub professional: &'a Professional,
    pub resources: &'a HashMap<String, Resource>,
    /// Resolved resource order from the policy.
    pub ordered: &'a [String],
    pub bookings: &'a [Booking],
    pub customer: Option<&'a CustomerBlocks>,
}

/// Build merged and per-resource block sets.
///
/// `include_customer` is false for buffer arithmetic: customer blocks
/// veto execution time but are not honored when placing buffers.
pub fn aggregate(sources: &BlockSources<'_>, zone: Tz, include_customer: bool) -> AggregatedBlocks {
    let mut base = BlockSet::default();

    for blocked in &sources.professional.company_blocked_dates {
        base.dates.insert(naive_date_key(blocked.date));
    }
    for range in &sources.professional.company_blocked_ranges {
        if let Some(span) = BlockSpan::new(range.start, range.end, range.reason.clone()) {
            base.ranges.push(span);
        }
    }

    if include_customer {
        if let Some(customer) = sources.customer {
            append_customer_blocks(&mut base, customer, zone);
        }
    }

    // Base (company + customer) is inherited by the merged set and by
    // every per-resource entry.
    let mut merged = base.clone();
    let mut per_resource: HashMap<String, ResourceBlocks> = sources
        .ordered
        .iter()
        .map(|id| {
            (
                id.clone(),
                ResourceBlocks {
                    all: base.clone(),
                    personal_ranges: Vec::new(),
                },
            )
        })
        .collect();

    for id in sources.ordered {
        let Some(resource) = sources.resources.get(id) else {
            continue;
        };
        let Some(entry) = per_resource.get_mut(id) else {
            continue;
        };

        for blocked in &resource.blocked_dates {
            let key = naive_date_key(blocked.date);
            entry.all.dates.insert(key.clone());
            merged.dates.insert(key);
        }
        for range in &resource.blocked_ranges {
            if let Some(span) = BlockSpan::new(range.start, range.end, range.reason.clone()) {
                entry.all.ranges.push(span.clone());
                entry.personal_ranges.push(span.clone());
                merged.ranges.push(span);
            }
        }
    }

    for booking in sources.bookings {
        if !booking.occupies_time() {
            continue;
        }
        let spans = booking_spans(booking);
        for id in sources.ordered {
            if !booking.blocks_resource(id, sources.project_id) {
                continue;
            }
            let Some(entry) = per_resource.get_mut(id) else {
                continue;
            };
            for span in &spans {
                entry.all.ranges.push(span.clone());
                entry.personal_ranges.push(span.clone());
            }
        }
        if sources
            .ordered
            .iter()
            .any(|id| booking.blocks_resource(id, sources.project_id))
        {
            merged.ranges.extend(spans);
        }
    }

    AggregatedBlocks {
        merged,
        per_resource,
    }
}

fn booking_spans(booking: &Booking) -> Vec<BlockSpan> {
    let mut spans = Vec::new();
    let Some(start) = booking.start_date else {
        return spans;
    };
    let Some(execution_end) = booking.execution_end_date.or(booking.buffer_end_date) else {
        return spans;
    };

    if let Some(span) = BlockSpan::new(start, execution_end, Some(REASON_BOOKING.to_string())) {
        spans.push(span);
    }
    if let (Some(exec_end), Some(buffer_end)) =
        (booking.execution_end_date, booking.buffer_end_date)
    {
        if let Some(span) =
            BlockSpan::new(exec_end, buffer_end, Some(REASON_BOOKING_BUFFER.to_string()))
        {
            spans.push(span);
        }
    }
    spans
}

fn append_customer_blocks(set: &mut BlockSet, customer: &CustomerBlocks, zone: Tz) {
    for date in &customer.dates {
        set.dates.insert(naive_date_key(*date));
    }
    for window in &customer.windows {
        let (Some(start_min), Some(end_min)) =
            (parse_hhmm(&window.start_time), parse_hhmm(&window.end_time))
        else {
            tracing::warn!(
                date = %window.date,
                start = %window.start_time,
                end = %window.end_time,
                "skipping customer window with unparseable times"
            );
            continue;
        };
        let day = tz::resolve_local(window.date.and_time(chrono::NaiveTime::MIN), zone);
        let start = tz::to_instant(tz::at_minutes(day, start_min));
        let end = tz::to_instant(tz::at_minutes(day, end_min));
        if let Some(span) = BlockSpan::new(start, end, Some(REASON_CUSTOMER_BLOCK.to_string())) {
            set.ranges.push(span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BookingStatus, CustomerWindow};

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn zone() -> Tz {
        "Europe/Brussels".parse().unwrap()
    }

    fn professional() -> Professional {
        Professional {
            id: "pro-1".into(),
            timezone: "Europe/Brussels".into(),
            company_availability: Default::default(),
            company_blocked_dates: Vec::new(),
            company_blocked_ranges: Vec::new(),
        }
    }

    fn resource_map(ids: &[&str]) -> HashMap<String, Resource> {
        ids.iter()
            .map(|id| (id.to_string(), Resource::new(*id)))
            .collect()
    }

    fn sources<'a>(
        professional: &'a Professional,
        resources: &'a HashMap<String, Resource>,
        ordered: &'a [String],
        bookings: &'a [Booking],
        customer: Option<&'a CustomerBlocks>,
    ) -> BlockSources<'a> {
        BlockSources {
            project_id: "p-1",
            professional,
            resources,
            ordered,
            bookings,
            customer,
        }
    }

    #[test]
    fn customer_blocks_inherited_by_every_resource() {
        let pro = professional();
        let resources = resource_map(&["a", "b"]);
        let ordered = vec!["a".to_string(), "b".to_string()];
        let customer = CustomerBlocks {
            dates: vec!["2025-06-04".parse().unwrap()],
            windows: vec![CustomerWindow {
                date: "2025-06-05".parse().unwrap(),
                start_time: "10:00".into(),
                end_time: "12:00".into(),
            }],
        };

        let agg = aggregate(
            &sources(&pro, &resources, &ordered, &[], Some(&customer)),
            zone(),
            true,
        );

        for id in ["a", "b"] {
            let entry = &agg.per_resource[id];
            assert!(entry.all.dates.contains("2025-06-04"));
            assert_eq!(entry.all.ranges.len(), 1);
            assert_eq!(
                entry.all.ranges[0].reason.as_deref(),
                Some(REASON_CUSTOMER_BLOCK)
            );
            // Inherited blocks are not personal.
            assert!(entry.personal_ranges.is_empty());
        }
        assert!(agg.merged.dates.contains("2025-06-04"));
        // 10:00 Brussels in June is 08:00 UTC.
        assert_eq!(agg.merged.ranges[0].start, utc("2025-06-05T08:00:00Z"));
        assert_eq!(agg.merged.ranges[0].end, utc("2025-06-05T10:00:00Z"));
    }

    #[test]
    fn customer_blocks_omitted_for_buffer_arithmetic() {
        let pro = professional();
        let resources = resource_map(&["a"]);
        let ordered = vec!["a".to_string()];
        let customer = CustomerBlocks {
            dates: vec!["2025-06-04".parse().unwrap()],
            windows: Vec::new(),
        };

        let agg = aggregate(
            &sources(&pro, &resources, &ordered, &[], Some(&customer)),
            zone(),
            false,
        );
        assert!(agg.merged.dates.is_empty());
        assert!(agg.per_resource["a"].all.dates.is_empty());
    }

    #[test]
    fn booking_contributes_execution_and_buffer_spans() {
        let pro = professional();
        let resources = resource_map(&["a", "b"]);
        let ordered = vec!["a".to_string(), "b".to_string()];
        let bookings = vec![Booking {
            id: "b-1".into(),
            project_id: None,
            professional: None,
            status: BookingStatus::Confirmed,
            start_date: Some(utc("2025-06-02T07:00:00Z")),
            execution_end_date: Some(utc("2025-06-02T15:00:00Z")),
            buffer_end_date: Some(utc("2025-06-03T15:00:00Z")),
            assigned_team_members: vec!["a".into()],
        }];

        let agg = aggregate(
            &sources(&pro, &resources, &ordered, &bookings, None),
            zone(),
            true,
        );

        let a = &agg.per_resource["a"];
        assert_eq!(a.personal_ranges.len(), 2);
        assert_eq!(a.personal_ranges[0].reason.as_deref(), Some(REASON_BOOKING));
        assert_eq!(
            a.personal_ranges[1].reason.as_deref(),
            Some(REASON_BOOKING_BUFFER)
        );
        // b is not on the booking's team.
        assert!(agg.per_resource["b"].personal_ranges.is_empty());
        // but the strict-intersection view carries it.
        assert_eq!(agg.merged.ranges.len(), 2);
    }

    #[test]
    fn project_targeted_booking_blocks_all_resources() {
        let pro = professional();
        let resources = resource_map(&["a", "b"]);
        let ordered = vec!["a".to_string(), "b".to_string()];
        let bookings = vec![Booking {
            id: "b-1".into(),
            project_id: Some("p-1".into()),
            professional: None,
            status: BookingStatus::Pending,
            start_date: Some(utc("2025-06-02T07:00:00Z")),
            execution_end_date: Some(utc("2025-06-02T15:00:00Z")),
            buffer_end_date: None,
            assigned_team_members: Vec::new(),
        }];

        let agg = aggregate(
            &sources(&pro, &resources, &ordered, &bookings, None),
            zone(),
            true,
        );
        assert_eq!(agg.per_resource["a"].personal_ranges.len(), 1);
        assert_eq!(agg.per_resource["b"].personal_ranges.len(), 1);
    }

    #[test]
    fn completed_bookings_are_ignored() {
        let pro = professional();
        let resources = resource_map(&["a"]);
        let ordered = vec!["a".to_string()];
        let bookings = vec![Booking {
            id: "b-1".into(),
            project_id: Some("p-1".into()),
            professional: None,
            status: BookingStatus::Completed,
            start_date: Some(utc("2025-06-02T07:00:00Z")),
            execution_end_date: Some(utc("2025-06-02T15:00:00Z")),
            buffer_end_date: None,
            assigned_team_members: Vec::new(),
        }];

        let agg = aggregate(
            &sources(&pro, &resources, &ordered, &bookings, None),
            zone(),
            true,
        );
        assert!(agg.merged.ranges.is_empty());
    }

    #[test]
    fn holiday_calendar_flags_dates_and_ranges() {
        let mut pro = professional();
        pro.company_blocked_dates.push(crate::model::BlockedDate {
            date: "2025-06-06".parse().unwrap(),
            is_holiday: true,
            reason: None,
        });
        pro.company_blocked_dates.push(crate::model::BlockedDate {
            date: "2025-06-12".parse().unwrap(),
            is_holiday: false,
            reason: None,
        });
        // Holiday range covering Jun 9, end at Brussels midnight ⇒
        // inclusive of Jun 10 as well.
        pro.company_blocked_ranges.push(crate::model::BlockedRange {
            start: utc("2025-06-08T22:00:00Z"),
            end: utc("2025-06-09T22:00:00Z"),
            is_holiday: true,
            reason: None,
        });

        let holidays = HolidayCalendar::from_professional(&pro, zone());
        let day = |s: &str| tz::to_zone(utc(s), zone());
        assert!(holidays.is_holiday(day("2025-06-06T10:00:00Z")));
        // Blocked-but-not-holiday dates stay out.
        assert!(!holidays.is_holiday(day("2025-06-12T10:00:00Z")));
        assert!(holidays.is_holiday(day("2025-06-09T10:00:00Z")));
        // Midnight-inclusive normalization pulls Jun 10 in.
        assert!(holidays.is_holiday(day("2025-06-10T10:00:00Z")));
        assert!(!holidays.is_holiday(day("2025-06-11T10:00:00Z")));
    }

    #[test]
    fn span_overlap_uses_inclusive_midnight_end() {
        let span = BlockSpan {
            start: utc("2025-06-02T22:00:00Z"),
            // Brussels midnight June 4th.
            end: utc("2025-06-03T22:00:00Z"),
            reason: None,
        };
        // June 4th working morning would be clear under exclusive-end
        // reading; inclusive normalization blocks it.
        assert!(span.overlaps(
            utc("2025-06-04T07:00:00Z"),
            utc("2025-06-04T09:00:00Z"),
            zone()
        ));
        // June 5th is out either way.
        assert!(!span.overlaps(
            utc("2025-06-05T07:00:00Z"),
            utc("2025-06-05T09:00:00Z"),
            zone()
        ));
    }
}
