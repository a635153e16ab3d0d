//! Proposal building: earliest bookable date, earliest feasible
//! window, and shortest-throughput window over a bounded forward scan.

use std::time::Instant;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::context::Prepared;
use crate::day_block::is_day_blocked;
use crate::model::DurationUnit;
use crate::slots::{day_slots, SlotMode, SlotQuery};
use crate::subset::{
    combination_count, find_first_eligible_subset_for_days, SubsetSearch, MAX_SUBSET_COMBINATIONS,
};
use crate::tz;
use crate::working_time::{
    advance_working_days, buffer_end, count_working_days_between, prep_end, DayEvaluator,
};

/// Outer forward-scan bound, in calendar days.
pub const MAX_SCAN_DAYS: u32 = 180;

/// A concrete feasible window. `start <= execution_end <= end`;
/// equality of the last two when no buffer applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalWindow {
    pub start: DateTime<Utc>,
    pub execution_end: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Result of the proposal scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleProposals {
    pub mode: DurationUnit,
    pub earliest_bookable_date: DateTime<Utc>,
    pub earliest_proposal: Option<ProposalWindow>,
    pub shortest_throughput_proposal: Option<ProposalWindow>,
}

pub(crate) fn build(
    prepared: &Prepared,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
    debug: bool,
) -> Option<ScheduleProposals> {
    // A pool too large to enumerate can never satisfy the policy:
    // fail closed before scanning 180 days of it.
    if prepared.policy.is_multi() {
        let combinations = combination_count(
            prepared.policy.ordered.len(),
            prepared.policy.min_resources,
        );
        if combinations > MAX_SUBSET_COMBINATIONS {
            tracing::warn!(
                resources = prepared.policy.ordered.len(),
                min_resources = prepared.policy.min_resources,
                "resource pool exceeds the subset enumeration cap; no proposals"
            );
            return None;
        }
    }

    let now_zoned = tz::to_zone(now, prepared.zone);
    let preparation_end = prep_end(
        now_zoned,
        prepared.durations.preparation.as_ref(),
        &prepared.holidays,
        prepared.zone,
    );

    match prepared.execution.unit {
        DurationUnit::Hours => build_hours(prepared, now, preparation_end, deadline, debug),
        DurationUnit::Days => build_days(prepared, preparation_end, deadline, debug),
    }
}

fn build_hours(
    prepared: &Prepared,
    now: DateTime<Utc>,
    preparation_end: DateTime<chrono_tz::Tz>,
    deadline: Option<Instant>,
    debug: bool,
) -> Option<ScheduleProposals> {
    let query = SlotQuery {
        execution_hours: prepared.execution.value,
        buffer: prepared.durations.buffer.as_ref(),
        not_before: Some(tz::to_instant(preparation_end)),
        now,
        calendar: &prepared.calendar,
        buffer_blocks: &prepared.buffer_merged,
        zone: prepared.zone,
        debug,
    };
    let mode = if prepared.policy.is_multi() {
        SlotMode::Multi {
            per_resource: &prepared.blocks.per_resource,
            ordered: &prepared.policy.ordered,
            min_resources: prepared.policy.min_resources,
            required_overlap: prepared.policy.required_overlap,
            deadline,
        }
    } else {
        SlotMode::Single {
            merged: &prepared.blocks.merged,
        }
    };

    let mut proposals = ScheduleProposals {
        mode: DurationUnit::Hours,
        earliest_bookable_date: tz::to_instant(tz::day_start(preparation_end)),
        earliest_proposal: None,
        shortest_throughput_proposal: None,
    };

    for offset in 0..=MAX_SCAN_DAYS {
        if deadline_passed(deadline) {
            break;
        }
        let current_day = tz::add_days(preparation_end, i64::from(offset));
        let slots = day_slots(current_day, &query, &mode);
        if debug {
            tracing::debug!(
                day = %tz::date_key(current_day),
                slots = slots.len(),
                "scanned hours-mode day"
            );
        }
        if let Some(first) = slots.into_iter().next() {
            proposals.earliest_bookable_date = tz::to_instant(tz::day_start(current_day));
            let window = ProposalWindow {
                start: first.start,
                execution_end: first.execution_end,
                end: first.buffer_end,
            };
            proposals.earliest_proposal = Some(window.clone());
            proposals.shortest_throughput_proposal = Some(window);
            break;
        }
    }
    Some(proposals)
}

fn build_days(
    prepared: &Prepared,
    preparation_end: DateTime<chrono_tz::Tz>,
    deadline: Option<Instant>,
    debug: bool,
) -> Option<ScheduleProposals> {
    let execution_days = prepared.execution.whole_days();
    let search_start = tz::day_start(preparation_end);

    let mut proposals = ScheduleProposals {
        mode: DurationUnit::Days,
        earliest_bookable_date: tz::to_instant(search_start),
        earliest_proposal: None,
        shortest_throughput_proposal: None,
    };
    let mut bookable_recorded = false;
    let mut best_throughput: Option<u32> = None;

    for offset in 0..=MAX_SCAN_DAYS {
        if deadline_passed(deadline) {
            break;
        }
        let day = tz::add_days(search_start, i64::from(offset));

        if prepared.policy.is_multi() {
            if !prepared.calendar.is_working_day(day.weekday()) {
                continue;
            }
            if prepared.company_blocks_start_day(day) {
                continue;
            }
            let search = find_first_eligible_subset_for_days(
                &prepared.policy.ordered,
                prepared.policy.min_resources,
                prepared.policy.required_overlap,
                day,
                execution_days,
                &prepared.blocks.per_resource,
                &prepared.calendar,
                prepared.zone,
                deadline,
            );
            if !matches!(search, SubsetSearch::Found(_)) {
                continue;
            }
        } else if is_day_blocked(day, &prepared.blocks.merged, &prepared.calendar, prepared.zone) {
            continue;
        }

        if !bookable_recorded {
            proposals.earliest_bookable_date = tz::to_instant(tz::day_start(day));
            bookable_recorded = true;
        }

        let evaluator = day_evaluator(prepared);
        let last_day = advance_working_days(
            day,
            execution_days,
            &evaluator,
            &prepared.calendar,
            prepared.zone,
        );
        let throughput = count_working_days_between(day, last_day, &prepared.calendar);
        if debug {
            tracing::debug!(
                day = %tz::date_key(day),
                throughput,
                "evaluated days-mode start day"
            );
        }

        let execution_end = tz::at_minutes(
            last_day,
            prepared.calendar.window(last_day.weekday()).end_minutes,
        );
        let window_end = buffer_end(
            execution_end,
            prepared.durations.buffer.as_ref(),
            DurationUnit::Days,
            &prepared.buffer_merged,
            &prepared.calendar,
            prepared.zone,
        );
        let window = ProposalWindow {
            start: tz::to_instant(tz::day_start(day)),
            execution_end: tz::to_instant(execution_end),
            end: tz::to_instant(window_end),
        };

        if proposals.earliest_proposal.is_none() && throughput <= execution_days * 2 {
            proposals.earliest_proposal = Some(window.clone());
        }
        let shortest_cutoff = f64::from(execution_days) * 1.2;
        if f64::from(throughput) <= shortest_cutoff
            && best_throughput.map_or(true, |best| throughput < best)
        {
            proposals.shortest_throughput_proposal = Some(window);
            best_throughput = Some(throughput);
        }

        if proposals.earliest_proposal.is_some() && proposals.shortest_throughput_proposal.is_some()
        {
            break;
        }
    }
    Some(proposals)
}

fn day_evaluator(prepared: &Prepared) -> DayEvaluator<'_> {
    if prepared.policy.is_multi() {
        DayEvaluator::MinAvailable {
            per_resource: &prepared.blocks.per_resource,
            ordered: &prepared.policy.ordered,
            min_resources: prepared.policy.min_resources,
        }
    } else {
        DayEvaluator::Merged(&prepared.blocks.merged)
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}
