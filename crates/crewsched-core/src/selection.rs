//! Selection validation and concrete window building for a customer's
//! chosen start.
//!
//! Validation returns an outcome record with a reason string; only
//! malformed inputs and unresolvable references are errors. The window
//! builder runs the same checks and emits the scheduled interval plus
//! the assigned team.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{format_minutes, parse_hhmm};
use crate::context::{prepare, Prepared, ScheduleContext};
use crate::day_block::is_day_blocked;
use crate::error::ScheduleError;
use crate::model::{
    Booking, CustomerBlocks, DurationUnit, Professional, Project, Resource, WorkDuration,
};
use crate::slots::{day_slots, SlotMode, SlotQuery};
use crate::subset::{
    best_days_overlap, combination_count, find_first_eligible_subset_for_days, SubsetSearch,
    MAX_SUBSET_COMBINATIONS,
};
use crate::tz;
use crate::working_time::{advance_working_days, buffer_end, prep_end, DayEvaluator};

/// Lookup view over the caller's records for selection operations.
pub struct SchedulingData<'a> {
    pub projects: &'a HashMap<String, Project>,
    pub professionals: &'a HashMap<String, Professional>,
    pub resources: &'a HashMap<String, Resource>,
    pub bookings: &'a [Booking],
}

/// A customer's concrete start selection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionRequest {
    pub project_id: String,
    #[serde(default)]
    pub subproject_index: Option<usize>,
    /// `"YYYY-MM-DD"` in the professional's zone; absent means no-op.
    #[serde(default)]
    pub start_date: Option<String>,
    /// `"HH:MM"` wall-clock; required in hours mode.
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub customer_blocks: Option<CustomerBlocks>,
}

/// Validation outcome; `reason` is set exactly when invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

impl SelectionOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

pub const REASON_NOT_WORKING_DAY: &str = "Selected date is not a working day";
pub const REASON_BEFORE_PREP: &str = "Selected start is before the preparation lead time";
pub const REASON_DATE_BLOCKED: &str = "Selected date is blocked";
pub const REASON_TIME_UNAVAILABLE: &str = "Selected time is not available";
pub const REASON_TEAM_TIME: &str = "Selected time does not meet team availability requirements";
pub const REASON_TEAM_DAY: &str = "Selected date does not have enough team members available";
pub const REASON_POLICY: &str = "Not enough resources satisfy the scheduling policy";

fn team_overlap_reason(best: f64, required: u32) -> String {
    format!(
        "Team availability ({}%) is below required {required}%",
        best.round() as i64
    )
}

/// The concrete scheduled interval produced for a valid selection.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledWindow {
    pub scheduled_start_date: DateTime<Utc>,
    pub scheduled_execution_end_date: DateTime<Utc>,
    /// Equals the execution end when no buffer applies.
    pub scheduled_buffer_start_date: DateTime<Utc>,
    pub scheduled_buffer_end_date: DateTime<Utc>,
    pub scheduled_buffer_unit: Option<DurationUnit>,
    /// `"HH:MM"` wall-clock start; hours mode only.
    pub scheduled_start_time: Option<String>,
    pub scheduled_end_time: Option<String>,
    pub assigned_team_members: Vec<String>,
}

/// What a successful check pass knows about the selection.
struct Placement {
    start: DateTime<Utc>,
    execution_end_zoned: DateTime<chrono_tz::Tz>,
    start_time: Option<String>,
    end_time: Option<String>,
    team: Vec<String>,
}

enum Checked {
    Rejected(SelectionOutcome),
    Accepted(Placement),
}

pub(crate) fn validate(
    data: &SchedulingData<'_>,
    request: &SelectionRequest,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
    debug: bool,
) -> Result<SelectionOutcome, ScheduleError> {
    let Some(raw_date) = request.start_date.as_deref() else {
        return Ok(SelectionOutcome::valid());
    };
    let prepared = resolve(data, request)?;
    match check(&prepared, request, raw_date, now, deadline, debug)? {
        Checked::Rejected(outcome) => Ok(outcome),
        Checked::Accepted(_) => Ok(SelectionOutcome::valid()),
    }
}

pub(crate) fn build_window(
    data: &SchedulingData<'_>,
    request: &SelectionRequest,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
    debug: bool,
) -> Result<Option<ScheduledWindow>, ScheduleError> {
    let Some(raw_date) = request.start_date.as_deref() else {
        return Ok(None);
    };
    let prepared = resolve(data, request)?;
    let placement = match check(&prepared, request, raw_date, now, deadline, debug)? {
        Checked::Rejected(outcome) => {
            if debug {
                tracing::debug!(reason = ?outcome.reason, "selection rejected, no window");
            }
            return Ok(None);
        }
        Checked::Accepted(placement) => placement,
    };

    let buffer = prepared.durations.buffer.filter(|b| !b.is_zero());
    let execution_end = tz::to_instant(placement.execution_end_zoned);
    let (buffer_start, buffer_end_instant) = match buffer.as_ref() {
        None => (execution_end, execution_end),
        Some(b) => {
            let start = buffer_start_for(placement.execution_end_zoned, prepared.execution, b);
            let end = buffer_end(
                placement.execution_end_zoned,
                Some(b),
                prepared.execution.unit,
                &prepared.buffer_merged,
                &prepared.calendar,
                prepared.zone,
            );
            (tz::to_instant(start), tz::to_instant(end))
        }
    };

    let team = if placement.team.is_empty() {
        prepared.policy.ordered.clone()
    } else {
        placement.team
    };

    Ok(Some(ScheduledWindow {
        scheduled_start_date: placement.start,
        scheduled_execution_end_date: execution_end,
        scheduled_buffer_start_date: buffer_start,
        scheduled_buffer_end_date: buffer_end_instant,
        scheduled_buffer_unit: buffer.map(|b| b.unit),
        scheduled_start_time: placement.start_time,
        scheduled_end_time: placement.end_time,
        assigned_team_members: team,
    }))
}

fn buffer_start_for(
    execution_end: DateTime<chrono_tz::Tz>,
    execution: WorkDuration,
    buffer: &WorkDuration,
) -> DateTime<chrono_tz::Tz> {
    if execution.unit == DurationUnit::Hours && buffer.unit == DurationUnit::Hours {
        execution_end
    } else {
        tz::day_start(tz::add_days(execution_end, 1))
    }
}

fn resolve(
    data: &SchedulingData<'_>,
    request: &SelectionRequest,
) -> Result<Prepared, ScheduleError> {
    let project = data
        .projects
        .get(&request.project_id)
        .ok_or_else(|| ScheduleError::ProjectNotFound(request.project_id.clone()))?;
    let professional = data
        .professionals
        .get(&project.professional_id)
        .ok_or_else(|| ScheduleError::ProfessionalNotFound(project.professional_id.clone()))?;
    let ctx = ScheduleContext {
        project,
        professional,
        resources: data.resources,
        bookings: data.bookings,
    };
    prepare(&ctx, request.subproject_index, request.customer_blocks.as_ref())
}

fn check(
    prepared: &Prepared,
    request: &SelectionRequest,
    raw_date: &str,
    now: DateTime<Utc>,
    deadline: Option<Instant>,
    debug: bool,
) -> Result<Checked, ScheduleError> {
    let date: NaiveDate = raw_date
        .parse()
        .map_err(|_| ScheduleError::InvalidStartDate(raw_date.to_string()))?;

    if prepared.policy.is_multi() {
        let combinations = combination_count(
            prepared.policy.ordered.len(),
            prepared.policy.min_resources,
        );
        if combinations > MAX_SUBSET_COMBINATIONS {
            tracing::warn!(
                resources = prepared.policy.ordered.len(),
                min_resources = prepared.policy.min_resources,
                "resource pool exceeds the subset enumeration cap; selection rejected"
            );
            return Ok(Checked::Rejected(SelectionOutcome::invalid(REASON_POLICY)));
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
        DurationUnit::Hours => {
            check_hours(prepared, request, date, now, preparation_end, deadline, debug)
        }
        DurationUnit::Days => Ok(check_days(prepared, date, preparation_end, deadline)),
    }
}

#[allow(clippy::too_many_arguments)]
fn check_hours(
    prepared: &Prepared,
    request: &SelectionRequest,
    date: NaiveDate,
    now: DateTime<Utc>,
    preparation_end: DateTime<chrono_tz::Tz>,
    deadline: Option<Instant>,
    debug: bool,
) -> Result<Checked, ScheduleError> {
    let raw_time = request
        .start_time
        .as_deref()
        .ok_or_else(|| ScheduleError::InvalidStartTime("missing".to_string()))?;
    let minutes = parse_hhmm(raw_time)
        .ok_or_else(|| ScheduleError::InvalidStartTime(raw_time.to_string()))?;
    let wanted = format_minutes(minutes);

    let day = tz::resolve_local(date.and_time(NaiveTime::MIN), prepared.zone);
    let selected = tz::at_minutes(day, minutes);
    if tz::to_instant(selected) < tz::to_instant(preparation_end) {
        return Ok(Checked::Rejected(SelectionOutcome::invalid(
            REASON_BEFORE_PREP,
        )));
    }

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

    let slots = day_slots(day, &query, &mode);
    match slots.into_iter().find(|s| s.start_time == wanted) {
        Some(slot) => {
            let execution_minutes = (prepared.execution.value * 60.0).round() as i64;
            let execution_end_zoned = tz::at_minutes(day, minutes + execution_minutes);
            Ok(Checked::Accepted(Placement {
                start: slot.start,
                execution_end_zoned,
                start_time: Some(slot.start_time.clone()),
                end_time: Some(format_minutes(minutes + execution_minutes)),
                team: slot.team,
            }))
        }
        None => {
            let reason = if prepared.policy.is_multi() {
                REASON_TEAM_TIME
            } else {
                REASON_TIME_UNAVAILABLE
            };
            Ok(Checked::Rejected(SelectionOutcome::invalid(reason)))
        }
    }
}

fn check_days(
    prepared: &Prepared,
    date: NaiveDate,
    preparation_end: DateTime<chrono_tz::Tz>,
    deadline: Option<Instant>,
) -> Checked {
    let day = tz::resolve_local(date.and_time(NaiveTime::MIN), prepared.zone);
    if tz::day_start(day) < tz::day_start(preparation_end) {
        return Checked::Rejected(SelectionOutcome::invalid(REASON_BEFORE_PREP));
    }
    let execution_days = prepared.execution.whole_days();

    let team = if prepared.policy.is_multi() {
        if !prepared.calendar.is_working_day(day.weekday()) {
            return Checked::Rejected(SelectionOutcome::invalid(REASON_NOT_WORKING_DAY));
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
        match search {
            SubsetSearch::Found(team) => team,
            SubsetSearch::CapExceeded => {
                return Checked::Rejected(SelectionOutcome::invalid(REASON_POLICY));
            }
            SubsetSearch::NotFound => {
                let outcome = match best_days_overlap(
                    &prepared.policy.ordered,
                    prepared.policy.min_resources,
                    day,
                    execution_days,
                    &prepared.blocks.per_resource,
                    &prepared.calendar,
                    prepared.zone,
                ) {
                    Some(best) => SelectionOutcome::invalid(team_overlap_reason(
                        best,
                        prepared.policy.required_overlap,
                    )),
                    None => SelectionOutcome::invalid(REASON_TEAM_DAY),
                };
                return Checked::Rejected(outcome);
            }
        }
    } else {
        if is_day_blocked(day, &prepared.blocks.merged, &prepared.calendar, prepared.zone) {
            return Checked::Rejected(SelectionOutcome::invalid(REASON_DATE_BLOCKED));
        }
        Vec::new()
    };

    let evaluator = if prepared.policy.is_multi() {
        DayEvaluator::MinAvailable {
            per_resource: &prepared.blocks.per_resource,
            ordered: &prepared.policy.ordered,
            min_resources: prepared.policy.min_resources,
        }
    } else {
        DayEvaluator::Merged(&prepared.blocks.merged)
    };
    let last_day = advance_working_days(
        day,
        execution_days,
        &evaluator,
        &prepared.calendar,
        prepared.zone,
    );
    let execution_end_zoned = tz::at_minutes(
        last_day,
        prepared.calendar.window(last_day.weekday()).end_minutes,
    );

    Checked::Accepted(Placement {
        start: tz::to_instant(tz::day_start(day)),
        execution_end_zoned,
        start_time: None,
        end_time: None,
        team,
    })
}
