//! Request-scoped resolution shared by the engine's operations.
//!
//! One `prepare` pass turns the caller's plain records into the
//! derived structures every downstream step reads: zone, calendars,
//! policy, and the aggregated block sets. Everything here is dropped
//! with the response.

use std::collections::{BTreeSet, HashMap};

use chrono_tz::Tz;

use crate::blocks::{self, AggregatedBlocks, BlockSet, BlockSources, HolidayCalendar};
use crate::calendar::WorkCalendar;
use crate::error::ScheduleError;
use crate::model::{
    Booking, CustomerBlocks, EffectiveDurations, Professional, Project, Resource, ResourcePolicy,
    WorkDuration,
};
use crate::tz;

/// The records one request operates on, loaded by the caller.
///
/// The engine never loads data itself; persistence is an external
/// collaborator and these are plain borrowed records.
pub struct ScheduleContext<'a> {
    pub project: &'a Project,
    pub professional: &'a Professional,
    pub resources: &'a HashMap<String, Resource>,
    pub bookings: &'a [Booking],
}

/// Everything derived from a request before searching.
pub(crate) struct Prepared {
    pub zone: Tz,
    pub calendar: WorkCalendar,
    pub holidays: HolidayCalendar,
    pub policy: ResourcePolicy,
    pub durations: EffectiveDurations,
    pub execution: WorkDuration,
    /// Blocks including customer restrictions (execution checks).
    pub blocks: AggregatedBlocks,
    /// Merged blocks without customer restrictions (buffer checks).
    pub buffer_merged: BlockSet,
    /// Company-only full-day keys, for the days-mode start-day veto.
    pub company_dates: BTreeSet<String>,
    /// Company-only ranges, same purpose.
    pub company_ranges: Vec<blocks::BlockSpan>,
}

pub(crate) fn prepare(
    ctx: &ScheduleContext<'_>,
    subproject_index: Option<usize>,
    customer: Option<&CustomerBlocks>,
) -> Result<Prepared, ScheduleError> {
    let zone = tz::resolve_zone(&ctx.professional.timezone)?;
    let durations = ctx.project.effective_durations(subproject_index);
    let execution = durations
        .execution
        .ok_or(ScheduleError::MissingExecutionDuration)?;

    let policy = ResourcePolicy::resolve(ctx.project, ctx.resources);
    if policy.ordered.is_empty() {
        return Err(ScheduleError::NoResources);
    }

    let calendar = WorkCalendar::for_professional(ctx.professional);
    let holidays = HolidayCalendar::from_professional(ctx.professional, zone);

    let sources = BlockSources {
        project_id: &ctx.project.id,
        professional: ctx.professional,
        resources: ctx.resources,
        ordered: &policy.ordered,
        bookings: ctx.bookings,
        customer,
    };
    let blocks = blocks::aggregate(&sources, zone, true);
    let buffer_merged = blocks::aggregate(&sources, zone, false).merged;

    let company_dates = ctx
        .professional
        .company_blocked_dates
        .iter()
        .map(|d| blocks::naive_date_key(d.date))
        .collect();
    let company_ranges = ctx
        .professional
        .company_blocked_ranges
        .iter()
        .filter(|r| r.start < r.end)
        .map(|r| blocks::BlockSpan {
            start: r.start,
            end: r.end,
            reason: r.reason.clone(),
        })
        .collect();

    Ok(Prepared {
        zone,
        calendar,
        holidays,
        policy,
        durations,
        execution,
        blocks,
        buffer_merged,
        company_dates,
        company_ranges,
    })
}

impl Prepared {
    /// Whether a days-mode start day is vetoed by company-level blocks
    /// (personal and customer blocks do not veto start days; they are
    /// accounted for by the window-level overlap percentage).
    pub fn company_blocks_start_day(&self, day: chrono::DateTime<Tz>) -> bool {
        if self.company_dates.contains(&tz::date_key(day)) {
            return true;
        }
        let start = tz::to_instant(tz::day_start(day));
        let end = tz::to_instant(tz::add_days(tz::day_start(day), 1));
        self.company_ranges
            .iter()
            .any(|span| span.overlaps(start, end, self.zone))
    }
}
