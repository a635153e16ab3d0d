//! Multi-resource scheduling engine.
//!
//! Computes, for a project with execution/preparation/buffer durations
//! over a professional's working calendar and layered block sources:
//! the earliest bookable start, the earliest feasible execution
//! window, the shortest-throughput window, and the validation of a
//! customer's concrete start selection.
//!
//! The engine is a pure library: inputs and outputs are plain records,
//! loading and committing are the caller's responsibility, and nothing
//! here suspends or mutates shared state. Concurrent calls over the
//! same records are safe; a booking commit must re-validate under a
//! transactional write.
//!
//! # Hard limits
//!
//! Searches are bounded rather than open-ended: the forward scan stops
//! after 180 days, day walks after 732 iterations, and subset
//! enumeration refuses pools with more than 10,000 combinations of
//! `min_resources` out of the resource list. The subset cap is a hard
//! contract: projects advertising very large pools must tune
//! `min_resources` down or the engine will not schedule them.

pub mod blocks;
pub mod calendar;
mod context;
pub mod day_block;
pub mod error;
pub mod model;
pub mod options;
pub mod overlap;
pub mod proposals;
pub mod selection;
pub mod slots;
pub mod subset;
pub mod tz;
pub mod working_time;

use std::time::Instant;

use chrono::{DateTime, Utc};

pub use context::ScheduleContext;
pub use error::ScheduleError;
pub use model::{
    Booking, BookingStatus, CustomerBlocks, CustomerWindow, DurationUnit, Professional, Project,
    Resource, Subproject, WorkDuration,
};
pub use options::EngineOptions;
pub use proposals::{ProposalWindow, ScheduleProposals};
pub use selection::{
    ScheduledWindow, SchedulingData, SelectionOutcome, SelectionRequest,
};

/// The scheduling engine. Cheap to construct; holds only the options
/// captured at creation.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Construct with options read from the process environment.
    pub fn from_env() -> Self {
        Self::new(EngineOptions::from_env())
    }

    /// Compute schedule proposals for a project.
    ///
    /// Returns `Ok(None)` when the project has no execution duration
    /// or no schedulable resources, or when the resource pool exceeds
    /// the subset enumeration cap. `deadline` bounds the search; on
    /// expiry the proposals found so far are returned.
    pub fn build_proposals(
        &self,
        ctx: &ScheduleContext<'_>,
        subproject_index: Option<usize>,
        customer_blocks: Option<&CustomerBlocks>,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<Option<ScheduleProposals>, ScheduleError> {
        let prepared = match context::prepare(ctx, subproject_index, customer_blocks) {
            Ok(prepared) => prepared,
            Err(ScheduleError::MissingExecutionDuration | ScheduleError::NoResources) => {
                return Ok(None)
            }
            Err(err) => return Err(err),
        };
        Ok(proposals::build(&prepared, now, deadline, self.options.debug))
    }

    /// The earliest bookable date alone, without the window search's
    /// full output.
    pub fn earliest_bookable_date(
        &self,
        ctx: &ScheduleContext<'_>,
        subproject_index: Option<usize>,
        customer_blocks: Option<&CustomerBlocks>,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<Option<DateTime<Utc>>, ScheduleError> {
        Ok(self
            .build_proposals(ctx, subproject_index, customer_blocks, now, deadline)?
            .map(|p| p.earliest_bookable_date))
    }

    /// Validate a customer's start selection against policy.
    ///
    /// Policy rejections come back as `SelectionOutcome { valid:
    /// false, reason }`; malformed inputs and unresolvable references
    /// are errors.
    pub fn validate_selection(
        &self,
        data: &SchedulingData<'_>,
        request: &SelectionRequest,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<SelectionOutcome, ScheduleError> {
        selection::validate(data, request, now, deadline, self.options.debug)
    }

    /// Build the concrete scheduled window for a valid selection.
    ///
    /// `None` on any precondition failure; call
    /// [`Engine::validate_selection`] first for a reason string.
    pub fn build_window(
        &self,
        data: &SchedulingData<'_>,
        request: &SelectionRequest,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Option<ScheduledWindow> {
        match selection::build_window(data, request, now, deadline, self.options.debug) {
            Ok(window) => window,
            Err(err) => {
                tracing::debug!(error = %err, "window building failed a precondition");
                None
            }
        }
    }
}
