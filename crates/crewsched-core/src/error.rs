//! Hard-failure error kinds for the scheduling engine.
//!
//! These cover malformed inputs and unresolvable references only.
//! Policy outcomes (blocked date, insufficient team overlap, and so
//! on) are not errors; they are returned as
//! [`crate::selection::SelectionOutcome`] records with a reason string.

use thiserror::Error;

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The professional's timezone is not a valid IANA zone name.
    #[error("invalid timezone: {0}")]
    InvalidTimeZone(String),

    /// A selection `startDate` that is not `YYYY-MM-DD`.
    #[error("invalid start date: {0}")]
    InvalidStartDate(String),

    /// A selection `startTime` that is not `HH:MM`.
    #[error("invalid start time: {0}")]
    InvalidStartTime(String),

    /// No project with the requested ID in the request dataset.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// The project references a professional absent from the dataset.
    #[error("professional not found: {0}")]
    ProfessionalNotFound(String),

    /// The project (or addressed subproject) has no execution duration.
    #[error("project has no execution duration")]
    MissingExecutionDuration,

    /// The project lists no valid resources after normalization.
    #[error("project has no schedulable resources")]
    NoResources,
}
