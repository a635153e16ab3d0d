//! Boundary records consumed and produced by the engine.
//!
//! Everything here is a plain serde record: the engine holds no
//! references into any persistence layer. Cross-record links are
//! ID-based and resolved through request-scoped maps.

pub mod booking;
pub mod customer;
pub mod duration;
pub mod professional;
pub mod project;
pub mod resource;

pub use booking::{Booking, BookingStatus};
pub use customer::{CustomerBlocks, CustomerWindow};
pub use duration::{DurationUnit, WorkDuration};
pub use professional::{BlockedDate, BlockedRange, DayHours, Professional};
pub use project::{EffectiveDurations, Project, ResourcePolicy, Subproject};
pub use resource::Resource;
