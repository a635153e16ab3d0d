//! Assignable resources (team members) with their personal blocks.

use serde::{Deserialize, Serialize};

use super::professional::{BlockedDate, BlockedRange};

/// A user-like entity referenced by a project's `resources` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,

    /// Full-day personal blocks.
    #[serde(default)]
    pub blocked_dates: Vec<BlockedDate>,

    /// Personal blocked intervals.
    #[serde(default)]
    pub blocked_ranges: Vec<BlockedRange>,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blocked_dates: Vec::new(),
            blocked_ranges: Vec::new(),
        }
    }
}
