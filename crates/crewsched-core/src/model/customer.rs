//! Customer-supplied blocks attached to a single request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A customer-blocked window on a specific date, wall-clock times in
/// the professional's zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerWindow {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

/// Blocks the customer asked for when requesting a schedule.
///
/// These veto execution time but are deliberately ignored by buffer
/// arithmetic: a buffer may land on a customer-blocked day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerBlocks {
    /// Full-day blocks.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,

    /// Intra-day blocked windows.
    #[serde(default)]
    pub windows: Vec<CustomerWindow>,
}

impl CustomerBlocks {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.windows.is_empty()
    }
}
