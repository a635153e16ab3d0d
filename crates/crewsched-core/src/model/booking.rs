//! Live bookings that block resources for new work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    /// Whether a booking in this state still occupies its resources.
    pub fn is_blocking(&self) -> bool {
        !matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }
}

/// An existing booking as loaded from the caller's store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,

    /// Project this booking was made for.
    #[serde(default)]
    pub project_id: Option<String>,

    /// The professional (user) the booking is held against, used as a
    /// fallback when no team members are listed.
    #[serde(default)]
    pub professional: Option<String>,

    pub status: BookingStatus,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub execution_end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub buffer_end_date: Option<DateTime<Utc>>,

    /// Resources assigned to this booking; empty means unattributed.
    #[serde(default)]
    pub assigned_team_members: Vec<String>,
}

impl Booking {
    /// Whether this booking contributes blocked ranges at all: it must
    /// still be live and carry a start plus at least one end instant.
    pub fn occupies_time(&self) -> bool {
        self.status.is_blocking()
            && self.start_date.is_some()
            && (self.buffer_end_date.is_some() || self.execution_end_date.is_some())
    }

    /// Whether this booking blocks the given resource.
    ///
    /// Attribution order: explicit team membership; then the bare
    /// `professional` field when no team is listed; then a project-wide
    /// match that blocks every listed resource (legacy fallback).
    pub fn blocks_resource(&self, resource_id: &str, project_id: &str) -> bool {
        if !self.assigned_team_members.is_empty() {
            return self.assigned_team_members.iter().any(|m| m == resource_id);
        }
        if self.professional.as_deref() == Some(resource_id) {
            return true;
        }
        self.project_id.as_deref() == Some(project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: "b-1".into(),
            project_id: Some("p-1".into()),
            professional: None,
            status,
            start_date: Some("2025-06-02T09:00:00Z".parse().unwrap()),
            execution_end_date: Some("2025-06-02T17:00:00Z".parse().unwrap()),
            buffer_end_date: None,
            assigned_team_members: Vec::new(),
        }
    }

    #[test]
    fn terminal_statuses_do_not_block() {
        assert!(!booking(BookingStatus::Completed).occupies_time());
        assert!(!booking(BookingStatus::Cancelled).occupies_time());
        assert!(!booking(BookingStatus::Refunded).occupies_time());
        assert!(booking(BookingStatus::Confirmed).occupies_time());
        assert!(booking(BookingStatus::Pending).occupies_time());
    }

    #[test]
    fn needs_start_and_an_end() {
        let mut b = booking(BookingStatus::Confirmed);
        b.execution_end_date = None;
        assert!(!b.occupies_time());
        b.buffer_end_date = Some("2025-06-03T17:00:00Z".parse().unwrap());
        assert!(b.occupies_time());
    }

    #[test]
    fn team_membership_wins_over_professional() {
        let mut b = booking(BookingStatus::Confirmed);
        b.assigned_team_members = vec!["alice".into()];
        b.professional = Some("bob".into());
        assert!(b.blocks_resource("alice", "other-project"));
        assert!(!b.blocks_resource("bob", "other-project"));
    }

    #[test]
    fn professional_fallback_without_team() {
        let mut b = booking(BookingStatus::Confirmed);
        b.professional = Some("bob".into());
        b.project_id = Some("unrelated".into());
        assert!(b.blocks_resource("bob", "p-1"));
        assert!(!b.blocks_resource("carol", "p-1"));
    }

    #[test]
    fn project_match_blocks_everyone() {
        let b = booking(BookingStatus::Confirmed);
        assert!(b.blocks_resource("anyone", "p-1"));
        assert!(!b.blocks_resource("anyone", "p-2"));
    }

    #[test]
    fn status_serde_is_snake_case() {
        let s = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");
    }
}
