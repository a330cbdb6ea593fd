//! VisibilityPolicy: which trips belong on the live dashboard.
//!
//! Only applies to the default stream. Explicit date-range queries
//! (reports) bypass it and check range membership only.

use crate::trip::Trip;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Dispatcher,
    Manager,
    Admin,
}

impl Role {
    pub fn can_view_past_incomplete(&self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub show_yesterday_incomplete: bool,
    pub can_view_past_incomplete: bool,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            show_yesterday_incomplete: true,
            can_view_past_incomplete: false,
        }
    }
}

impl VisibilityPolicy {
    pub fn for_role(role: Role, show_yesterday_incomplete: bool) -> Self {
        Self {
            show_yesterday_incomplete,
            can_view_past_incomplete: role.can_view_past_incomplete(),
        }
    }

    /// Decide on the calendar date of `start_time` only.
    ///
    /// - on or after today: always shown
    /// - yesterday: shown while incomplete, if yesterday's backlog is enabled
    /// - older: shown while incomplete, for privileged roles only
    /// - no start time: never shown
    pub fn includes(&self, trip: &Trip, today: NaiveDate) -> bool {
        let Some(trip_date) = trip.start_date() else {
            return false;
        };

        if trip_date >= today {
            return true;
        }
        let incomplete = trip.status.is_incomplete();
        if Some(trip_date) == today.pred_opt() {
            return self.show_yesterday_incomplete && incomplete;
        }
        self.can_view_past_incomplete && incomplete
    }

    pub fn apply(&self, trips: Vec<Trip>, today: NaiveDate) -> Vec<Trip> {
        trips
            .into_iter()
            .filter(|trip| self.includes(trip, today))
            .collect()
    }
}
