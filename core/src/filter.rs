//! FilterEngine: caller-supplied predicates over the normalized stream.
//!
//! Every trip predicate is pure and independent, so application order
//! does not matter. Output preserves input order. The payment-mode
//! filter needs enriched trips and runs as a separate step.

use crate::{
    clock::ReportClock,
    error::{ReportError, ReportResult},
    payments::{EnrichedTrip, PaymentMode},
    trip::{Trip, TripStatus, TripType},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DUE_SOON_MINUTES: i64 = 60;

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> ReportResult<Self> {
        if from > to {
            return Err(ReportError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TripFilter {
    pub trip_type: Option<TripType>,
    pub status: Option<TripStatus>,
    /// Matches hub id or hub name exactly.
    pub hub: Option<String>,
    /// Case-insensitive substring of the driver name.
    pub driver: Option<String>,
    /// Case-insensitive substring of the vehicle registration.
    pub vehicle: Option<String>,
    /// When set, replaces the visibility policy.
    pub date_range: Option<DateRange>,
    /// Start time within `[now, now + due_soon_minutes]`.
    pub due_soon: bool,
    /// Still `created` and starting today.
    pub due_today: bool,
    /// Starting tomorrow and not cancelled or no-show.
    pub due_tomorrow: bool,
    /// Requires enriched trips; see `select_paid`.
    pub payment_mode: Option<PaymentMode>,
    pub due_soon_minutes: i64,
}

impl Default for TripFilter {
    fn default() -> Self {
        Self {
            trip_type: None,
            status: None,
            hub: None,
            driver: None,
            vehicle: None,
            date_range: None,
            due_soon: false,
            due_today: false,
            due_tomorrow: false,
            payment_mode: None,
            due_soon_minutes: DEFAULT_DUE_SOON_MINUTES,
        }
    }
}

impl TripFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, trip_type: TripType) -> Self {
        self.trip_type = Some(trip_type);
        self
    }

    pub fn with_status(mut self, status: TripStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hub(mut self, hub: impl Into<String>) -> Self {
        self.hub = Some(hub.into());
        self
    }

    pub fn with_driver(mut self, needle: impl Into<String>) -> Self {
        self.driver = Some(needle.into());
        self
    }

    pub fn with_vehicle(mut self, needle: impl Into<String>) -> Self {
        self.vehicle = Some(needle.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn due_soon(mut self) -> Self {
        self.due_soon = true;
        self
    }

    pub fn due_today(mut self) -> Self {
        self.due_today = true;
        self
    }

    pub fn due_tomorrow(mut self) -> Self {
        self.due_tomorrow = true;
        self
    }

    pub fn with_payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = Some(mode);
        self
    }

    pub fn matches(&self, trip: &Trip, clock: &ReportClock) -> bool {
        if self.trip_type.is_some_and(|t| t != trip.trip_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != trip.status) {
            return false;
        }
        if let Some(hub) = &self.hub {
            let by_id = trip.hub_id.as_deref() == Some(hub.as_str());
            let by_name = trip.hub_name.as_deref() == Some(hub.as_str());
            if !by_id && !by_name {
                return false;
            }
        }
        if let Some(needle) = &self.driver {
            if !contains_ignore_case(trip.driver_name.as_deref(), needle) {
                return false;
            }
        }
        if let Some(needle) = &self.vehicle {
            if !contains_ignore_case(trip.vehicle_reg.as_deref(), needle) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !trip.start_date().is_some_and(|d| range.contains(d)) {
                return false;
            }
        }
        if self.due_soon && !is_due_soon(trip, clock, self.due_soon_minutes) {
            return false;
        }
        if self.due_today && !is_due_today(trip, clock) {
            return false;
        }
        if self.due_tomorrow && !is_due_tomorrow(trip, clock) {
            return false;
        }
        true
    }

    pub fn apply(&self, trips: Vec<Trip>, clock: &ReportClock) -> Vec<Trip> {
        trips
            .into_iter()
            .filter(|trip| self.matches(trip, clock))
            .collect()
    }

    /// Like `apply`, but leaves the input untouched.
    pub fn select(&self, trips: &[Trip], clock: &ReportClock) -> Vec<Trip> {
        trips
            .iter()
            .filter(|trip| self.matches(trip, clock))
            .cloned()
            .collect()
    }

    /// Payment-derived filtering; runs after enrichment.
    pub fn select_paid(&self, trips: Vec<EnrichedTrip>) -> Vec<EnrichedTrip> {
        match self.payment_mode {
            None => trips,
            Some(mode) => trips
                .into_iter()
                .filter(|t| t.paid_mode() == Some(mode))
                .collect(),
        }
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// `now <= start_time <= now + minutes`, inclusive at both ends.
pub fn is_due_soon(trip: &Trip, clock: &ReportClock, minutes: i64) -> bool {
    let horizon = clock.horizon(minutes);
    trip.start_time
        .is_some_and(|start| clock.now <= start && start <= horizon)
}

pub fn is_due_today(trip: &Trip, clock: &ReportClock) -> bool {
    trip.status == TripStatus::Created && trip.start_date() == Some(clock.today())
}

pub fn is_due_tomorrow(trip: &Trip, clock: &ReportClock) -> bool {
    !matches!(trip.status, TripStatus::Cancelled | TripStatus::NoShow)
        && clock.tomorrow().is_some_and(|d| trip.start_date() == Some(d))
}
