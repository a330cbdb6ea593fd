//! AggregationEngine: report reductions over the filtered trip stream.
//!
//! RULES:
//!   - Every report is a pure function of its ReportInput. Inputs are
//!     borrowed, never mutated; the same input yields identical output.
//!   - Money is summed as integer paise. Division happens only for
//!     final averages and rates.
//!   - Rates are `numerator / denominator * 100`, and 0 on an empty denominator.
//!   - An empty trip stream yields `ReportOutcome::NoData`, never a zero row.
//!   - Groups iterate in key order (BTreeMap) so ties sort deterministically.

pub mod cancellation;
pub mod customer;
pub mod driver;
pub mod hub;
pub mod payment_mode;
pub mod peak;
pub mod revenue;
pub mod subscription;
pub mod summary;
pub mod trip_wise;
pub mod vehicle;

use crate::{
    config::ReportConfig,
    error::ReportError,
    filter::DateRange,
    payments::{EnrichedTrip, PaymentScope},
    trip::Trip,
    types::Paise,
};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, hash::Hash, str::FromStr};

/// Group label for trips whose driver, vehicle, hub or customer is unknown.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", content = "report", rename_all = "snake_case")]
pub enum ReportOutcome<T> {
    /// The report ran on zero trips.
    NoData,
    Ready(T),
}

impl<T> ReportOutcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NoData => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    DailySummary,
    WeeklySummary,
    TripWise,
    DriverPerformance,
    VehicleUtilization,
    CustomerAnalysis,
    HubPerformance,
    RevenueAnalysis,
    PaymentModeAnalysis,
    PeakDemand,
    Cancellation,
    SubscriptionPerformance,
}

impl ReportKind {
    pub const ALL: [ReportKind; 12] = [
        ReportKind::DailySummary,
        ReportKind::WeeklySummary,
        ReportKind::TripWise,
        ReportKind::DriverPerformance,
        ReportKind::VehicleUtilization,
        ReportKind::CustomerAnalysis,
        ReportKind::HubPerformance,
        ReportKind::RevenueAnalysis,
        ReportKind::PaymentModeAnalysis,
        ReportKind::PeakDemand,
        ReportKind::Cancellation,
        ReportKind::SubscriptionPerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::WeeklySummary => "weekly_summary",
            Self::TripWise => "trip_wise",
            Self::DriverPerformance => "driver_performance",
            Self::VehicleUtilization => "vehicle_utilization",
            Self::CustomerAnalysis => "customer_analysis",
            Self::HubPerformance => "hub_performance",
            Self::RevenueAnalysis => "revenue_analysis",
            Self::PaymentModeAnalysis => "payment_mode_analysis",
            Self::PeakDemand => "peak_demand",
            Self::Cancellation => "cancellation",
            Self::SubscriptionPerformance => "subscription_performance",
        }
    }

    /// Payment rows this report needs, or None when it ignores payments.
    pub fn payment_scope(&self) -> Option<PaymentScope> {
        match self {
            Self::TripWise | Self::PaymentModeAnalysis => Some(PaymentScope::AllStatuses),
            Self::DailySummary
            | Self::WeeklySummary
            | Self::DriverPerformance
            | Self::CustomerAnalysis
            | Self::RevenueAnalysis => Some(PaymentScope::CompletedOnly),
            Self::VehicleUtilization
            | Self::HubPerformance
            | Self::PeakDemand
            | Self::Cancellation
            | Self::SubscriptionPerformance => None,
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ReportError::UnknownReport(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum ReportOutput {
    DailySummary(ReportOutcome<Vec<summary::PeriodSummary>>),
    WeeklySummary(ReportOutcome<Vec<summary::PeriodSummary>>),
    TripWise(ReportOutcome<Vec<trip_wise::TripRow>>),
    DriverPerformance(ReportOutcome<Vec<driver::DriverPerformance>>),
    VehicleUtilization(ReportOutcome<Vec<vehicle::VehicleUtilization>>),
    CustomerAnalysis(ReportOutcome<Vec<customer::CustomerAnalysis>>),
    HubPerformance(ReportOutcome<Vec<hub::HubPerformance>>),
    RevenueAnalysis(ReportOutcome<revenue::RevenueAnalysis>),
    PaymentModeAnalysis(ReportOutcome<payment_mode::PaymentModeAnalysis>),
    PeakDemand(ReportOutcome<peak::PeakDemand>),
    Cancellation(ReportOutcome<cancellation::CancellationAnalysis>),
    SubscriptionPerformance(ReportOutcome<subscription::SubscriptionPerformance>),
}

impl ReportOutput {
    pub fn is_no_data(&self) -> bool {
        match self {
            Self::DailySummary(o) | Self::WeeklySummary(o) => o.is_no_data(),
            Self::TripWise(o) => o.is_no_data(),
            Self::DriverPerformance(o) => o.is_no_data(),
            Self::VehicleUtilization(o) => o.is_no_data(),
            Self::CustomerAnalysis(o) => o.is_no_data(),
            Self::HubPerformance(o) => o.is_no_data(),
            Self::RevenueAnalysis(o) => o.is_no_data(),
            Self::PaymentModeAnalysis(o) => o.is_no_data(),
            Self::PeakDemand(o) => o.is_no_data(),
            Self::Cancellation(o) => o.is_no_data(),
            Self::SubscriptionPerformance(o) => o.is_no_data(),
        }
    }
}

/// Everything a report may read.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    /// Filtered, range-bounded and (where needed) enriched trips.
    pub trips: &'a [EnrichedTrip],
    /// The full normalized history, unfiltered. Used for lifetime metrics.
    pub history: &'a [Trip],
    pub period: DateRange,
    /// Subscriptions currently active; only read by the subscription report.
    pub active_subscriptions: i64,
    pub config: &'a ReportConfig,
}

pub fn run(kind: ReportKind, input: &ReportInput<'_>) -> ReportOutput {
    let trips = input.trips;
    match kind {
        ReportKind::DailySummary => {
            ReportOutput::DailySummary(summary::period_summary(trips, Granularity::Day))
        }
        ReportKind::WeeklySummary => {
            ReportOutput::WeeklySummary(summary::period_summary(trips, Granularity::Week))
        }
        ReportKind::TripWise => ReportOutput::TripWise(trip_wise::trip_rows(trips)),
        ReportKind::DriverPerformance => {
            ReportOutput::DriverPerformance(driver::driver_performance(trips))
        }
        ReportKind::VehicleUtilization => {
            ReportOutput::VehicleUtilization(vehicle::vehicle_utilization(trips, input.period))
        }
        ReportKind::CustomerAnalysis => ReportOutput::CustomerAnalysis(
            customer::customer_analysis(trips, input.history, input.period),
        ),
        ReportKind::HubPerformance => ReportOutput::HubPerformance(hub::hub_performance(
            trips,
            input.config.hub_top_buckets,
        )),
        ReportKind::RevenueAnalysis => ReportOutput::RevenueAnalysis(revenue::revenue_analysis(trips)),
        ReportKind::PaymentModeAnalysis => {
            ReportOutput::PaymentModeAnalysis(payment_mode::payment_mode_analysis(trips))
        }
        ReportKind::PeakDemand => {
            ReportOutput::PeakDemand(peak::peak_demand(trips, input.config.top_routes_limit))
        }
        ReportKind::Cancellation => {
            ReportOutput::Cancellation(cancellation::cancellation_analysis(trips))
        }
        ReportKind::SubscriptionPerformance => ReportOutput::SubscriptionPerformance(
            subscription::subscription_performance(trips, input.active_subscriptions),
        ),
    }
}

// ── Shared building blocks ───────────────────────────────────────────────────

/// Trip count, revenue and distance for one group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tally {
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
}

impl Tally {
    pub fn add(&mut self, trip: &Trip) {
        self.trips += 1;
        self.revenue += trip.fare_or_zero();
        self.km += trip.distance_km();
    }

    /// Average fare in paise; 0 for an empty group.
    pub fn avg_fare(&self) -> f64 {
        crate::types::ratio(self.revenue as f64, self.trips as f64)
    }

    pub fn avg_km(&self) -> f64 {
        crate::types::ratio(self.km, self.trips as f64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Sortable bucket label: `2026-10-19`, `2026-W43`, `2026-10`.
    pub fn key(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let iso = date.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Self::Month => date.format("%Y-%m").to_string(),
        }
    }
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub(crate) fn label_or_unassigned(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNASSIGNED)
        .to_string()
}

/// Counts that remember first-encounter order, for tie-stable rankings.
#[derive(Debug, Clone)]
pub(crate) struct EncounterCounter<K> {
    order: Vec<(K, i64)>,
    index: HashMap<K, usize>,
}

impl<K: Clone + Eq + Hash> EncounterCounter<K> {
    pub(crate) fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn bump(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.order.len());
                self.order.push((key, 1));
            }
        }
    }

    /// Highest counts first; equal counts keep encounter order.
    pub(crate) fn top(&self, n: usize) -> Vec<(K, i64)> {
        let mut ranked = self.order.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}
