use super::{label_or_unassigned, ReportOutcome, Tally};
use crate::{
    filter::DateRange,
    payments::EnrichedTrip,
    types::{percentage, ratio, Paise},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleUtilization {
    pub vehicle: String,
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
    /// Distinct calendar days with at least one trip.
    pub active_days: i64,
    pub period_days: i64,
    pub utilization_pct: f64,
    /// Per active day.
    pub avg_trips_per_day: f64,
    /// Per active day.
    pub avg_km_per_day: f64,
    /// Operational status of the vehicle on its most recent trip.
    pub current_status: Option<String>,
}

#[derive(Default)]
struct VehicleAcc {
    tally: Tally,
    days: BTreeSet<NaiveDate>,
    status: Option<String>,
}

/// One row per vehicle, highest revenue first.
pub fn vehicle_utilization(
    trips: &[EnrichedTrip],
    period: DateRange,
) -> ReportOutcome<Vec<VehicleUtilization>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut vehicles: BTreeMap<String, VehicleAcc> = BTreeMap::new();
    for enriched in trips {
        let trip = &enriched.trip;
        let acc = vehicles
            .entry(label_or_unassigned(trip.vehicle_reg.as_deref()))
            .or_default();
        acc.tally.add(trip);
        if let Some(date) = trip.start_date() {
            acc.days.insert(date);
        }
        // Stream is newest first, so the first status seen is the current one.
        if acc.status.is_none() {
            acc.status = trip.vehicle_status.clone();
        }
    }

    let period_days = period.days();
    let mut rows: Vec<VehicleUtilization> = vehicles
        .into_iter()
        .map(|(vehicle, acc)| {
            let active_days = acc.days.len() as i64;
            VehicleUtilization {
                vehicle,
                trips: acc.tally.trips,
                revenue: acc.tally.revenue,
                km: acc.tally.km,
                active_days,
                period_days,
                utilization_pct: percentage(active_days, period_days),
                avg_trips_per_day: ratio(acc.tally.trips as f64, active_days as f64),
                avg_km_per_day: ratio(acc.tally.km, active_days as f64),
                current_status: acc.status,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ReportOutcome::Ready(rows)
}
