use super::{label_or_unassigned, ReportOutcome, Tally};
use crate::{
    payments::{EnrichedTrip, PaymentMode},
    trip::{TripStatus, TripType},
    types::{percentage, Paise},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayRevenue {
    pub date: NaiveDate,
    pub revenue: Paise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverPerformance {
    pub driver: String,
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
    /// Paise per trip.
    pub avg_fare: f64,
    pub avg_km: f64,
    pub completed: i64,
    pub cancelled: i64,
    pub completion_rate: f64,
    pub cancellation_rate: f64,
    pub revenue_by_type: BTreeMap<TripType, Paise>,
    /// Only trips with a completed payment appear here.
    pub revenue_by_mode: BTreeMap<PaymentMode, Paise>,
    pub best_day: Option<DayRevenue>,
    pub worst_day: Option<DayRevenue>,
}

#[derive(Default)]
struct DriverAcc {
    tally: Tally,
    completed: i64,
    cancelled: i64,
    by_type: BTreeMap<TripType, Paise>,
    by_mode: BTreeMap<PaymentMode, Paise>,
    by_day: BTreeMap<NaiveDate, Paise>,
}

/// One row per driver, highest revenue first.
pub fn driver_performance(trips: &[EnrichedTrip]) -> ReportOutcome<Vec<DriverPerformance>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut drivers: BTreeMap<String, DriverAcc> = BTreeMap::new();
    for enriched in trips {
        let trip = &enriched.trip;
        let acc = drivers
            .entry(label_or_unassigned(trip.driver_name.as_deref()))
            .or_default();
        let fare = trip.fare_or_zero();

        acc.tally.add(trip);
        match trip.status {
            TripStatus::Completed => acc.completed += 1,
            TripStatus::Cancelled => acc.cancelled += 1,
            _ => {}
        }
        *acc.by_type.entry(trip.trip_type).or_insert(0) += fare;
        if let Some(mode) = enriched.paid_mode() {
            *acc.by_mode.entry(mode).or_insert(0) += fare;
        }
        if let Some(date) = trip.start_date() {
            *acc.by_day.entry(date).or_insert(0) += fare;
        }
    }

    let mut rows: Vec<DriverPerformance> = drivers
        .into_iter()
        .map(|(driver, acc)| {
            let (best_day, worst_day) = best_and_worst(&acc.by_day);
            DriverPerformance {
                driver,
                trips: acc.tally.trips,
                revenue: acc.tally.revenue,
                km: acc.tally.km,
                avg_fare: acc.tally.avg_fare(),
                avg_km: acc.tally.avg_km(),
                completed: acc.completed,
                cancelled: acc.cancelled,
                completion_rate: percentage(acc.completed, acc.tally.trips),
                cancellation_rate: percentage(acc.cancelled, acc.tally.trips),
                revenue_by_type: acc.by_type,
                revenue_by_mode: acc.by_mode,
                best_day,
                worst_day,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ReportOutcome::Ready(rows)
}

/// Highest and lowest revenue day; the earliest date wins a tie.
fn best_and_worst(by_day: &BTreeMap<NaiveDate, Paise>) -> (Option<DayRevenue>, Option<DayRevenue>) {
    let mut best: Option<(NaiveDate, Paise)> = None;
    let mut worst: Option<(NaiveDate, Paise)> = None;
    for (&date, &revenue) in by_day {
        if best.map_or(true, |(_, r)| revenue > r) {
            best = Some((date, revenue));
        }
        if worst.map_or(true, |(_, r)| revenue < r) {
            worst = Some((date, revenue));
        }
    }
    let to_row = |(date, revenue): (NaiveDate, Paise)| DayRevenue { date, revenue };
    (best.map(to_row), worst.map(to_row))
}
