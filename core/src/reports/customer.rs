use super::{label_or_unassigned, ReportOutcome, Tally};
use crate::{
    filter::DateRange,
    payments::{EnrichedTrip, PaymentMode},
    trip::{Trip, TripType},
    types::{ratio, Paise},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const NO_PREFERRED_MODE: &str = "N/A";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerAnalysis {
    pub name: String,
    pub phone: String,
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
    pub avg_fare: f64,
    /// Trips per day of the selected period.
    pub booking_frequency: f64,
    pub trip_types: BTreeMap<TripType, i64>,
    /// Mode with strictly the most completed payments, or "N/A".
    pub preferred_mode: String,
    pub last_trip_date: Option<NaiveDate>,
    /// Fare total across the customer's entire history, not just the period.
    pub lifetime_value: Paise,
}

type CustomerKey = (String, String);

fn customer_key(trip: &Trip) -> CustomerKey {
    (
        label_or_unassigned(trip.customer_name.as_deref()),
        trip.customer_phone.clone().unwrap_or_default(),
    )
}

#[derive(Default)]
struct CustomerAcc {
    tally: Tally,
    trip_types: BTreeMap<TripType, i64>,
    modes: BTreeMap<PaymentMode, i64>,
    last_trip_date: Option<NaiveDate>,
}

/// One row per (name, phone), highest revenue first.
pub fn customer_analysis(
    trips: &[EnrichedTrip],
    history: &[Trip],
    period: DateRange,
) -> ReportOutcome<Vec<CustomerAnalysis>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut lifetime: HashMap<CustomerKey, Paise> = HashMap::new();
    for trip in history {
        *lifetime.entry(customer_key(trip)).or_insert(0) += trip.fare_or_zero();
    }

    let mut customers: BTreeMap<CustomerKey, CustomerAcc> = BTreeMap::new();
    for enriched in trips {
        let trip = &enriched.trip;
        let acc = customers.entry(customer_key(trip)).or_default();
        acc.tally.add(trip);
        *acc.trip_types.entry(trip.trip_type).or_insert(0) += 1;
        if let Some(mode) = enriched.paid_mode() {
            *acc.modes.entry(mode).or_insert(0) += 1;
        }
        if let Some(date) = trip.start_date() {
            acc.last_trip_date = acc.last_trip_date.max(Some(date));
        }
    }

    let period_days = period.days() as f64;
    let mut rows: Vec<CustomerAnalysis> = customers
        .into_iter()
        .map(|(key, acc)| {
            let lifetime_value = lifetime.get(&key).copied().unwrap_or(acc.tally.revenue);
            let (name, phone) = key;
            CustomerAnalysis {
                name,
                phone,
                trips: acc.tally.trips,
                revenue: acc.tally.revenue,
                km: acc.tally.km,
                avg_fare: acc.tally.avg_fare(),
                booking_frequency: ratio(acc.tally.trips as f64, period_days),
                trip_types: acc.trip_types,
                preferred_mode: preferred_mode(&acc.modes),
                last_trip_date: acc.last_trip_date,
                lifetime_value,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ReportOutcome::Ready(rows)
}

/// The mode whose count strictly exceeds every mode before it, in
/// Cash, UPI, Others order. "N/A" when no payment was counted.
pub fn preferred_mode(counts: &BTreeMap<PaymentMode, i64>) -> String {
    let mut best: Option<(PaymentMode, i64)> = None;
    for mode in PaymentMode::ALL {
        let count = counts.get(&mode).copied().unwrap_or(0);
        if count > best.map_or(0, |(_, c)| c) {
            best = Some((mode, count));
        }
    }
    best.map(|(mode, _)| mode.label().to_string())
        .unwrap_or_else(|| NO_PREFERRED_MODE.to_string())
}
