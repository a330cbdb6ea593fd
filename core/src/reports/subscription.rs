use super::{Granularity, ReportOutcome, Tally};
use crate::{
    payments::EnrichedTrip,
    trip::TripType,
    types::{percentage, Paise},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionPeriod {
    pub period: String,
    pub rides: i64,
    pub revenue: Paise,
    pub km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionPerformance {
    pub active_subscriptions: i64,
    pub rides: i64,
    pub revenue: Paise,
    pub km: f64,
    /// rides / active subscriptions × 100.
    pub utilization_pct: f64,
    pub customers_in_window: i64,
    /// Customers with more than one ride in the window.
    pub repeat_customers: i64,
    /// repeat customers / customers in window × 100.
    pub retention_pct: f64,
    pub by_day: Vec<SubscriptionPeriod>,
    pub by_week: Vec<SubscriptionPeriod>,
    pub by_month: Vec<SubscriptionPeriod>,
}

/// Subscription rides only; every other trip type is ignored.
pub fn subscription_performance(
    trips: &[EnrichedTrip],
    active_subscriptions: i64,
) -> ReportOutcome<SubscriptionPerformance> {
    let rides: Vec<&EnrichedTrip> = trips
        .iter()
        .filter(|e| e.trip.trip_type == TripType::Subscription)
        .collect();
    if rides.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut total = Tally::default();
    let mut per_customer: BTreeMap<(String, String), i64> = BTreeMap::new();
    let mut by_day: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_week: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_month: BTreeMap<String, Tally> = BTreeMap::new();

    for enriched in rides {
        let trip = &enriched.trip;
        total.add(trip);
        // Shell rides have no customer and are left out of retention.
        if trip.customer_name.is_some() || trip.customer_phone.is_some() {
            let key = (
                trip.customer_name.clone().unwrap_or_default(),
                trip.customer_phone.clone().unwrap_or_default(),
            );
            *per_customer.entry(key).or_insert(0) += 1;
        }
        if let Some(date) = trip.start_date() {
            by_day.entry(Granularity::Day.key(date)).or_default().add(trip);
            by_week.entry(Granularity::Week.key(date)).or_default().add(trip);
            by_month.entry(Granularity::Month.key(date)).or_default().add(trip);
        }
    }

    let customers_in_window = per_customer.len() as i64;
    let repeat_customers = per_customer.values().filter(|&&n| n > 1).count() as i64;

    ReportOutcome::Ready(SubscriptionPerformance {
        active_subscriptions,
        rides: total.trips,
        revenue: total.revenue,
        km: total.km,
        utilization_pct: percentage(total.trips, active_subscriptions),
        customers_in_window,
        repeat_customers,
        retention_pct: percentage(repeat_customers, customers_in_window),
        by_day: periods(by_day),
        by_week: periods(by_week),
        by_month: periods(by_month),
    })
}

fn periods(map: BTreeMap<String, Tally>) -> Vec<SubscriptionPeriod> {
    map.into_iter()
        .map(|(period, t)| SubscriptionPeriod {
            period,
            rides: t.trips,
            revenue: t.revenue,
            km: t.km,
        })
        .collect()
}
