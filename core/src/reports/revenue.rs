use super::{label_or_unassigned, Granularity, ReportOutcome, Tally};
use crate::{
    payments::{EnrichedTrip, PaymentMode},
    trip::TripType,
    types::Paise,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueGroup {
    pub key: String,
    pub trips: i64,
    pub revenue: Paise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenuePeriod {
    pub period: String,
    pub trips: i64,
    pub revenue: Paise,
    pub avg_fare: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueAnalysis {
    pub total_trips: i64,
    pub total_revenue: Paise,
    pub avg_fare: f64,
    pub by_type: Vec<RevenueGroup>,
    /// Revenue of trips with a completed payment, per mode.
    pub by_mode: Vec<RevenueGroup>,
    pub by_hub: Vec<RevenueGroup>,
    pub by_driver: Vec<RevenueGroup>,
    pub by_day: Vec<RevenuePeriod>,
    pub by_week: Vec<RevenuePeriod>,
    pub by_month: Vec<RevenuePeriod>,
    /// Fare of trips without a completed payment.
    pub outstanding: Tally,
}

pub fn revenue_analysis(trips: &[EnrichedTrip]) -> ReportOutcome<RevenueAnalysis> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut total = Tally::default();
    let mut outstanding = Tally::default();
    let mut by_type: BTreeMap<TripType, Tally> = BTreeMap::new();
    let mut by_mode: BTreeMap<PaymentMode, Tally> = BTreeMap::new();
    let mut by_hub: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_driver: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_day: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_week: BTreeMap<String, Tally> = BTreeMap::new();
    let mut by_month: BTreeMap<String, Tally> = BTreeMap::new();

    for enriched in trips {
        let trip = &enriched.trip;
        total.add(trip);
        by_type.entry(trip.trip_type).or_default().add(trip);
        match enriched.paid_mode() {
            Some(mode) => by_mode.entry(mode).or_default().add(trip),
            None => outstanding.add(trip),
        }
        by_hub
            .entry(label_or_unassigned(trip.hub_name.as_deref()))
            .or_default()
            .add(trip);
        by_driver
            .entry(label_or_unassigned(trip.driver_name.as_deref()))
            .or_default()
            .add(trip);
        if let Some(date) = trip.start_date() {
            by_day.entry(Granularity::Day.key(date)).or_default().add(trip);
            by_week.entry(Granularity::Week.key(date)).or_default().add(trip);
            by_month.entry(Granularity::Month.key(date)).or_default().add(trip);
        }
    }

    ReportOutcome::Ready(RevenueAnalysis {
        total_trips: total.trips,
        total_revenue: total.revenue,
        avg_fare: total.avg_fare(),
        by_type: ranked(by_type.into_iter().map(|(k, t)| (k.to_string(), t))),
        by_mode: ranked(by_mode.into_iter().map(|(k, t)| (k.to_string(), t))),
        by_hub: ranked(by_hub),
        by_driver: ranked(by_driver),
        by_day: chronological(by_day),
        by_week: chronological(by_week),
        by_month: chronological(by_month),
        outstanding,
    })
}

fn ranked(groups: impl IntoIterator<Item = (String, Tally)>) -> Vec<RevenueGroup> {
    let mut rows: Vec<RevenueGroup> = groups
        .into_iter()
        .map(|(key, tally)| RevenueGroup {
            key,
            trips: tally.trips,
            revenue: tally.revenue,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    rows
}

fn chronological(periods: BTreeMap<String, Tally>) -> Vec<RevenuePeriod> {
    periods
        .into_iter()
        .map(|(period, tally)| RevenuePeriod {
            avg_fare: tally.avg_fare(),
            period,
            trips: tally.trips,
            revenue: tally.revenue,
        })
        .collect()
}
