use super::{label_or_unassigned, weekday_label, EncounterCounter, ReportOutcome};
use crate::{payments::EnrichedTrip, types::Paise};
use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DemandBucket {
    pub label: String,
    pub trips: i64,
    pub revenue: Paise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandCount {
    pub key: String,
    pub trips: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeakDemand {
    /// Always 24 buckets, hour 0 first.
    pub by_hour: Vec<DemandBucket>,
    /// Always 7 buckets, Monday first.
    pub by_weekday: Vec<DemandBucket>,
    pub top_routes: Vec<DemandCount>,
    pub driver_demand: Vec<DemandCount>,
    pub vehicle_demand: Vec<DemandCount>,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn peak_demand(trips: &[EnrichedTrip], top_routes: usize) -> ReportOutcome<PeakDemand> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut by_hour: Vec<DemandBucket> = (0..24)
        .map(|h| DemandBucket {
            label: format!("{h:02}:00"),
            ..DemandBucket::default()
        })
        .collect();
    let mut by_weekday: Vec<DemandBucket> = WEEK
        .iter()
        .map(|d| DemandBucket {
            label: weekday_label(*d).to_string(),
            ..DemandBucket::default()
        })
        .collect();
    let mut routes: EncounterCounter<String> = EncounterCounter::new();
    let mut drivers: BTreeMap<String, i64> = BTreeMap::new();
    let mut vehicles: BTreeMap<String, i64> = BTreeMap::new();

    for enriched in trips {
        let trip = &enriched.trip;
        let fare = trip.fare_or_zero();
        if let Some(start) = trip.start_time {
            let hour = &mut by_hour[start.hour() as usize];
            hour.trips += 1;
            hour.revenue += fare;
            let day = &mut by_weekday[start.weekday().num_days_from_monday() as usize];
            day.trips += 1;
            day.revenue += fare;
        }
        if let Some(route) = &trip.route {
            routes.bump(route.clone());
        }
        *drivers
            .entry(label_or_unassigned(trip.driver_name.as_deref()))
            .or_insert(0) += 1;
        *vehicles
            .entry(label_or_unassigned(trip.vehicle_reg.as_deref()))
            .or_insert(0) += 1;
    }

    ReportOutcome::Ready(PeakDemand {
        by_hour,
        by_weekday,
        top_routes: routes
            .top(top_routes)
            .into_iter()
            .map(|(key, trips)| DemandCount { key, trips })
            .collect(),
        driver_demand: by_count(drivers),
        vehicle_demand: by_count(vehicles),
    })
}

/// Busiest first; ties stay in key order.
fn by_count(counts: BTreeMap<String, i64>) -> Vec<DemandCount> {
    let mut rows: Vec<DemandCount> = counts
        .into_iter()
        .map(|(key, trips)| DemandCount { key, trips })
        .collect();
    rows.sort_by(|a, b| b.trips.cmp(&a.trips));
    rows
}

