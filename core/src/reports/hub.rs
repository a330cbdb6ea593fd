use super::{label_or_unassigned, weekday_label, EncounterCounter, ReportOutcome, Tally};
use crate::{
    payments::EnrichedTrip,
    trip::TripType,
    types::Paise,
};
use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourCount {
    pub hour: u32,
    pub trips: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekdayCount {
    pub weekday: String,
    pub trips: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubPerformance {
    pub hub: String,
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
    pub trip_types: BTreeMap<TripType, i64>,
    pub driver_count: usize,
    pub drivers: Vec<String>,
    pub vehicle_count: usize,
    pub vehicles: Vec<String>,
    /// Busiest first; equal counts keep first-seen order.
    pub busiest_hours: Vec<HourCount>,
    pub busiest_weekdays: Vec<WeekdayCount>,
}

struct HubAcc {
    tally: Tally,
    trip_types: BTreeMap<TripType, i64>,
    drivers: BTreeSet<String>,
    vehicles: BTreeSet<String>,
    hours: EncounterCounter<u32>,
    weekdays: EncounterCounter<&'static str>,
}

impl HubAcc {
    fn new() -> Self {
        Self {
            tally: Tally::default(),
            trip_types: BTreeMap::new(),
            drivers: BTreeSet::new(),
            vehicles: BTreeSet::new(),
            hours: EncounterCounter::new(),
            weekdays: EncounterCounter::new(),
        }
    }
}

/// One row per hub, highest revenue first.
pub fn hub_performance(trips: &[EnrichedTrip], top_n: usize) -> ReportOutcome<Vec<HubPerformance>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut hubs: BTreeMap<String, HubAcc> = BTreeMap::new();
    for enriched in trips {
        let trip = &enriched.trip;
        let acc = hubs
            .entry(label_or_unassigned(trip.hub_name.as_deref()))
            .or_insert_with(HubAcc::new);
        acc.tally.add(trip);
        *acc.trip_types.entry(trip.trip_type).or_insert(0) += 1;
        if let Some(driver) = &trip.driver_name {
            acc.drivers.insert(driver.clone());
        }
        if let Some(vehicle) = &trip.vehicle_reg {
            acc.vehicles.insert(vehicle.clone());
        }
        if let Some(start) = trip.start_time {
            acc.hours.bump(start.hour());
            acc.weekdays.bump(weekday_label(start.weekday()));
        }
    }

    let mut rows: Vec<HubPerformance> = hubs
        .into_iter()
        .map(|(hub, acc)| HubPerformance {
            hub,
            trips: acc.tally.trips,
            revenue: acc.tally.revenue,
            km: acc.tally.km,
            trip_types: acc.trip_types,
            driver_count: acc.drivers.len(),
            drivers: acc.drivers.into_iter().collect(),
            vehicle_count: acc.vehicles.len(),
            vehicles: acc.vehicles.into_iter().collect(),
            busiest_hours: acc
                .hours
                .top(top_n)
                .into_iter()
                .map(|(hour, trips)| HourCount { hour, trips })
                .collect(),
            busiest_weekdays: acc
                .weekdays
                .top(top_n)
                .into_iter()
                .map(|(weekday, trips)| WeekdayCount {
                    weekday: weekday.to_string(),
                    trips,
                })
                .collect(),
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    ReportOutcome::Ready(rows)
}
