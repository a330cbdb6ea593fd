use super::{label_or_unassigned, ReportOutcome};
use crate::{
    payments::EnrichedTrip,
    trip::{TripStatus, TripType},
    types::{percentage, Paise},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationGroup {
    pub key: String,
    pub trips: i64,
    pub cancelled: i64,
    pub cancellation_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationAnalysis {
    pub total_trips: i64,
    pub cancelled: i64,
    pub no_shows: i64,
    /// cancelled / total × 100.
    pub cancellation_rate: f64,
    /// Fare booked on trips that were later cancelled.
    pub lost_revenue: Paise,
    pub by_type: Vec<CancellationGroup>,
    pub by_hub: Vec<CancellationGroup>,
    pub by_driver: Vec<CancellationGroup>,
    pub by_customer: Vec<CancellationGroup>,
}

type Counts = BTreeMap<String, (i64, i64)>;

pub fn cancellation_analysis(trips: &[EnrichedTrip]) -> ReportOutcome<CancellationAnalysis> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut cancelled = 0;
    let mut no_shows = 0;
    let mut lost_revenue = 0;
    let mut by_type: BTreeMap<TripType, (i64, i64)> = BTreeMap::new();
    let mut by_hub = Counts::new();
    let mut by_driver = Counts::new();
    let mut by_customer = Counts::new();

    for enriched in trips {
        let trip = &enriched.trip;
        let is_cancelled = trip.status == TripStatus::Cancelled;
        if is_cancelled {
            cancelled += 1;
            lost_revenue += trip.fare_or_zero();
        }
        if trip.status == TripStatus::NoShow {
            no_shows += 1;
        }

        count(by_type.entry(trip.trip_type).or_default(), is_cancelled);
        count(
            by_hub
                .entry(label_or_unassigned(trip.hub_name.as_deref()))
                .or_default(),
            is_cancelled,
        );
        count(
            by_driver
                .entry(label_or_unassigned(trip.driver_name.as_deref()))
                .or_default(),
            is_cancelled,
        );
        count(
            by_customer
                .entry(label_or_unassigned(trip.customer_name.as_deref()))
                .or_default(),
            is_cancelled,
        );
    }

    let total_trips = trips.len() as i64;
    ReportOutcome::Ready(CancellationAnalysis {
        total_trips,
        cancelled,
        no_shows,
        cancellation_rate: percentage(cancelled, total_trips),
        lost_revenue,
        by_type: groups(by_type.into_iter().map(|(k, c)| (k.to_string(), c))),
        by_hub: groups(by_hub),
        by_driver: groups(by_driver),
        by_customer: groups(by_customer),
    })
}

fn count(slot: &mut (i64, i64), is_cancelled: bool) {
    slot.0 += 1;
    if is_cancelled {
        slot.1 += 1;
    }
}

/// Most cancellations first. Groups with none are dropped.
fn groups(counts: impl IntoIterator<Item = (String, (i64, i64))>) -> Vec<CancellationGroup> {
    let mut rows: Vec<CancellationGroup> = counts
        .into_iter()
        .filter(|(_, (_, cancelled))| *cancelled > 0)
        .map(|(key, (trips, cancelled))| CancellationGroup {
            key,
            trips,
            cancelled,
            cancellation_rate: percentage(cancelled, trips),
        })
        .collect();
    rows.sort_by(|a, b| b.cancelled.cmp(&a.cancelled));
    rows
}
