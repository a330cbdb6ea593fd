//! Daily and weekly summaries computed from the trip stream.
//!
//! The precomputed rollups served by the gateway cover the same ground
//! without payment breakdowns; see `ReportEngine::daily_rollup`.

use super::{Granularity, ReportOutcome, Tally};
use crate::{
    payments::{EnrichedTrip, PaymentMode},
    trip::TripType,
    types::Paise,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub period: String,
    pub trips: i64,
    pub revenue: Paise,
    pub km: f64,
    pub by_type: BTreeMap<TripType, Tally>,
    pub by_mode: BTreeMap<PaymentMode, Tally>,
    /// Trips without a completed payment.
    pub unpaid: Tally,
}

/// One row per period, oldest first.
pub fn period_summary(
    trips: &[EnrichedTrip],
    granularity: Granularity,
) -> ReportOutcome<Vec<PeriodSummary>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut periods: BTreeMap<String, PeriodSummary> = BTreeMap::new();
    for enriched in trips {
        let trip = &enriched.trip;
        let Some(date) = trip.start_date() else {
            continue;
        };
        let key = granularity.key(date);
        let row = periods.entry(key.clone()).or_insert_with(|| PeriodSummary {
            period: key,
            ..PeriodSummary::default()
        });

        row.trips += 1;
        row.revenue += trip.fare_or_zero();
        row.km += trip.distance_km();
        row.by_type.entry(trip.trip_type).or_default().add(trip);
        match enriched.paid_mode() {
            Some(mode) => row.by_mode.entry(mode).or_default().add(trip),
            None => row.unpaid.add(trip),
        }
    }

    ReportOutcome::Ready(periods.into_values().collect())
}
