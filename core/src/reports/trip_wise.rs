use super::ReportOutcome;
use crate::{
    payments::{EnrichedTrip, PaymentMode},
    trip::Trip,
    types::format_paise,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRow {
    #[serde(flatten)]
    pub trip: Trip,
    pub payment_method: Option<PaymentMode>,
    pub payment_status: Option<String>,
    /// Fare in major units, for display only.
    pub fare_display: Option<String>,
}

/// One row per trip, in stream order.
pub fn trip_rows(trips: &[EnrichedTrip]) -> ReportOutcome<Vec<TripRow>> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }
    ReportOutcome::Ready(
        trips
            .iter()
            .map(|enriched| TripRow {
                trip: enriched.trip.clone(),
                payment_method: enriched.payment.as_ref().map(|p| p.mode()),
                payment_status: enriched.payment.as_ref().map(|p| p.status.clone()),
                fare_display: enriched.trip.fare.map(format_paise),
            })
            .collect(),
    )
}
