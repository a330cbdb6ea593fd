//! Revenue and counts per payment mode, sliced by day, trip type and hub.
//!
//! Fed with payments of every status: a trip counts toward a mode only
//! when its attached payment is completed, otherwise it is outstanding.

use super::{label_or_unassigned, Granularity, ReportOutcome};
use crate::{
    payments::{EnrichedTrip, PaymentMode},
    types::{percentage, Paise, TripId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModeTotals {
    pub trips: i64,
    /// Sum of trip fares.
    pub revenue: Paise,
    /// Sum of completed payment amounts.
    pub collected: Paise,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeSlice {
    pub mode: PaymentMode,
    pub key: String,
    pub trips: i64,
    pub revenue: Paise,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Outstanding {
    pub trips: i64,
    pub amount: Paise,
    pub trip_ids: Vec<TripId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentModeAnalysis {
    pub totals: BTreeMap<PaymentMode, ModeTotals>,
    /// Share of paid trips per mode, 0-100.
    pub share: BTreeMap<PaymentMode, f64>,
    pub by_day: Vec<ModeSlice>,
    pub by_type: Vec<ModeSlice>,
    pub by_hub: Vec<ModeSlice>,
    pub outstanding: Outstanding,
}

type SliceMap = BTreeMap<(PaymentMode, String), (i64, Paise)>;

pub fn payment_mode_analysis(trips: &[EnrichedTrip]) -> ReportOutcome<PaymentModeAnalysis> {
    if trips.is_empty() {
        return ReportOutcome::NoData;
    }

    let mut totals: BTreeMap<PaymentMode, ModeTotals> = BTreeMap::new();
    let mut by_day = SliceMap::new();
    let mut by_type = SliceMap::new();
    let mut by_hub = SliceMap::new();
    let mut outstanding = Outstanding::default();

    for enriched in trips {
        let trip = &enriched.trip;
        let fare = trip.fare_or_zero();
        let paid = enriched.payment.as_ref().filter(|p| p.is_completed());
        let Some(payment) = paid else {
            outstanding.trips += 1;
            outstanding.amount += fare;
            outstanding.trip_ids.push(trip.id.clone());
            continue;
        };

        let mode = payment.mode();
        let entry = totals.entry(mode).or_default();
        entry.trips += 1;
        entry.revenue += fare;
        entry.collected += payment.amount;

        if let Some(date) = trip.start_date() {
            bump(&mut by_day, mode, Granularity::Day.key(date), fare);
        }
        bump(&mut by_type, mode, trip.trip_type.to_string(), fare);
        bump(&mut by_hub, mode, label_or_unassigned(trip.hub_name.as_deref()), fare);
    }

    let paid_trips: i64 = totals.values().map(|t| t.trips).sum();
    let share = totals
        .iter()
        .map(|(mode, t)| (*mode, percentage(t.trips, paid_trips)))
        .collect();

    ReportOutcome::Ready(PaymentModeAnalysis {
        totals,
        share,
        by_day: slices(by_day),
        by_type: slices(by_type),
        by_hub: slices(by_hub),
        outstanding,
    })
}

fn bump(map: &mut SliceMap, mode: PaymentMode, key: String, fare: Paise) {
    let slot = map.entry((mode, key)).or_insert((0, 0));
    slot.0 += 1;
    slot.1 += fare;
}

fn slices(map: SliceMap) -> Vec<ModeSlice> {
    map.into_iter()
        .map(|((mode, key), (trips, revenue))| ModeSlice {
            mode,
            key,
            trips,
            revenue,
        })
        .collect()
}
