//! PaymentEnricher: attaches settlement data to trips for reporting.
//!
//! The live dashboard never enriches. A failed payments fetch degrades
//! to an empty map: every trip then reads as "no payment data".

use crate::{
    gateway::BookingSourceGateway,
    trip::Trip,
    types::{Paise, TripId},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

pub const COMPLETED_PAYMENT: &str = "completed";

/// Display bucket for a raw payment method token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentMode {
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Others,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 3] = [PaymentMode::Cash, PaymentMode::Upi, PaymentMode::Others];

    pub fn from_method(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" => Self::Cash,
            "upi" => Self::Upi,
            _ => Self::Others,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Upi => "UPI",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub trip_id: TripId,
    /// Raw method token as stored upstream.
    pub method: String,
    pub status: String,
    pub amount: Paise,
}

impl PaymentRecord {
    pub fn mode(&self) -> PaymentMode {
        PaymentMode::from_method(&self.method)
    }

    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case(COMPLETED_PAYMENT)
    }
}

/// Which payment rows a report asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentScope {
    /// Revenue attribution: completed payments only.
    CompletedOnly,
    /// Outstanding-payment views: every status.
    AllStatuses,
}

impl PaymentScope {
    pub fn status_filter(&self) -> Option<&'static str> {
        match self {
            Self::CompletedOnly => Some(COMPLETED_PAYMENT),
            Self::AllStatuses => None,
        }
    }
}

/// Payments keyed by trip id.
///
/// When several rows exist for one trip, the first completed row in
/// gateway order wins; without any completed row, the first row wins.
#[derive(Debug, Clone, Default)]
pub struct PaymentMap {
    by_trip: HashMap<TripId, PaymentRecord>,
}

impl PaymentMap {
    pub fn from_records(records: Vec<PaymentRecord>) -> Self {
        let mut by_trip: HashMap<TripId, PaymentRecord> = HashMap::new();
        for record in records {
            let replace = match by_trip.get(&record.trip_id) {
                None => true,
                Some(existing) if existing.is_completed() => {
                    if record.is_completed() {
                        log::debug!(
                            "trip {}: ignoring additional completed payment ({} {})",
                            record.trip_id,
                            record.method,
                            record.amount,
                        );
                    }
                    false
                }
                Some(_) => record.is_completed(),
            };
            if replace {
                by_trip.insert(record.trip_id.clone(), record);
            }
        }
        Self { by_trip }
    }

    pub fn get(&self, trip_id: &str) -> Option<&PaymentRecord> {
        self.by_trip.get(trip_id)
    }

    pub fn len(&self) -> usize {
        self.by_trip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_trip.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedTrip {
    pub trip: Trip,
    pub payment: Option<PaymentRecord>,
}

impl EnrichedTrip {
    pub fn without_payment(trip: Trip) -> Self {
        Self { trip, payment: None }
    }

    /// Mode of the completed payment, if the trip has one.
    pub fn paid_mode(&self) -> Option<PaymentMode> {
        self.payment
            .as_ref()
            .filter(|p| p.is_completed())
            .map(PaymentRecord::mode)
    }

    pub fn is_paid(&self) -> bool {
        self.paid_mode().is_some()
    }
}

pub struct PaymentEnricher;

impl PaymentEnricher {
    pub async fn fetch_map<G>(gateway: &G, trips: &[Trip], scope: PaymentScope) -> PaymentMap
    where
        G: BookingSourceGateway + ?Sized,
    {
        if trips.is_empty() {
            return PaymentMap::default();
        }
        let trip_ids: Vec<TripId> = trips.iter().map(|t| t.id.clone()).collect();
        match gateway.fetch_payments(&trip_ids, scope.status_filter()).await {
            Ok(records) => PaymentMap::from_records(records),
            Err(e) => {
                log::warn!(
                    "payments fetch failed for {} trips, reporting without payment data: {e}",
                    trip_ids.len(),
                );
                PaymentMap::default()
            }
        }
    }

    pub async fn enrich<G>(gateway: &G, trips: Vec<Trip>, scope: PaymentScope) -> Vec<EnrichedTrip>
    where
        G: BookingSourceGateway + ?Sized,
    {
        let map = Self::fetch_map(gateway, &trips, scope).await;
        Self::attach(trips, &map)
    }

    pub fn attach(trips: Vec<Trip>, map: &PaymentMap) -> Vec<EnrichedTrip> {
        trips
            .into_iter()
            .map(|trip| {
                let payment = map.get(&trip.id).cloned();
                EnrichedTrip { trip, payment }
            })
            .collect()
    }
}
