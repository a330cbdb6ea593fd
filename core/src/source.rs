//! Source records: the four booking tables as one tagged union.
//!
//! Each variant knows how to project itself onto the canonical Trip
//! through the `CanonicalTrip` capability; the normalizer never
//! branches on the booking kind itself.

use crate::{
    trip::{route_label, Trip, TripRecord, TripType},
    types::{Paise, RefId},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Driver/vehicle/customer/hub attributes joined onto every source row.
/// Each field is independently null when its join target is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JoinedAttributes {
    pub hub_id: Option<String>,
    pub hub_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub driver_name: Option<String>,
    pub vehicle_reg: Option<String>,
    pub vehicle_status: Option<String>,
}

/// Knobs the projection needs that are not part of any source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDefaults {
    /// Time of day assigned to subscription rides, which only carry a date.
    pub subscription_start_time: NaiveTime,
}

impl Default for SourceDefaults {
    fn default() -> Self {
        Self {
            subscription_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

pub trait CanonicalTrip {
    fn ref_id(&self) -> &str;
    fn trip_type(&self) -> TripType;
    fn to_canonical_trip(&self, parent: &TripRecord, defaults: &SourceDefaults) -> Trip;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionRide {
    pub ref_id: RefId,
    pub subscription_id: String,
    pub ride_date: NaiveDate,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub actual_km: Option<f64>,
    /// Route distance of the parent subscription, used when the ride has no estimate.
    pub subscription_route_km: Option<f64>,
    pub joined: JoinedAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AirportBooking {
    pub ref_id: RefId,
    pub pickup_time: Option<NaiveDateTime>,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub joined: JoinedAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RentalBooking {
    pub ref_id: RefId,
    pub start_time: Option<NaiveDateTime>,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub joined: JoinedAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManualRide {
    pub ref_id: RefId,
    pub scheduled_at: Option<NaiveDateTime>,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub joined: JoinedAttributes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceRecord {
    Subscription(SubscriptionRide),
    Airport(AirportBooking),
    Rental(RentalBooking),
    Manual(ManualRide),
}

impl SourceRecord {
    pub fn as_canonical(&self) -> &dyn CanonicalTrip {
        match self {
            Self::Subscription(r) => r,
            Self::Airport(r) => r,
            Self::Rental(r) => r,
            Self::Manual(r) => r,
        }
    }

    pub fn key(&self) -> (TripType, RefId) {
        let record = self.as_canonical();
        (record.trip_type(), record.ref_id().to_string())
    }
}

/// Shared projection; the variants differ only in how they supply
/// the start time, route ends and distances.
struct Projection<'a> {
    start_time: Option<NaiveDateTime>,
    pickup: Option<&'a str>,
    drop: Option<&'a str>,
    fare: Option<Paise>,
    est_km: Option<f64>,
    actual_km: Option<f64>,
}

fn project(parent: &TripRecord, joined: &JoinedAttributes, p: Projection<'_>) -> Trip {
    Trip {
        id: parent.id.clone(),
        trip_type: parent.trip_type,
        ref_id: parent.ref_id.clone(),
        created_at: parent.created_at,
        start_time: p.start_time,
        status: parent.status,
        hub_id: joined.hub_id.clone(),
        hub_name: joined.hub_name.clone(),
        route: route_label(p.pickup, p.drop),
        customer_name: joined.customer_name.clone(),
        customer_phone: joined.customer_phone.clone(),
        driver_name: joined.driver_name.clone(),
        vehicle_reg: joined.vehicle_reg.clone(),
        vehicle_status: joined.vehicle_status.clone(),
        fare: p.fare,
        est_km: p.est_km,
        actual_km: p.actual_km,
        source_missing: false,
    }
}

impl CanonicalTrip for SubscriptionRide {
    fn ref_id(&self) -> &str {
        &self.ref_id
    }

    fn trip_type(&self) -> TripType {
        TripType::Subscription
    }

    fn to_canonical_trip(&self, parent: &TripRecord, defaults: &SourceDefaults) -> Trip {
        project(
            parent,
            &self.joined,
            Projection {
                start_time: Some(self.ride_date.and_time(defaults.subscription_start_time)),
                pickup: self.pickup.as_deref(),
                drop: self.drop.as_deref(),
                fare: self.fare,
                // Ride-level estimate first, then the subscription's route distance.
                est_km: self.est_km.or(self.subscription_route_km),
                actual_km: self.actual_km,
            },
        )
    }
}

impl CanonicalTrip for AirportBooking {
    fn ref_id(&self) -> &str {
        &self.ref_id
    }

    fn trip_type(&self) -> TripType {
        TripType::Airport
    }

    fn to_canonical_trip(&self, parent: &TripRecord, _defaults: &SourceDefaults) -> Trip {
        project(
            parent,
            &self.joined,
            Projection {
                start_time: self.pickup_time,
                pickup: self.pickup.as_deref(),
                drop: self.drop.as_deref(),
                fare: self.fare,
                est_km: self.est_km,
                actual_km: None,
            },
        )
    }
}

impl CanonicalTrip for RentalBooking {
    fn ref_id(&self) -> &str {
        &self.ref_id
    }

    fn trip_type(&self) -> TripType {
        TripType::Rental
    }

    fn to_canonical_trip(&self, parent: &TripRecord, _defaults: &SourceDefaults) -> Trip {
        project(
            parent,
            &self.joined,
            Projection {
                start_time: self.start_time,
                pickup: self.pickup.as_deref(),
                drop: self.drop.as_deref(),
                fare: self.fare,
                est_km: self.est_km,
                actual_km: None,
            },
        )
    }
}

impl CanonicalTrip for ManualRide {
    fn ref_id(&self) -> &str {
        &self.ref_id
    }

    fn trip_type(&self) -> TripType {
        TripType::Manual
    }

    fn to_canonical_trip(&self, parent: &TripRecord, _defaults: &SourceDefaults) -> Trip {
        project(
            parent,
            &self.joined,
            Projection {
                start_time: self.scheduled_at,
                pickup: self.pickup.as_deref(),
                drop: self.drop.as_deref(),
                fare: self.fare,
                est_km: self.est_km,
                actual_km: None,
            },
        )
    }
}
