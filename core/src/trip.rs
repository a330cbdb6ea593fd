//! The canonical Trip: one derived view over all four booking kinds.
//!
//! A Trip is reconstructed on every query and never persisted.
//! Every Trip is backed by exactly one source record addressed by
//! `(trip_type, ref_id)`; when that record cannot be joined the Trip
//! degrades to a shell instead of being dropped.

use crate::{
    error::{ReportError, ReportResult},
    types::{Paise, RefId, TripId},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Subscription,
    Airport,
    Rental,
    Manual,
}

impl TripType {
    pub const ALL: [TripType; 4] = [
        TripType::Subscription,
        TripType::Airport,
        TripType::Rental,
        TripType::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Airport => "airport",
            Self::Rental => "rental",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "subscription" => Ok(Self::Subscription),
            "airport" => Ok(Self::Airport),
            "rental" => Ok(Self::Rental),
            "manual" => Ok(Self::Manual),
            other => Err(ReportError::UnknownTripType(other.to_string())),
        }
    }
}

/// Trip lifecycle.
///
/// `created -> assigned -> enroute -> completed`, with `cancelled` and
/// `no_show` reachable from any incomplete state. Terminal states never move.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Created,
    Assigned,
    Enroute,
    Completed,
    NoShow,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::Enroute => "enroute",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Created | Self::Assigned | Self::Enroute)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_incomplete()
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        match (self, next) {
            (Self::Created, Self::Assigned)
            | (Self::Assigned, Self::Enroute)
            | (Self::Enroute, Self::Completed) => true,
            (from, Self::Cancelled | Self::NoShow) => from.is_incomplete(),
            _ => false,
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "created" => Ok(Self::Created),
            "assigned" => Ok(Self::Assigned),
            "enroute" => Ok(Self::Enroute),
            "completed" => Ok(Self::Completed),
            "no_show" => Ok(Self::NoShow),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ReportError::UnknownStatus(other.to_string())),
        }
    }
}

/// The parent trip row as returned by `fetch_trips`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRecord {
    pub id: TripId,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub ref_id: RefId,
    pub status: TripStatus,
    pub created_at: NaiveDateTime,
}

impl TripRecord {
    pub fn parse(
        id: String,
        trip_type: &str,
        ref_id: String,
        status: &str,
        created_at: NaiveDateTime,
    ) -> ReportResult<Self> {
        Ok(Self {
            id,
            trip_type: trip_type.parse()?,
            ref_id,
            status: status.parse()?,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: TripId,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub ref_id: RefId,
    pub created_at: NaiveDateTime,
    pub start_time: Option<NaiveDateTime>,
    pub status: TripStatus,
    pub hub_id: Option<String>,
    pub hub_name: Option<String>,
    pub route: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub driver_name: Option<String>,
    pub vehicle_reg: Option<String>,
    pub vehicle_status: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub actual_km: Option<f64>,
    /// True when the backing source record could not be joined.
    pub source_missing: bool,
}

impl Trip {
    /// A trip whose source record is gone: identity intact, display fields null.
    pub fn shell(parent: &TripRecord) -> Self {
        Self {
            id: parent.id.clone(),
            trip_type: parent.trip_type,
            ref_id: parent.ref_id.clone(),
            created_at: parent.created_at,
            start_time: None,
            status: parent.status,
            hub_id: None,
            hub_name: None,
            route: None,
            customer_name: None,
            customer_phone: None,
            driver_name: None,
            vehicle_reg: None,
            vehicle_status: None,
            fare: None,
            est_km: None,
            actual_km: None,
            source_missing: true,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_time.map(|t| t.date())
    }

    pub fn fare_or_zero(&self) -> Paise {
        self.fare.unwrap_or(0)
    }

    /// Distance used for km totals: actual when recorded, else the estimate.
    pub fn distance_km(&self) -> f64 {
        self.actual_km.or(self.est_km).unwrap_or(0.0)
    }
}

/// "pickup → drop"; falls back to whichever end is known.
pub fn route_label(pickup: Option<&str>, drop: Option<&str>) -> Option<String> {
    let pickup = pickup.map(str::trim).filter(|s| !s.is_empty());
    let drop = drop.map(str::trim).filter(|s| !s.is_empty());
    match (pickup, drop) {
        (Some(p), Some(d)) => Some(format!("{p} → {d}")),
        (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
        (None, None) => None,
    }
}
