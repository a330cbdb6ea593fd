//! SQLite booking store.
//!
//! RULE: Only the store talks to the database.
//! The reporting pipeline reaches it through BookingSourceGateway and
//! never executes SQL directly. Insert helpers exist for seeding only.

mod gateway;
mod sources;
mod summary;

use crate::{
    error::{ReportError, ReportResult},
    payments::PaymentRecord,
    trip::{TripRecord, TripType},
    types::Paise,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use std::sync::{Mutex, MutexGuard};

/// Maximum bound parameters per `IN (...)` list.
const IN_CHUNK: usize = 500;

pub struct BookingStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone)]
pub struct HubRow {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PersonRow {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub id: String,
    pub registration: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRow {
    pub id: String,
    pub customer_id: Option<String>,
    pub hub_id: Option<String>,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub route_km: Option<f64>,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRideRow {
    pub id: String,
    pub subscription_id: String,
    pub ride_date: NaiveDate,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
    pub actual_km: Option<f64>,
}

/// Airport, rental and manual bookings share one shape.
#[derive(Debug, Clone)]
pub struct BookingRow {
    pub id: String,
    pub customer_id: Option<String>,
    pub hub_id: Option<String>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub pickup: Option<String>,
    pub drop: Option<String>,
    pub fare: Option<Paise>,
    pub est_km: Option<f64>,
}

/// Table and start-time column of the direct booking kinds.
fn booking_table(trip_type: TripType) -> Option<(&'static str, &'static str)> {
    match trip_type {
        TripType::Airport => Some(("airport_bookings", "pickup_time")),
        TripType::Rental => Some(("rental_bookings", "start_time")),
        TripType::Manual => Some(("manual_rides", "scheduled_at")),
        TripType::Subscription => None,
    }
}

fn source_table(trip_type: TripType) -> &'static str {
    match booking_table(trip_type) {
        Some((table, _)) => table,
        None => "subscription_rides",
    }
}

/// `?{first},?{first+1},...` for `n` parameters.
fn placeholders(first: usize, n: usize) -> String {
    (first..first + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(",")
}

impl BookingStore {
    pub fn open(path: &str) -> ReportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ReportResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ReportResult<()> {
        self.conn()?
            .execute_batch(include_str!("../../../migrations/001_bookings.sql"))?;
        Ok(())
    }

    fn conn(&self) -> ReportResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ReportError::Other(anyhow::anyhow!("booking store connection poisoned")))
    }

    // ── Reference entities ─────────────────────────────────────

    pub fn insert_hub(&self, hub: &HubRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO hubs (id, name) VALUES (?1, ?2)",
            params![hub.id, hub.name],
        )?;
        Ok(())
    }

    pub fn insert_driver(&self, driver: &PersonRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO drivers (id, name, phone) VALUES (?1, ?2, ?3)",
            params![driver.id, driver.name, driver.phone],
        )?;
        Ok(())
    }

    pub fn insert_customer(&self, customer: &PersonRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO customers (id, name, phone) VALUES (?1, ?2, ?3)",
            params![customer.id, customer.name, customer.phone],
        )?;
        Ok(())
    }

    pub fn insert_vehicle(&self, vehicle: &VehicleRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO vehicles (id, registration, status) VALUES (?1, ?2, ?3)",
            params![vehicle.id, vehicle.registration, vehicle.status],
        )?;
        Ok(())
    }

    // ── Bookings ───────────────────────────────────────────────

    pub fn insert_subscription(&self, sub: &SubscriptionRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO subscriptions (
                id, customer_id, hub_id, pickup, drop_location, route_km,
                status, start_date, end_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sub.id,
                sub.customer_id,
                sub.hub_id,
                sub.pickup,
                sub.drop,
                sub.route_km,
                sub.status,
                sub.start_date,
                sub.end_date,
            ],
        )?;
        Ok(())
    }

    pub fn insert_subscription_ride(&self, ride: &SubscriptionRideRow) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO subscription_rides (
                id, subscription_id, ride_date, driver_id, vehicle_id,
                fare, est_km, actual_km
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                ride.id,
                ride.subscription_id,
                ride.ride_date,
                ride.driver_id,
                ride.vehicle_id,
                ride.fare,
                ride.est_km,
                ride.actual_km,
            ],
        )?;
        Ok(())
    }

    /// Insert an airport, rental or manual booking.
    pub fn insert_booking(&self, trip_type: TripType, row: &BookingRow) -> ReportResult<()> {
        let Some((table, time_column)) = booking_table(trip_type) else {
            return Err(ReportError::Other(anyhow::anyhow!(
                "subscription rides are inserted with insert_subscription_ride"
            )));
        };
        let sql = format!(
            "INSERT INTO {table} (
                id, customer_id, hub_id, driver_id, vehicle_id, {time_column},
                pickup, drop_location, fare, est_km
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        );
        self.conn()?.execute(
            &sql,
            params![
                row.id,
                row.customer_id,
                row.hub_id,
                row.driver_id,
                row.vehicle_id,
                row.start_time,
                row.pickup,
                row.drop,
                row.fare,
                row.est_km,
            ],
        )?;
        Ok(())
    }

    /// Soft-delete a source row; its trip then normalizes to a shell.
    pub fn soft_delete_source(
        &self,
        trip_type: TripType,
        ref_id: &str,
        at: NaiveDateTime,
    ) -> ReportResult<()> {
        let sql = format!(
            "UPDATE {} SET deleted_at = ?1 WHERE id = ?2",
            source_table(trip_type)
        );
        self.conn()?.execute(&sql, params![at, ref_id])?;
        Ok(())
    }

    /// Soft-delete a subscription. Its rides stay, but lose the joined
    /// hub, customer and route.
    pub fn soft_delete_subscription(&self, id: &str, at: NaiveDateTime) -> ReportResult<()> {
        self.conn()?.execute(
            "UPDATE subscriptions SET deleted_at = ?1 WHERE id = ?2",
            params![at, id],
        )?;
        Ok(())
    }

    // ── Trips and payments ─────────────────────────────────────

    pub fn insert_trip(&self, trip: &TripRecord) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO trips (id, type, ref_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                trip.id,
                trip.trip_type.as_str(),
                trip.ref_id,
                trip.status.as_str(),
                trip.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn insert_payment(
        &self,
        payment: &PaymentRecord,
        created_at: NaiveDateTime,
    ) -> ReportResult<()> {
        self.conn()?.execute(
            "INSERT INTO payments (trip_id, method, status, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                payment.trip_id,
                payment.method,
                payment.status,
                payment.amount,
                created_at,
            ],
        )?;
        Ok(())
    }

    pub fn trip_count(&self) -> ReportResult<i64> {
        let n = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        Ok(n)
    }
}
