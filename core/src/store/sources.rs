use super::{booking_table, placeholders, BookingStore, IN_CHUNK};
use crate::{
    error::ReportResult,
    gateway::TripQuery,
    payments::PaymentRecord,
    source::{
        AirportBooking, JoinedAttributes, ManualRide, RentalBooking, SourceRecord,
        SubscriptionRide,
    },
    trip::{TripRecord, TripType},
    types::{RefId, TripId},
};
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Row};

/// Columns shared by airport, rental and manual rows, in select order.
struct DirectRow {
    id: String,
    start: Option<NaiveDateTime>,
    pickup: Option<String>,
    drop: Option<String>,
    fare: Option<i64>,
    est_km: Option<f64>,
    joined: JoinedAttributes,
}

fn joined_from(row: &Row<'_>, first: usize) -> rusqlite::Result<JoinedAttributes> {
    Ok(JoinedAttributes {
        hub_id: row.get(first)?,
        hub_name: row.get(first + 1)?,
        customer_name: row.get(first + 2)?,
        customer_phone: row.get(first + 3)?,
        driver_name: row.get(first + 4)?,
        vehicle_reg: row.get(first + 5)?,
        vehicle_status: row.get(first + 6)?,
    })
}

impl BookingStore {
    // ── Parent trips ───────────────────────────────────────────

    pub fn trip_records(&self, query: &TripQuery) -> ReportResult<Vec<TripRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, type, ref_id, status, created_at
             FROM trips
             WHERE (?1 IS NULL OR type = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id ASC
             LIMIT ?3 OFFSET ?4",
        )?;
        let raw = stmt
            .query_map(
                params![
                    query.trip_type.map(|t| t.as_str()),
                    query.status.map(|s| s.as_str()),
                    query.limit.max(1),
                    query.offset.max(0),
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, NaiveDateTime>(4)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, trip_type, ref_id, status, created_at)| {
                TripRecord::parse(id, &trip_type, ref_id, &status, created_at)
            })
            .collect()
    }

    // ── Joined source rows ─────────────────────────────────────

    pub fn source_records(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>> {
        let mut out = Vec::with_capacity(ref_ids.len());
        for chunk in ref_ids.chunks(IN_CHUNK) {
            match trip_type {
                TripType::Subscription => out.extend(self.subscription_rides(chunk)?),
                direct => out.extend(self.direct_bookings(direct, chunk)?),
            }
        }
        Ok(out)
    }

    fn subscription_rides(&self, ref_ids: &[RefId]) -> ReportResult<Vec<SourceRecord>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT r.id, r.subscription_id, r.ride_date, s.pickup, s.drop_location,
                    r.fare, r.est_km, r.actual_km, s.route_km,
                    h.id, h.name, c.name, c.phone, d.name, v.registration, v.status
             FROM subscription_rides r
             LEFT JOIN subscriptions s ON s.id = r.subscription_id AND s.deleted_at IS NULL
             LEFT JOIN hubs h ON h.id = s.hub_id
             LEFT JOIN customers c ON c.id = s.customer_id
             LEFT JOIN drivers d ON d.id = r.driver_id
             LEFT JOIN vehicles v ON v.id = r.vehicle_id
             WHERE r.deleted_at IS NULL AND r.id IN ({})",
            placeholders(1, ref_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ref_ids.iter()), |row| {
                Ok(SourceRecord::Subscription(SubscriptionRide {
                    ref_id: row.get(0)?,
                    subscription_id: row.get(1)?,
                    ride_date: row.get(2)?,
                    pickup: row.get(3)?,
                    drop: row.get(4)?,
                    fare: row.get(5)?,
                    est_km: row.get(6)?,
                    actual_km: row.get(7)?,
                    subscription_route_km: row.get(8)?,
                    joined: joined_from(row, 9)?,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn direct_bookings(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>> {
        let Some((table, time_column)) = booking_table(trip_type) else {
            return Ok(Vec::new());
        };
        let conn = self.conn()?;
        let sql = format!(
            "SELECT b.id, b.{time_column}, b.pickup, b.drop_location, b.fare, b.est_km,
                    h.id, h.name, c.name, c.phone, d.name, v.registration, v.status
             FROM {table} b
             LEFT JOIN hubs h ON h.id = b.hub_id
             LEFT JOIN customers c ON c.id = b.customer_id
             LEFT JOIN drivers d ON d.id = b.driver_id
             LEFT JOIN vehicles v ON v.id = b.vehicle_id
             WHERE b.deleted_at IS NULL AND b.id IN ({})",
            placeholders(1, ref_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ref_ids.iter()), |row| {
                Ok(DirectRow {
                    id: row.get(0)?,
                    start: row.get(1)?,
                    pickup: row.get(2)?,
                    drop: row.get(3)?,
                    fare: row.get(4)?,
                    est_km: row.get(5)?,
                    joined: joined_from(row, 6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .map(|r| match trip_type {
                TripType::Airport => SourceRecord::Airport(AirportBooking {
                    ref_id: r.id,
                    pickup_time: r.start,
                    pickup: r.pickup,
                    drop: r.drop,
                    fare: r.fare,
                    est_km: r.est_km,
                    joined: r.joined,
                }),
                TripType::Rental => SourceRecord::Rental(RentalBooking {
                    ref_id: r.id,
                    start_time: r.start,
                    pickup: r.pickup,
                    drop: r.drop,
                    fare: r.fare,
                    est_km: r.est_km,
                    joined: r.joined,
                }),
                _ => SourceRecord::Manual(ManualRide {
                    ref_id: r.id,
                    scheduled_at: r.start,
                    pickup: r.pickup,
                    drop: r.drop,
                    fare: r.fare,
                    est_km: r.est_km,
                    joined: r.joined,
                }),
            })
            .collect())
    }

    // ── Payments ───────────────────────────────────────────────

    pub fn payment_records(
        &self,
        trip_ids: &[TripId],
        status_filter: Option<&str>,
    ) -> ReportResult<Vec<PaymentRecord>> {
        let conn = self.conn()?;
        let mut out = Vec::new();
        for chunk in trip_ids.chunks(IN_CHUNK) {
            let mut values: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let status_clause = match status_filter {
                Some(status) => {
                    values.push(status);
                    format!(" AND status = ?{}", chunk.len() + 1)
                }
                None => String::new(),
            };
            let sql = format!(
                "SELECT trip_id, method, status, amount
                 FROM payments
                 WHERE trip_id IN ({}){status_clause}
                 ORDER BY id ASC",
                placeholders(1, chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(PaymentRecord {
                        trip_id: row.get(0)?,
                        method: row.get(1)?,
                        status: row.get(2)?,
                        amount: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            out.extend(rows);
        }
        Ok(out)
    }

    pub fn active_subscription_count(&self) -> ReportResult<i64> {
        let n = self.conn()?.query_row(
            "SELECT COUNT(*) FROM subscriptions
             WHERE status = 'active' AND deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
