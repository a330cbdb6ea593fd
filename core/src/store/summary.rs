use super::BookingStore;
use crate::{
    error::ReportResult,
    gateway::{DailySummaryRow, WeeklySummaryRow},
    trip::TripType,
};
use chrono::{Datelike, NaiveDate};
use rusqlite::params;

type RollupRow = (NaiveDate, String, i64, i64, i64, i64, f64);

impl BookingStore {
    // ── Precomputed rollups ────────────────────────────────────

    pub fn daily_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<DailySummaryRow>> {
        let rows = self.rollup("date(f.start_time)", from, to, hub_id)?;
        rows.into_iter()
            .map(|(date, trip_type, trips, completed, cancelled, revenue, km)| {
                Ok(DailySummaryRow {
                    date,
                    trip_type: trip_type.parse::<TripType>()?,
                    trip_count: trips,
                    completed_count: completed,
                    cancelled_count: cancelled,
                    revenue,
                    km,
                })
            })
            .collect()
    }

    pub fn weekly_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<WeeklySummaryRow>> {
        // 'weekday 0' moves to the next Sunday (or stays); -6 days lands on Monday.
        let rows = self.rollup("date(f.start_time, 'weekday 0', '-6 days')", from, to, hub_id)?;
        rows.into_iter()
            .map(|(week_start, trip_type, trips, completed, cancelled, revenue, km)| {
                let iso = week_start.iso_week();
                Ok(WeeklySummaryRow {
                    week_start,
                    iso_week: format!("{}-W{:02}", iso.year(), iso.week()),
                    trip_type: trip_type.parse::<TripType>()?,
                    trip_count: trips,
                    completed_count: completed,
                    cancelled_count: cancelled,
                    revenue,
                    km,
                })
            })
            .collect()
    }

    /// Group trips joined to their live source facts by `bucket_expr`.
    fn rollup(
        &self,
        bucket_expr: &str,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<RollupRow>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {bucket_expr} AS bucket, t.type,
                    COUNT(*),
                    SUM(CASE WHEN t.status = 'completed' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN t.status = 'cancelled' THEN 1 ELSE 0 END),
                    COALESCE(SUM(f.fare), 0),
                    COALESCE(SUM(f.km), 0.0)
             FROM trips t
             JOIN trip_facts f ON f.type = t.type AND f.ref_id = t.ref_id
             WHERE f.start_time IS NOT NULL
               AND date(f.start_time) BETWEEN ?1 AND ?2
               AND (?3 IS NULL OR f.hub_id = ?3)
             GROUP BY bucket, t.type
             ORDER BY bucket ASC, t.type ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![from, to, hub_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<Result<Vec<RollupRow>, _>>()?;
        Ok(rows)
    }
}
