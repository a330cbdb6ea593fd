//! BookingSourceGateway: the query-service boundary.
//!
//! RULE: The pipeline reads booking data only through this trait.
//! Implementations own all storage concerns; the core never issues
//! queries of its own and never writes.

use crate::{
    error::ReportResult,
    payments::PaymentRecord,
    source::SourceRecord,
    trip::{TripRecord, TripStatus, TripType},
    types::{Paise, RefId, TripId},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TRIP_LIMIT: i64 = 5000;

/// Server-side pushdown for the parent trip fetch.
///
/// `limit` caps one page. `offset` skips rows of the same ordering, so a
/// caller that needs the whole history pages until a short page comes back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripQuery {
    pub trip_type: Option<TripType>,
    pub status: Option<TripStatus>,
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for TripQuery {
    fn default() -> Self {
        Self {
            trip_type: None,
            status: None,
            limit: DEFAULT_TRIP_LIMIT,
            offset: 0,
        }
    }
}

impl TripQuery {
    pub fn all(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// The page that follows this one.
    pub fn next_page(self) -> Self {
        Self {
            offset: self.offset + self.limit.max(1),
            ..self
        }
    }
}

/// Precomputed per-day rollup, one row per (date, trip type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySummaryRow {
    pub date: NaiveDate,
    pub trip_type: TripType,
    pub trip_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub revenue: Paise,
    pub km: f64,
}

/// Precomputed per-ISO-week rollup, one row per (week, trip type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklySummaryRow {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    /// `YYYY-Www` label.
    pub iso_week: String,
    pub trip_type: TripType,
    pub trip_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub revenue: Paise,
    pub km: f64,
}

#[async_trait]
pub trait BookingSourceGateway: Send + Sync {
    /// Parent trip rows, newest `created_at` first, ties by id.
    async fn fetch_trips(&self, query: &TripQuery) -> ReportResult<Vec<TripRecord>>;

    /// Joined source rows of one booking kind, excluding soft-deleted rows.
    async fn fetch_source_records(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>>;

    /// Payment rows for the given trips, in storage order.
    async fn fetch_payments(
        &self,
        trip_ids: &[TripId],
        status_filter: Option<&str>,
    ) -> ReportResult<Vec<PaymentRecord>>;

    async fn fetch_daily_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<DailySummaryRow>>;

    async fn fetch_weekly_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<WeeklySummaryRow>>;

    /// Subscriptions currently in `active` status.
    async fn count_active_subscriptions(&self) -> ReportResult<i64>;
}
