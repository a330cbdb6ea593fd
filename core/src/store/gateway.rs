use super::BookingStore;
use crate::{
    error::ReportResult,
    gateway::{BookingSourceGateway, DailySummaryRow, TripQuery, WeeklySummaryRow},
    payments::PaymentRecord,
    source::SourceRecord,
    trip::{TripRecord, TripType},
    types::{RefId, TripId},
};
use async_trait::async_trait;
use chrono::NaiveDate;

// SQLite calls complete synchronously; each future resolves on first poll.
#[async_trait]
impl BookingSourceGateway for BookingStore {
    async fn fetch_trips(&self, query: &TripQuery) -> ReportResult<Vec<TripRecord>> {
        self.trip_records(query)
    }

    async fn fetch_source_records(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>> {
        self.source_records(trip_type, ref_ids)
    }

    async fn fetch_payments(
        &self,
        trip_ids: &[TripId],
        status_filter: Option<&str>,
    ) -> ReportResult<Vec<PaymentRecord>> {
        self.payment_records(trip_ids, status_filter)
    }

    async fn fetch_daily_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<DailySummaryRow>> {
        self.daily_summary(from, to, hub_id)
    }

    async fn fetch_weekly_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<WeeklySummaryRow>> {
        self.weekly_summary(from, to, hub_id)
    }

    async fn count_active_subscriptions(&self) -> ReportResult<i64> {
        self.active_subscription_count()
    }
}
