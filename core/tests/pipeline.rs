//! End-to-end runs over an in-memory SQLite booking store.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tripdesk_core::{
    clock::ReportClock,
    config::ReportConfig,
    engine::{ReportEngine, ReportRequest},
    error::{ReportError, ReportResult},
    filter::{DateRange, TripFilter},
    gateway::{BookingSourceGateway, DailySummaryRow, TripQuery, WeeklySummaryRow},
    payments::{PaymentMode, PaymentRecord},
    reports::{ReportKind, ReportOutput},
    source::SourceRecord,
    store::{BookingRow, BookingStore, HubRow, PersonRow, SubscriptionRideRow, SubscriptionRow, VehicleRow},
    trip::{TripRecord, TripStatus, TripType},
    types::{RefId, TripId},
    visibility::VisibilityPolicy,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).expect("date")
}

fn clock() -> ReportClock {
    ReportClock::fixed(at("2026-10-19 08:00:00"))
}

fn person(id: &str, name: &str, phone: &str) -> PersonRow {
    PersonRow {
        id: id.into(),
        name: name.into(),
        phone: Some(phone.into()),
    }
}

fn booking(id: &str, hub: &str, driver: Option<&str>, start: &str, fare: i64, km: f64) -> BookingRow {
    BookingRow {
        id: id.into(),
        customer_id: Some("c-1".into()),
        hub_id: Some(hub.into()),
        driver_id: driver.map(str::to_string),
        vehicle_id: driver.map(|_| "v-1".to_string()),
        start_time: Some(at(start)),
        pickup: Some("Indiranagar".into()),
        drop: Some("Kempegowda Airport".into()),
        fare: Some(fare),
        est_km: Some(km),
    }
}

fn parent(id: &str, trip_type: TripType, ref_id: &str, status: TripStatus, created: &str) -> TripRecord {
    TripRecord {
        id: id.into(),
        trip_type,
        ref_id: ref_id.into(),
        status,
        created_at: at(created),
    }
}

fn payment(trip_id: &str, method: &str, status: &str, amount: i64) -> PaymentRecord {
    PaymentRecord {
        trip_id: trip_id.into(),
        method: method.into(),
        status: status.into(),
        amount,
    }
}

/// Two hubs and four trips, one per booking kind, around 2026-10-19.
///
/// | trip   | kind         | start            | status    | fare    | paid         |
/// |--------|--------------|------------------|-----------|---------|--------------|
/// | t-rent | rental       | 10-20 14:00      | created   | 2500.00 | -            |
/// | t-sub  | subscription | 10-19 09:00      | assigned  | 300.00  | -            |
/// | t-air  | airport      | 10-19 10:00      | completed | 1200.00 | cash         |
/// | t-man  | manual       | 10-18 11:00      | completed | 400.00  | upi          |
fn world() -> BookingStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = BookingStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");

    for (id, name) in [("h-1", "Whitefield"), ("h-2", "Hebbal")] {
        store
            .insert_hub(&HubRow {
                id: id.into(),
                name: name.into(),
            })
            .expect("hub");
    }
    store.insert_driver(&person("d-1", "Ravi Kumar", "9800000001")).expect("driver");
    store.insert_driver(&person("d-2", "Suresh Rao", "9800000002")).expect("driver");
    store
        .insert_vehicle(&VehicleRow {
            id: "v-1".into(),
            registration: "KA 01 AB 1234".into(),
            status: "active".into(),
        })
        .expect("vehicle");
    store.insert_customer(&person("c-1", "Priya Nair", "9876543210")).expect("customer");

    for (id, status) in [("sub-1", "active"), ("sub-2", "paused")] {
        store
            .insert_subscription(&SubscriptionRow {
                id: id.into(),
                customer_id: Some("c-1".into()),
                hub_id: Some("h-1".into()),
                pickup: Some("Whitefield".into()),
                drop: Some("MG Road".into()),
                route_km: Some(18.0),
                status: status.into(),
                start_date: day(1),
                end_date: None,
            })
            .expect("subscription");
    }
    store
        .insert_subscription_ride(&SubscriptionRideRow {
            id: "r-1".into(),
            subscription_id: "sub-1".into(),
            ride_date: day(19),
            driver_id: Some("d-2".into()),
            vehicle_id: None,
            fare: Some(30_000),
            est_km: None,
            actual_km: None,
        })
        .expect("ride");

    store
        .insert_booking(TripType::Airport, &booking("b-air", "h-1", Some("d-1"), "2026-10-19 10:00:00", 120_000, 35.0))
        .expect("airport");
    store
        .insert_booking(TripType::Manual, &booking("b-man", "h-2", Some("d-1"), "2026-10-18 11:00:00", 40_000, 12.0))
        .expect("manual");
    store
        .insert_booking(TripType::Rental, &booking("b-rent", "h-2", None, "2026-10-20 14:00:00", 250_000, 80.0))
        .expect("rental");

    for trip in [
        parent("t-rent", TripType::Rental, "b-rent", TripStatus::Created, "2026-10-19 07:00:00"),
        parent("t-sub", TripType::Subscription, "r-1", TripStatus::Assigned, "2026-10-18 21:00:00"),
        parent("t-air", TripType::Airport, "b-air", TripStatus::Completed, "2026-10-18 20:00:00"),
        parent("t-man", TripType::Manual, "b-man", TripStatus::Completed, "2026-10-17 10:00:00"),
    ] {
        store.insert_trip(&trip).expect("trip");
    }

    store
        .insert_payment(&payment("t-air", "Cash", "completed", 120_000), at("2026-10-19 11:00:00"))
        .expect("payment");
    store
        .insert_payment(&payment("t-man", "upi", "pending", 40_000), at("2026-10-18 12:00:00"))
        .expect("payment");
    store
        .insert_payment(&payment("t-man", "upi", "completed", 40_000), at("2026-10-18 12:05:00"))
        .expect("payment");
    store
}

fn engine() -> ReportEngine<BookingStore> {
    ReportEngine::new(world(), ReportConfig::default())
}

fn ids<'a>(trips: impl IntoIterator<Item = &'a tripdesk_core::trip::Trip>) -> Vec<&'a str> {
    trips.into_iter().map(|t| t.id.as_str()).collect()
}

/// Delegates to a real store but can fail the parent fetch or one source kind.
struct Flaky {
    inner: BookingStore,
    parents_down: bool,
    broken_kind: Option<TripType>,
}

#[async_trait]
impl BookingSourceGateway for Flaky {
    async fn fetch_trips(&self, query: &TripQuery) -> ReportResult<Vec<TripRecord>> {
        if self.parents_down {
            return Err(ReportError::Other(anyhow::anyhow!("query service timed out")));
        }
        self.inner.fetch_trips(query).await
    }

    async fn fetch_source_records(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>> {
        if self.broken_kind == Some(trip_type) {
            return Err(ReportError::fetch(trip_type.as_str(), "connection reset"));
        }
        self.inner.fetch_source_records(trip_type, ref_ids).await
    }

    async fn fetch_payments(
        &self,
        trip_ids: &[TripId],
        status_filter: Option<&str>,
    ) -> ReportResult<Vec<PaymentRecord>> {
        self.inner.fetch_payments(trip_ids, status_filter).await
    }

    async fn fetch_daily_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<DailySummaryRow>> {
        self.inner.fetch_daily_summary(from, to, hub_id).await
    }

    async fn fetch_weekly_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        hub_id: Option<&str>,
    ) -> ReportResult<Vec<WeeklySummaryRow>> {
        self.inner.fetch_weekly_summary(from, to, hub_id).await
    }

    async fn count_active_subscriptions(&self) -> ReportResult<i64> {
        Err(ReportError::fetch("subscriptions", "not available"))
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

/// Every kind joins to its source row and comes back in parent order.
#[tokio::test]
async fn load_trips_joins_every_kind() {
    let engine = engine();
    let trips = engine.load_trips(&engine.default_query()).await.expect("load");

    assert_eq!(ids(&trips), vec!["t-rent", "t-sub", "t-air", "t-man"]);
    assert!(trips.iter().all(|t| !t.source_missing));

    let sub = &trips[1];
    assert_eq!(sub.start_time, Some(at("2026-10-19 09:00:00")));
    assert_eq!(sub.est_km, Some(18.0), "falls back to the subscription route distance");
    assert_eq!(sub.hub_name.as_deref(), Some("Whitefield"));
    assert_eq!(sub.customer_name.as_deref(), Some("Priya Nair"));
    assert_eq!(sub.driver_name.as_deref(), Some("Suresh Rao"));
    assert_eq!(sub.route.as_deref(), Some("Whitefield → MG Road"));

    let air = &trips[2];
    assert_eq!(air.driver_name.as_deref(), Some("Ravi Kumar"));
    assert_eq!(air.vehicle_reg.as_deref(), Some("KA 01 AB 1234"));
    assert_eq!(air.vehicle_status.as_deref(), Some("active"));
    assert_eq!(air.fare, Some(120_000));
}

/// Parent-level pushdown narrows by type and status.
#[tokio::test]
async fn parent_query_pushes_down_type_and_status() {
    let engine = engine();
    let query = TripQuery {
        trip_type: None,
        status: Some(TripStatus::Completed),
        limit: 10,
        offset: 0,
    };
    let trips = engine.load_trips(&query).await.expect("load");
    assert_eq!(ids(&trips), vec!["t-air", "t-man"]);

    let capped = engine.load_trips(&TripQuery::all(1)).await.expect("load");
    assert_eq!(ids(&capped), vec!["t-rent"]);
}

/// Reports page past the fetch cap; the live stream reads a single page.
#[tokio::test]
async fn reports_read_history_past_the_fetch_cap() {
    let store = world();
    store
        .insert_booking(TripType::Manual, &booking("b-old", "h-1", Some("d-1"), "2026-09-01 09:00:00", 90_000, 20.0))
        .expect("manual");
    store
        .insert_trip(&parent("t-old", TripType::Manual, "b-old", TripStatus::Completed, "2026-08-30 10:00:00"))
        .expect("trip");
    let cap = 2;
    assert!(store.trip_count().expect("count") > cap);
    let config = ReportConfig {
        parent_fetch_limit: cap,
        ..ReportConfig::default()
    };
    let engine = ReportEngine::new(store, config);

    let page = engine.load_trips(&engine.default_query()).await.expect("page");
    assert_eq!(ids(&page), vec!["t-rent", "t-sub"]);
    let next = engine.load_trips(&engine.default_query().next_page()).await.expect("page");
    assert_eq!(ids(&next), vec!["t-air", "t-man"]);

    let history = engine.load_history().await.expect("history");
    assert_eq!(ids(&history), vec!["t-rent", "t-sub", "t-air", "t-man", "t-old"]);

    let day_one = NaiveDate::from_ymd_opt(2026, 9, 1).expect("date");
    let request = ReportRequest::new(ReportKind::RevenueAnalysis, DateRange::single_day(day_one));
    let ReportOutput::RevenueAnalysis(outcome) =
        engine.run_report(&request, &clock()).await.expect("report")
    else {
        panic!("wrong report kind");
    };
    let revenue = outcome.into_ready().expect("the oldest trip is in range");
    assert_eq!(revenue.total_trips, 1);
    assert_eq!(revenue.total_revenue, 90_000);
}

/// A soft-deleted source row leaves a shell instead of dropping the trip.
#[tokio::test]
async fn soft_deleted_source_yields_shell() {
    let engine = engine();
    engine
        .gateway()
        .soft_delete_source(TripType::Airport, "b-air", at("2026-10-19 07:30:00"))
        .expect("soft delete");

    let trips = engine.load_trips(&engine.default_query()).await.expect("load");
    assert_eq!(trips.len(), 4);
    let air = trips.iter().find(|t| t.id == "t-air").expect("t-air");
    assert!(air.source_missing);
    assert_eq!(air.status, TripStatus::Completed);
    assert_eq!(air.start_time, None);
    assert_eq!(air.driver_name, None);

    // No start time means no place on the dashboard.
    let live = engine
        .live_trips(&engine.default_query(), &TripFilter::new(), VisibilityPolicy::default(), &clock())
        .await
        .expect("live");
    assert_eq!(ids(&live), vec!["t-rent", "t-sub"]);
}

/// One failing source fetch only degrades that kind.
#[tokio::test]
async fn failed_source_fetch_degrades_to_shells() {
    let engine = ReportEngine::new(
        Flaky {
            inner: world(),
            parents_down: false,
            broken_kind: Some(TripType::Manual),
        },
        ReportConfig::default(),
    );
    let trips = engine.load_trips(&engine.default_query()).await.expect("load");

    assert_eq!(trips.len(), 4);
    for trip in &trips {
        assert_eq!(trip.source_missing, trip.trip_type == TripType::Manual, "{}", trip.id);
    }
}

/// Without parent rows nothing can be reported.
#[tokio::test]
async fn parent_fetch_failure_is_fatal() {
    let engine = ReportEngine::new(
        Flaky {
            inner: world(),
            parents_down: true,
            broken_kind: None,
        },
        ReportConfig::default(),
    );
    let request = ReportRequest::new(ReportKind::TripWise, DateRange::single_day(day(19)));
    let err = engine.run_report(&request, &clock()).await.expect_err("must fail");
    match err {
        ReportError::FetchFailure { source_name, reason } => {
            assert_eq!(source_name, "trips");
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("expected FetchFailure, got {other:?}"),
    }
}

// ── Live stream ──────────────────────────────────────────────────────────────

/// Yesterday's completed trip is hidden; today and tomorrow stay.
#[tokio::test]
async fn live_stream_applies_visibility_then_filters() {
    let engine = engine();
    let query = engine.default_query();
    let policy = VisibilityPolicy::default();

    let live = engine
        .live_trips(&query, &TripFilter::new(), policy, &clock())
        .await
        .expect("live");
    assert_eq!(ids(&live), vec!["t-rent", "t-sub", "t-air"]);

    let airport = engine
        .live_trips(&query, &TripFilter::new().with_type(TripType::Airport), policy, &clock())
        .await
        .expect("live");
    assert_eq!(ids(&airport), vec!["t-air"]);

    let tomorrow = engine
        .live_trips(&query, &TripFilter::new().due_tomorrow(), policy, &clock())
        .await
        .expect("live");
    assert_eq!(ids(&tomorrow), vec!["t-rent"]);
}

/// An explicit date range bypasses visibility.
#[tokio::test]
async fn date_range_bypasses_visibility() {
    let engine = engine();
    let filter = TripFilter::new().with_date_range(DateRange::single_day(day(18)));
    let live = engine
        .live_trips(&engine.default_query(), &filter, VisibilityPolicy::default(), &clock())
        .await
        .expect("live");
    assert_eq!(ids(&live), vec!["t-man"]);
}

// ── Reports ──────────────────────────────────────────────────────────────────

/// Revenue by mode comes from completed payments only; a pending row is skipped.
#[tokio::test]
async fn driver_report_end_to_end() {
    let engine = engine();
    let request = ReportRequest::new(
        ReportKind::DriverPerformance,
        DateRange::new(day(18), day(19)).expect("range"),
    );
    let ReportOutput::DriverPerformance(outcome) =
        engine.run_report(&request, &clock()).await.expect("report")
    else {
        panic!("wrong report kind");
    };
    let rows = outcome.into_ready().expect("rows");

    assert_eq!(rows.len(), 2);
    let ravi = &rows[0];
    assert_eq!(ravi.driver, "Ravi Kumar");
    assert_eq!(ravi.revenue, 160_000);
    assert_eq!(ravi.revenue_by_mode.get(&PaymentMode::Cash), Some(&120_000));
    assert_eq!(ravi.revenue_by_mode.get(&PaymentMode::Upi), Some(&40_000));
    assert_eq!(rows[1].driver, "Suresh Rao");
    assert!(rows[1].revenue_by_mode.is_empty());
}

/// A payment-mode filter keeps only trips paid that way, even for unenriched reports.
#[tokio::test]
async fn payment_mode_filter_applies_after_enrichment() {
    let engine = engine();
    let period = DateRange::new(day(17), day(20)).expect("range");

    let request = ReportRequest::new(ReportKind::PeakDemand, period)
        .with_filter(TripFilter::new().with_payment_mode(PaymentMode::Cash));
    let ReportOutput::PeakDemand(outcome) = engine.run_report(&request, &clock()).await.expect("report") else {
        panic!("wrong report kind");
    };
    let demand = outcome.into_ready().expect("demand");
    assert_eq!(demand.by_hour.iter().map(|b| b.trips).sum::<i64>(), 1);
    assert_eq!(demand.by_hour[10].trips, 1);

    let trips = engine
        .report_trips(
            &TripFilter::new().with_payment_mode(PaymentMode::Upi),
            period,
            None,
            &clock(),
        )
        .await
        .expect("trips");
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].trip.id, "t-man");
}

/// Utilization divides by the store's active subscription count.
#[tokio::test]
async fn subscription_report_reads_active_count() {
    let engine = engine();
    let request = ReportRequest::new(ReportKind::SubscriptionPerformance, DateRange::single_day(day(19)));
    let ReportOutput::SubscriptionPerformance(outcome) =
        engine.run_report(&request, &clock()).await.expect("report")
    else {
        panic!("wrong report kind");
    };
    let perf = outcome.into_ready().expect("performance");
    assert_eq!(perf.active_subscriptions, 1);
    assert_eq!(perf.rides, 1);
    assert_eq!(perf.utilization_pct, 100.0);
    assert_eq!(perf.km, 18.0);
}

/// A failing subscription count degrades to zero instead of failing the report.
#[tokio::test]
async fn subscription_count_failure_degrades() {
    let engine = ReportEngine::new(
        Flaky {
            inner: world(),
            parents_down: false,
            broken_kind: None,
        },
        ReportConfig::default(),
    );
    let request = ReportRequest::new(ReportKind::SubscriptionPerformance, DateRange::single_day(day(19)));
    let ReportOutput::SubscriptionPerformance(outcome) =
        engine.run_report(&request, &clock()).await.expect("report")
    else {
        panic!("wrong report kind");
    };
    let perf = outcome.into_ready().expect("performance");
    assert_eq!(perf.active_subscriptions, 0);
    assert_eq!(perf.utilization_pct, 0.0);
}

/// A window with no trips reports NoData rather than zeros.
#[tokio::test]
async fn empty_window_is_no_data() {
    let engine = engine();
    let period = DateRange::single_day(NaiveDate::from_ymd_opt(2025, 1, 1).expect("date"));
    for kind in ReportKind::ALL {
        let output = engine
            .run_report(&ReportRequest::new(kind, period), &clock())
            .await
            .expect("report");
        assert!(output.is_no_data(), "{}", kind.as_str());
    }
}

/// Requests deserialize from JSON with the filter optional.
#[test]
fn report_request_from_json() {
    let request: ReportRequest = serde_json::from_str(
        r#"{"kind":"cancellation","period":{"from":"2026-10-01","to":"2026-10-19"}}"#,
    )
    .expect("request");
    assert_eq!(request.kind, ReportKind::Cancellation);
    assert_eq!(request.period.days(), 19);
    assert_eq!(request.filter, TripFilter::default());
}

// ── Rollups ──────────────────────────────────────────────────────────────────

/// Daily rollups group by start date and type, oldest first.
#[tokio::test]
async fn daily_rollup_from_store() {
    let engine = engine();
    let period = DateRange::new(day(18), day(19)).expect("range");
    let rows = engine
        .daily_rollup(period, None)
        .await
        .expect("rollup")
        .into_ready()
        .expect("rows");

    let keys: Vec<(NaiveDate, TripType)> = rows.iter().map(|r| (r.date, r.trip_type)).collect();
    assert_eq!(
        keys,
        vec![
            (day(18), TripType::Manual),
            (day(19), TripType::Airport),
            (day(19), TripType::Subscription),
        ]
    );
    assert_eq!(rows[0].completed_count, 1);
    assert_eq!(rows[1].revenue, 120_000);
    assert_eq!(rows[1].km, 35.0);
    assert_eq!(rows[2].km, 18.0);
    assert_eq!(rows[2].completed_count, 0);

    let hebbal = engine
        .daily_rollup(period, Some("h-2"))
        .await
        .expect("rollup")
        .into_ready()
        .expect("rows");
    assert_eq!(hebbal.len(), 1);
    assert_eq!(hebbal[0].trip_type, TripType::Manual);
}

/// A soft-deleted subscription no longer lends its hub to rides, in the
/// rollup view or in the trip pipeline.
#[tokio::test]
async fn rollup_ignores_soft_deleted_subscription() {
    let engine = engine();
    engine
        .gateway()
        .soft_delete_subscription("sub-1", at("2026-10-19 07:30:00"))
        .expect("soft delete");

    let period = DateRange::single_day(day(19));
    let whitefield = engine
        .daily_rollup(period, Some("h-1"))
        .await
        .expect("rollup")
        .into_ready()
        .expect("rows");
    let kinds: Vec<TripType> = whitefield.iter().map(|r| r.trip_type).collect();
    assert_eq!(kinds, vec![TripType::Airport]);

    let all = engine
        .daily_rollup(period, None)
        .await
        .expect("rollup")
        .into_ready()
        .expect("rows");
    let ride = all.iter().find(|r| r.trip_type == TripType::Subscription).expect("ride");
    assert_eq!(ride.trip_count, 1);
    assert_eq!(ride.km, 0.0);

    let trips = engine.load_trips(&engine.default_query()).await.expect("load");
    let sub = trips.iter().find(|t| t.id == "t-sub").expect("t-sub");
    assert_eq!(sub.hub_name, None);
    assert_eq!(sub.est_km, None);
}

/// Weekly rollups bucket by the Monday of the ISO week.
#[tokio::test]
async fn weekly_rollup_from_store() {
    let engine = engine();
    let rows = engine
        .weekly_rollup(DateRange::new(day(18), day(20)).expect("range"), None)
        .await
        .expect("rollup")
        .into_ready()
        .expect("rows");

    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].week_start, day(12));
    assert_eq!(rows[0].iso_week, "2026-W42");
    assert_eq!(rows[0].trip_type, TripType::Manual);
    assert!(rows[1..].iter().all(|r| r.week_start == day(19) && r.iso_week == "2026-W43"));
    let rental = rows.iter().find(|r| r.trip_type == TripType::Rental).expect("rental");
    assert_eq!(rental.revenue, 250_000);

    let none = engine
        .weekly_rollup(DateRange::single_day(day(1)), None)
        .await
        .expect("rollup");
    assert!(none.is_no_data());
}
