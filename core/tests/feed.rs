use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tripdesk_core::{
    clock::ReportClock,
    config::ReportConfig,
    demo::seed_demo_bookings,
    engine::ReportEngine,
    feed::{LiveRequest, LiveTripFeed},
    filter::TripFilter,
    store::BookingStore,
    trip::TripType,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .expect("date")
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).expect("time"))
}

fn seeded_engine() -> Arc<ReportEngine<BookingStore>> {
    let store = BookingStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    seed_demo_bookings(&store, 11, now().date(), 7).expect("seed");
    Arc::new(ReportEngine::new(store, ReportConfig::default()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// The first refresh runs immediately and matches a one-off live query.
#[tokio::test]
async fn first_snapshot_arrives_without_waiting_a_period() {
    let engine = seeded_engine();
    let request = LiveRequest::default();
    let expected = engine
        .live_trips(&request.query, &request.filter, request.policy, &ReportClock::fixed(now()))
        .await
        .expect("live");

    let mut feed = LiveTripFeed::start(Arc::clone(&engine), request, || ReportClock::fixed(now()));
    let mut rx = feed.subscribe();
    rx.changed().await.expect("feed running");
    let snapshot = rx.borrow_and_update().clone().expect("snapshot");

    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.refreshed_at, now());
    assert_eq!(snapshot.trips, expected);
    assert!(feed.is_running());
    assert_eq!(feed.latest().map(|s| s.generation), Some(1));

    feed.stop();
    assert!(!feed.is_running());
}

/// The request's filter shapes every snapshot.
#[tokio::test]
async fn snapshots_respect_the_filter() {
    let engine = seeded_engine();
    let request = LiveRequest {
        filter: TripFilter::new().with_type(TripType::Airport),
        ..LiveRequest::default()
    };
    let feed = LiveTripFeed::start(engine, request, || ReportClock::fixed(now()));
    let mut rx = feed.subscribe();
    rx.changed().await.expect("feed running");

    let snapshot = feed.latest().expect("snapshot");
    assert!(!snapshot.trips.is_empty());
    assert!(snapshot.trips.iter().all(|t| t.trip_type == TripType::Airport));
}

/// No snapshot is visible before the first refresh completes.
#[tokio::test]
async fn stopped_feed_publishes_nothing() {
    let mut feed = LiveTripFeed::start(seeded_engine(), LiveRequest::default(), || {
        ReportClock::fixed(now())
    });
    feed.stop();
    assert!(!feed.is_running());
    // The task is aborted before it is ever polled on this single-threaded runtime.
    tokio::task::yield_now().await;
    assert!(feed.latest().is_none());
}
