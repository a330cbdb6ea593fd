use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tripdesk_core::{
    normalizer::{SourceBatch, TripNormalizer},
    source::{AirportBooking, JoinedAttributes, SourceDefaults, SourceRecord, SubscriptionRide},
    trip::{TripRecord, TripStatus, TripType},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp")
}

fn parent(id: &str, trip_type: TripType, ref_id: &str) -> TripRecord {
    TripRecord {
        id: id.into(),
        trip_type,
        ref_id: ref_id.into(),
        status: TripStatus::Assigned,
        created_at: at("2026-10-18 08:00:00"),
    }
}

fn joined(driver: &str) -> JoinedAttributes {
    JoinedAttributes {
        hub_id: Some("hub-1".into()),
        hub_name: Some("Koramangala".into()),
        customer_name: Some("Priya Nair".into()),
        customer_phone: Some("9876543210".into()),
        driver_name: Some(driver.into()),
        vehicle_reg: Some("KA 01 AB 1234".into()),
        vehicle_status: Some("active".into()),
    }
}

fn ride(ref_id: &str, est_km: Option<f64>, route_km: Option<f64>) -> SourceRecord {
    SourceRecord::Subscription(SubscriptionRide {
        ref_id: ref_id.into(),
        subscription_id: "sub-1".into(),
        ride_date: NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"),
        pickup: Some("HSR Layout".into()),
        drop: Some("MG Road".into()),
        fare: Some(25_000),
        est_km,
        actual_km: None,
        subscription_route_km: route_km,
        joined: joined("Ravi Kumar"),
    })
}

fn airport(ref_id: &str, driver: &str) -> SourceRecord {
    SourceRecord::Airport(AirportBooking {
        ref_id: ref_id.into(),
        pickup_time: Some(at("2026-10-19 05:30:00")),
        pickup: Some("Kempegowda Airport".into()),
        drop: None,
        fare: Some(120_000),
        est_km: Some(38.0),
        joined: joined(driver),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every parent row yields exactly one trip, in parent order.
#[test]
fn one_trip_per_parent_in_parent_order() {
    let parents = vec![
        parent("t-3", TripType::Airport, "a-1"),
        parent("t-1", TripType::Subscription, "r-1"),
        parent("t-2", TripType::Airport, "a-missing"),
    ];
    let mut batch = SourceBatch::new();
    batch.extend(vec![airport("a-1", "Imran Khan"), ride("r-1", Some(12.0), None)]);

    let trips = TripNormalizer::default().normalize(&parents, &batch);

    let ids: Vec<&str> = trips.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t-3", "t-1", "t-2"]);
}

/// A parent without a source row becomes a shell: identity kept, display fields null.
#[test]
fn missing_source_row_emits_shell() {
    let parents = vec![parent("t-1", TripType::Airport, "gone")];
    let trips = TripNormalizer::default().normalize(&parents, &SourceBatch::new());

    let shell = &trips[0];
    assert!(shell.source_missing);
    assert_eq!(shell.id, "t-1");
    assert_eq!(shell.ref_id, "gone");
    assert_eq!(shell.trip_type, TripType::Airport);
    assert_eq!(shell.status, TripStatus::Assigned);
    assert!(shell.start_time.is_none());
    assert!(shell.fare.is_none());
    assert!(shell.driver_name.is_none());
    assert!(shell.route.is_none());
}

/// Merging is keyed by (type, ref_id): the same ref_id under another type never joins.
#[test]
fn join_key_includes_trip_type() {
    let parents = vec![parent("t-1", TripType::Rental, "a-1")];
    let mut batch = SourceBatch::new();
    batch.extend(vec![airport("a-1", "Imran Khan")]);

    let trips = TripNormalizer::default().normalize(&parents, &batch);
    assert!(trips[0].source_missing, "rental must not join an airport row");
}

/// Subscription rides start at the configured time of day on the ride date.
#[test]
fn subscription_start_time_uses_defaults() {
    let parents = vec![parent("t-1", TripType::Subscription, "r-1")];
    let mut batch = SourceBatch::new();
    batch.extend(vec![ride("r-1", Some(10.0), None)]);

    let default_trip = &TripNormalizer::default().normalize(&parents, &batch)[0];
    assert_eq!(default_trip.start_time, Some(at("2026-10-19 09:00:00")));

    let early = SourceDefaults {
        subscription_start_time: NaiveTime::from_hms_opt(7, 15, 0).expect("time"),
    };
    let early_trip = &TripNormalizer::new(early).normalize(&parents, &batch)[0];
    assert_eq!(early_trip.start_time, Some(at("2026-10-19 07:15:00")));
}

/// Ride-level est_km wins; the subscription's route distance is the fallback.
#[test]
fn subscription_est_km_falls_back_to_route_km() {
    let parents = vec![
        parent("t-1", TripType::Subscription, "r-1"),
        parent("t-2", TripType::Subscription, "r-2"),
        parent("t-3", TripType::Subscription, "r-3"),
    ];
    let mut batch = SourceBatch::new();
    batch.extend(vec![
        ride("r-1", Some(11.0), Some(20.0)),
        ride("r-2", None, Some(20.0)),
        ride("r-3", None, None),
    ]);

    let trips = TripNormalizer::default().normalize(&parents, &batch);
    assert_eq!(trips[0].est_km, Some(11.0));
    assert_eq!(trips[1].est_km, Some(20.0));
    assert_eq!(trips[2].est_km, None);
    assert_eq!(trips[2].distance_km(), 0.0);
}

/// Joined attributes and the route label are carried onto the trip.
#[test]
fn joined_attributes_are_projected() {
    let parents = vec![parent("t-1", TripType::Airport, "a-1")];
    let mut batch = SourceBatch::new();
    batch.extend(vec![airport("a-1", "Imran Khan")]);

    let trip = &TripNormalizer::default().normalize(&parents, &batch)[0];
    assert!(!trip.source_missing);
    assert_eq!(trip.driver_name.as_deref(), Some("Imran Khan"));
    assert_eq!(trip.hub_id.as_deref(), Some("hub-1"));
    assert_eq!(trip.vehicle_status.as_deref(), Some("active"));
    assert_eq!(trip.route.as_deref(), Some("Kempegowda Airport"));
    assert_eq!(trip.fare, Some(120_000));
    assert_eq!(trip.actual_km, None);
}

/// A duplicate source row keeps the first one seen.
#[test]
fn duplicate_source_rows_keep_first() {
    let parents = vec![parent("t-1", TripType::Airport, "a-1")];
    let mut batch = SourceBatch::new();
    batch.extend(vec![airport("a-1", "First Driver")]);
    batch.extend(vec![airport("a-1", "Second Driver")]);

    let trip = &TripNormalizer::default().normalize(&parents, &batch)[0];
    assert_eq!(trip.driver_name.as_deref(), Some("First Driver"));
    assert_eq!(batch.len(), 1);
}

/// Trips of a failed type degrade to shells while other types still join.
#[test]
fn failed_type_degrades_only_that_type() {
    let parents = vec![
        parent("t-1", TripType::Airport, "a-1"),
        parent("t-2", TripType::Subscription, "r-1"),
    ];
    let mut batch = SourceBatch::new();
    batch.extend(vec![airport("a-1", "Imran Khan")]);
    batch.mark_failed(TripType::Subscription);

    let trips = TripNormalizer::default().normalize(&parents, &batch);
    assert!(!trips[0].source_missing);
    assert!(trips[1].source_missing);
    assert!(batch.is_failed(TripType::Subscription));
    assert!(!batch.is_failed(TripType::Airport));
}

/// The lifecycle only moves forward; terminal states never move.
#[test]
fn status_transitions_follow_lifecycle() {
    use TripStatus::*;
    assert!(Created.can_transition_to(Assigned));
    assert!(Assigned.can_transition_to(Enroute));
    assert!(Enroute.can_transition_to(Completed));
    assert!(Created.can_transition_to(Cancelled));
    assert!(Enroute.can_transition_to(NoShow));

    assert!(!Created.can_transition_to(Completed));
    assert!(!Assigned.can_transition_to(Created));
    for terminal in [Completed, Cancelled, NoShow] {
        assert!(terminal.is_terminal());
        for next in [Created, Assigned, Enroute, Completed, NoShow, Cancelled] {
            assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
        }
    }
}

/// Unknown type or status tokens from the store are rejected, not guessed.
#[test]
fn trip_record_parse_rejects_unknown_tokens() {
    let created = at("2026-10-19 08:00:00");
    assert!(TripRecord::parse("t".into(), "airport", "a".into(), "no_show", created).is_ok());
    assert!(TripRecord::parse("t".into(), "helicopter", "a".into(), "created", created).is_err());
    assert!(TripRecord::parse("t".into(), "manual", "a".into(), "lost", created).is_err());
}
