//! Deterministic demo bookings.
//!
//! RULE: The same (seed, today, days) always writes the same rows.
//! Ids come from the RNG, never from the platform.

use crate::{
    error::ReportResult,
    name_generator::NameGenerator,
    payments::{PaymentRecord, COMPLETED_PAYMENT},
    rng::{DemoRng, DemoStream},
    source::SourceDefaults,
    store::{BookingRow, BookingStore, HubRow, PersonRow, SubscriptionRideRow, SubscriptionRow, VehicleRow},
    trip::{TripRecord, TripStatus, TripType},
    types::Paise,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const DRIVERS: usize = 12;
const VEHICLES: usize = 10;
const CUSTOMERS: usize = 30;
const SUBSCRIPTIONS: usize = 8;
const PAYMENT_METHODS: [&str; 5] = ["cash", "upi", "UPI", "card", "wallet"];

/// Row counts written by one seeding run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DemoSummary {
    pub hubs: usize,
    pub drivers: usize,
    pub vehicles: usize,
    pub customers: usize,
    pub subscriptions: usize,
    pub trips: usize,
    pub payments: usize,
}

fn new_id(rng: &mut DemoRng) -> String {
    uuid::Builder::from_random_bytes(rng.bytes16())
        .into_uuid()
        .to_string()
}

struct Fleet {
    hubs: Vec<String>,
    drivers: Vec<String>,
    vehicles: Vec<String>,
    customers: Vec<String>,
}

/// Seed `days` days of history ending `today`, plus tomorrow's bookings.
/// Expects a migrated, empty store.
pub fn seed_demo_bookings(
    store: &BookingStore,
    seed: u64,
    today: NaiveDate,
    days: u32,
) -> ReportResult<DemoSummary> {
    let mut summary = DemoSummary::default();
    let fleet = seed_fleet(store, seed, &mut summary)?;

    let mut bookings = DemoRng::new(seed, DemoStream::Bookings);
    let mut payments = DemoRng::new(seed, DemoStream::Payments);
    let subscriptions = seed_subscriptions(store, &fleet, &mut bookings, today, days, &mut summary)?;

    let ride_time = SourceDefaults::default().subscription_start_time;
    let first = today - Duration::days(i64::from(days.max(1)) - 1);
    let last = today + Duration::days(1);
    let mut date = first;
    while date <= last {
        for (sub_id, route_km) in &subscriptions {
            if !bookings.chance(0.7) {
                continue;
            }
            let ride_id = new_id(&mut bookings);
            let fare = bookings.between(150, 450) * 100;
            let est_km = if bookings.chance(0.3) { None } else { *route_km };
            let actual_km = if date < today { est_km.map(|k| k + bookings.between(-2, 3) as f64) } else { None };
            store.insert_subscription_ride(&SubscriptionRideRow {
                id: ride_id.clone(),
                subscription_id: sub_id.clone(),
                ride_date: date,
                driver_id: bookings.pick(&fleet.drivers).cloned(),
                vehicle_id: bookings.pick(&fleet.vehicles).cloned(),
                fare: Some(fare),
                est_km,
                actual_km,
            })?;
            let start = date.and_time(ride_time);
            write_trip(
                store,
                &mut bookings,
                &mut payments,
                TripType::Subscription,
                ride_id,
                start,
                today,
                fare,
                &mut summary,
            )?;
        }

        for trip_type in [TripType::Airport, TripType::Rental, TripType::Manual] {
            let count = match trip_type {
                TripType::Airport => bookings.between(2, 5),
                TripType::Rental => bookings.between(0, 2),
                _ => bookings.between(1, 3),
            };
            for _ in 0..count {
                let booking_id = new_id(&mut bookings);
                let hour = bookings.between(5, 22) as u32;
                let minute = (bookings.below(4) * 15) as u32;
                let start = date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN));
                let fare = booking_fare(&mut bookings, trip_type);
                store.insert_booking(
                    trip_type,
                    &BookingRow {
                        id: booking_id.clone(),
                        customer_id: bookings.pick(&fleet.customers).cloned(),
                        hub_id: bookings.pick(&fleet.hubs).cloned(),
                        driver_id: if bookings.chance(0.9) { bookings.pick(&fleet.drivers).cloned() } else { None },
                        vehicle_id: if bookings.chance(0.9) { bookings.pick(&fleet.vehicles).cloned() } else { None },
                        start_time: Some(start),
                        pickup: Some(NameGenerator::locality(&mut bookings).to_string()),
                        drop: Some(NameGenerator::locality(&mut bookings).to_string()),
                        fare: Some(fare),
                        est_km: Some(bookings.between(8, 60) as f64),
                    },
                )?;
                write_trip(
                    store,
                    &mut bookings,
                    &mut payments,
                    trip_type,
                    booking_id,
                    start,
                    today,
                    fare,
                    &mut summary,
                )?;
            }
        }
        date += Duration::days(1);
    }

    log::info!(
        "seeded {} trips and {} payments over {} days (seed {seed})",
        summary.trips,
        summary.payments,
        days,
    );
    Ok(summary)
}

fn seed_fleet(store: &BookingStore, seed: u64, summary: &mut DemoSummary) -> ReportResult<Fleet> {
    let mut rng = DemoRng::new(seed, DemoStream::Fleet);
    let mut fleet = Fleet {
        hubs: Vec::new(),
        drivers: Vec::new(),
        vehicles: Vec::new(),
        customers: Vec::new(),
    };

    for name in NameGenerator::hub_names() {
        let id = new_id(&mut rng);
        store.insert_hub(&HubRow {
            id: id.clone(),
            name: name.to_string(),
        })?;
        fleet.hubs.push(id);
    }
    for _ in 0..DRIVERS {
        let id = new_id(&mut rng);
        store.insert_driver(&PersonRow {
            id: id.clone(),
            name: NameGenerator::full_name(&mut rng),
            phone: Some(NameGenerator::phone(&mut rng)),
        })?;
        fleet.drivers.push(id);
    }
    for _ in 0..VEHICLES {
        let id = new_id(&mut rng);
        let status = if rng.chance(0.15) { "maintenance" } else { "active" };
        store.insert_vehicle(&VehicleRow {
            id: id.clone(),
            registration: NameGenerator::registration(&mut rng),
            status: status.to_string(),
        })?;
        fleet.vehicles.push(id);
    }

    let mut people = DemoRng::new(seed, DemoStream::Customers);
    for _ in 0..CUSTOMERS {
        let id = new_id(&mut people);
        store.insert_customer(&PersonRow {
            id: id.clone(),
            name: NameGenerator::full_name(&mut people),
            phone: Some(NameGenerator::phone(&mut people)),
        })?;
        fleet.customers.push(id);
    }

    summary.hubs = fleet.hubs.len();
    summary.drivers = fleet.drivers.len();
    summary.vehicles = fleet.vehicles.len();
    summary.customers = fleet.customers.len();
    Ok(fleet)
}

/// Returns (subscription id, route km) for subscriptions that ride.
fn seed_subscriptions(
    store: &BookingStore,
    fleet: &Fleet,
    rng: &mut DemoRng,
    today: NaiveDate,
    days: u32,
    summary: &mut DemoSummary,
) -> ReportResult<Vec<(String, Option<f64>)>> {
    let mut riding = Vec::new();
    for _ in 0..SUBSCRIPTIONS {
        let id = new_id(rng);
        let route_km = Some(rng.between(6, 30) as f64);
        let status = if rng.chance(0.8) { "active" } else { "paused" };
        store.insert_subscription(&SubscriptionRow {
            id: id.clone(),
            customer_id: rng.pick(&fleet.customers).cloned(),
            hub_id: rng.pick(&fleet.hubs).cloned(),
            pickup: Some(NameGenerator::locality(rng).to_string()),
            drop: Some(NameGenerator::locality(rng).to_string()),
            route_km,
            status: status.to_string(),
            start_date: today - Duration::days(i64::from(days) + rng.between(0, 30)),
            end_date: None,
        })?;
        if status == "active" {
            riding.push((id, route_km));
        }
    }
    summary.subscriptions = SUBSCRIPTIONS;
    Ok(riding)
}

fn booking_fare(rng: &mut DemoRng, trip_type: TripType) -> Paise {
    let rupees = match trip_type {
        TripType::Airport => rng.between(800, 2200),
        TripType::Rental => rng.between(1500, 4500),
        _ => rng.between(200, 1200),
    };
    rupees * 100
}

fn demo_status(rng: &mut DemoRng, date: NaiveDate, today: NaiveDate) -> TripStatus {
    let roll = rng.next_f64();
    if date < today {
        // A small backlog of stale incomplete trips keeps visibility rules interesting.
        match roll {
            r if r < 0.78 => TripStatus::Completed,
            r if r < 0.88 => TripStatus::Cancelled,
            r if r < 0.94 => TripStatus::NoShow,
            _ => TripStatus::Assigned,
        }
    } else if date == today {
        match roll {
            r if r < 0.4 => TripStatus::Completed,
            r if r < 0.5 => TripStatus::Enroute,
            r if r < 0.7 => TripStatus::Assigned,
            r if r < 0.9 => TripStatus::Created,
            _ => TripStatus::Cancelled,
        }
    } else if roll < 0.5 {
        TripStatus::Created
    } else {
        TripStatus::Assigned
    }
}

#[allow(clippy::too_many_arguments)]
fn write_trip(
    store: &BookingStore,
    bookings: &mut DemoRng,
    payments: &mut DemoRng,
    trip_type: TripType,
    ref_id: String,
    start: NaiveDateTime,
    today: NaiveDate,
    fare: Paise,
    summary: &mut DemoSummary,
) -> ReportResult<()> {
    let status = demo_status(bookings, start.date(), today);
    let created_at = start - Duration::hours(bookings.between(2, 72));
    let trip = TripRecord {
        id: new_id(bookings),
        trip_type,
        ref_id,
        status,
        created_at,
    };
    store.insert_trip(&trip)?;
    summary.trips += 1;

    if status != TripStatus::Completed {
        return Ok(());
    }
    let paid_at = start + Duration::hours(1);
    let method = payments.pick(&PAYMENT_METHODS).copied().unwrap_or("cash");
    let settled = payments.chance(0.88);
    store.insert_payment(
        &PaymentRecord {
            trip_id: trip.id.clone(),
            method: method.to_string(),
            status: if settled { COMPLETED_PAYMENT } else { "pending" }.to_string(),
            amount: fare,
        },
        paid_at,
    )?;
    summary.payments += 1;
    Ok(())
}
