//! trip-reports: headless runner for the booking report engine.
//!
//! Usage:
//!   trip-reports --db bookings.db --seed-demo 42 --days 30
//!   trip-reports --db bookings.db --report driver-performance --from 2026-10-01 --to 2026-10-19
//!   trip-reports --db bookings.db --live --role manager --type airport
//!   trip-reports --db bookings.db --live --watch 3
//!   trip-reports --db bookings.db --rollup weekly --from 2026-09-01 --to 2026-10-19

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::{env, path::Path, sync::Arc};
use tripdesk_core::{
    clock::ReportClock,
    config::ReportConfig,
    demo::seed_demo_bookings,
    engine::{ReportEngine, ReportRequest},
    feed::{LiveRequest, LiveTripFeed},
    filter::{DateRange, TripFilter},
    reports::ReportKind,
    store::BookingStore,
    trip::{TripStatus, TripType},
    visibility::{Role, VisibilityPolicy},
};

const DEFAULT_CONFIG: &str = "./data/report_config.json";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag(&args, "--db").unwrap_or(":memory:");
    let days = parse_arg(&args, "--days", 30u32);
    let config = load_config(flag(&args, "--config"))?;
    let clock = match flag(&args, "--now") {
        Some(raw) => ReportClock::fixed(
            raw.parse::<NaiveDateTime>()
                .with_context(|| format!("--now expects YYYY-MM-DDTHH:MM:SS, got {raw}"))?,
        ),
        None => ReportClock::local_now(),
    };

    let store = BookingStore::open(db)?;
    store.migrate()?;

    if let Some(seed) = flag(&args, "--seed-demo") {
        let seed: u64 = seed.parse().with_context(|| format!("--seed-demo expects a number, got {seed}"))?;
        let summary = seed_demo_bookings(&store, seed, clock.today(), days)?;
        print_json(&summary)?;
    }

    let filter = build_filter(&args, &config)?;
    let engine = Arc::new(ReportEngine::new(store, config));

    if let Some(kind) = flag(&args, "--report") {
        let kind: ReportKind = kind.parse()?;
        let request = ReportRequest::new(kind, period(&args, &clock)?).with_filter(filter);
        let output = engine.run_report(&request, &clock).await?;
        print_json(&output)?;
    } else if let Some(which) = flag(&args, "--rollup") {
        let period = period(&args, &clock)?;
        let hub = flag(&args, "--hub");
        match which {
            "daily" => print_json(&engine.daily_rollup(period, hub).await?)?,
            "weekly" => print_json(&engine.weekly_rollup(period, hub).await?)?,
            other => bail!("--rollup expects daily or weekly, got {other}"),
        }
    } else if args.iter().any(|a| a == "--live") {
        let policy = VisibilityPolicy::for_role(
            parse_role(flag(&args, "--role").unwrap_or("dispatcher"))?,
            engine.config().show_yesterday_incomplete,
        );
        let watch = parse_arg(&args, "--watch", 0u32);
        if watch == 0 {
            let trips = engine
                .live_trips(&engine.default_query(), &filter, policy, &clock)
                .await?;
            print_json(&trips)?;
        } else {
            watch_live(engine, filter, policy, watch).await?;
        }
    } else if flag(&args, "--seed-demo").is_none() {
        println!("nothing to do: pass --report, --rollup, --live or --seed-demo");
        println!("reports: {}", report_names());
    }

    Ok(())
}

/// Print `count` live snapshots as they arrive, then stop the feed.
async fn watch_live(
    engine: Arc<ReportEngine<BookingStore>>,
    filter: TripFilter,
    policy: VisibilityPolicy,
    count: u32,
) -> Result<()> {
    let request = LiveRequest {
        query: engine.default_query(),
        filter,
        policy,
    };
    let mut feed = LiveTripFeed::start(engine, request, ReportClock::local_now);
    let mut rx = feed.subscribe();
    for _ in 0..count {
        rx.changed().await.map_err(|_| anyhow!("live feed closed"))?;
        let snapshot = rx.borrow_and_update().clone();
        if let Some(snapshot) = snapshot {
            print_json(&*snapshot)?;
        }
    }
    feed.stop();
    Ok(())
}

fn load_config(path: Option<&str>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => ReportConfig::load(DEFAULT_CONFIG),
        None => Ok(ReportConfig::default()),
    }
}

fn build_filter(args: &[String], config: &ReportConfig) -> Result<TripFilter> {
    let mut filter = TripFilter {
        due_soon_minutes: config.due_soon_minutes,
        ..TripFilter::default()
    };
    if let Some(raw) = flag(args, "--type") {
        filter = filter.with_type(raw.parse::<TripType>()?);
    }
    if let Some(raw) = flag(args, "--status") {
        filter = filter.with_status(raw.parse::<TripStatus>()?);
    }
    if let Some(hub) = flag(args, "--hub") {
        filter = filter.with_hub(hub);
    }
    if let Some(driver) = flag(args, "--driver") {
        filter = filter.with_driver(driver);
    }
    if let Some(vehicle) = flag(args, "--vehicle") {
        filter = filter.with_vehicle(vehicle);
    }
    if args.iter().any(|a| a == "--due-soon") {
        filter = filter.due_soon();
    }
    if args.iter().any(|a| a == "--due-today") {
        filter = filter.due_today();
    }
    if args.iter().any(|a| a == "--due-tomorrow") {
        filter = filter.due_tomorrow();
    }
    Ok(filter)
}

/// `--from`/`--to`, each defaulting to today.
fn period(args: &[String], clock: &ReportClock) -> Result<DateRange> {
    let from = parse_date(args, "--from")?.unwrap_or(clock.today());
    let to = parse_date(args, "--to")?.unwrap_or(clock.today());
    Ok(DateRange::new(from, to)?)
}

fn parse_date(args: &[String], name: &str) -> Result<Option<NaiveDate>> {
    flag(args, name)
        .map(|raw| {
            raw.parse::<NaiveDate>()
                .with_context(|| format!("{name} expects YYYY-MM-DD, got {raw}"))
        })
        .transpose()
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw.to_ascii_lowercase().as_str() {
        "dispatcher" => Ok(Role::Dispatcher),
        "manager" => Ok(Role::Manager),
        "admin" => Ok(Role::Admin),
        other => bail!("unknown role {other}: expected dispatcher, manager or admin"),
    }
}

fn report_names() -> String {
    ReportKind::ALL
        .iter()
        .map(|k| k.as_str().replace('_', "-"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
