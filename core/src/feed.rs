//! LiveTripFeed: caller-owned polling of the live dashboard stream.
//!
//! RULES:
//!   - One feed owns one background task. `stop()` or drop aborts it.
//!   - Every refresh re-runs the whole live pipeline; no deltas.
//!   - A failed refresh keeps the last published snapshot.

use crate::{
    clock::ReportClock,
    engine::ReportEngine,
    filter::TripFilter,
    gateway::{BookingSourceGateway, TripQuery},
    trip::Trip,
    visibility::VisibilityPolicy,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

/// What the live stream shows.
#[derive(Debug, Clone, Default)]
pub struct LiveRequest {
    pub query: TripQuery,
    pub filter: TripFilter,
    pub policy: VisibilityPolicy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSnapshot {
    /// Counts successful refreshes, starting at 1.
    pub generation: u64,
    pub refreshed_at: NaiveDateTime,
    pub trips: Vec<Trip>,
}

pub type SnapshotReceiver = watch::Receiver<Option<Arc<FeedSnapshot>>>;

pub struct LiveTripFeed {
    handle: Option<JoinHandle<()>>,
    rx: SnapshotReceiver,
}

impl LiveTripFeed {
    /// Spawn the polling task. The first refresh runs immediately, then
    /// every `poll_interval_secs`. `clock` is read once per refresh.
    pub fn start<G, F>(engine: Arc<ReportEngine<G>>, request: LiveRequest, clock: F) -> Self
    where
        G: BookingSourceGateway + 'static,
        F: Fn() -> ReportClock + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let period = engine.config().poll_interval();
        log::info!("live feed started, polling every {}s", period.as_secs());

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut generation = 0u64;

            loop {
                ticker.tick().await;
                let now = clock();
                match engine
                    .live_trips(&request.query, &request.filter, request.policy, &now)
                    .await
                {
                    Ok(trips) => {
                        generation += 1;
                        log::debug!("live feed #{generation}: {} trips", trips.len());
                        tx.send_replace(Some(Arc::new(FeedSnapshot {
                            generation,
                            refreshed_at: now.now,
                            trips,
                        })));
                    }
                    Err(e) => log::warn!("live feed refresh failed, keeping last snapshot: {e}"),
                }
            }
        });

        Self {
            handle: Some(handle),
            rx,
        }
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.rx.clone()
    }

    /// Most recent snapshot, if any refresh has succeeded yet.
    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::info!("live feed stopped");
        }
    }
}

impl Drop for LiveTripFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
