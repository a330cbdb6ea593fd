//! TripNormalizer: merges parent trip rows with their joined source rows.
//!
//! Output has exactly one Trip per parent row, in parent order.
//! Merging is keyed by `(type, ref_id)`, never by fetch arrival order.
//! A parent whose source row is missing becomes a shell Trip and is
//! reported to the diagnostics log.

use crate::{
    source::{SourceDefaults, SourceRecord},
    trip::{Trip, TripRecord, TripType},
    types::RefId,
};
use std::collections::{HashMap, HashSet};

/// Source rows gathered from the per-type fetches of one invocation.
#[derive(Debug, Default)]
pub struct SourceBatch {
    records: HashMap<(TripType, RefId), SourceRecord>,
    failed: HashSet<TripType>,
}

impl SourceBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows from one fetch. A duplicate key keeps the first row seen.
    pub fn extend(&mut self, rows: Vec<SourceRecord>) {
        for row in rows {
            self.records.entry(row.key()).or_insert(row);
        }
    }

    /// Record that the fetch for `trip_type` failed outright.
    pub fn mark_failed(&mut self, trip_type: TripType) {
        self.failed.insert(trip_type);
    }

    pub fn is_failed(&self, trip_type: TripType) -> bool {
        self.failed.contains(&trip_type)
    }

    pub fn get(&self, trip_type: TripType, ref_id: &str) -> Option<&SourceRecord> {
        self.records.get(&(trip_type, ref_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripNormalizer {
    defaults: SourceDefaults,
}

impl TripNormalizer {
    pub fn new(defaults: SourceDefaults) -> Self {
        Self { defaults }
    }

    pub fn normalize(&self, parents: &[TripRecord], batch: &SourceBatch) -> Vec<Trip> {
        let mut missing = 0usize;
        let trips: Vec<Trip> = parents
            .iter()
            .map(|parent| match batch.get(parent.trip_type, &parent.ref_id) {
                Some(source) => source
                    .as_canonical()
                    .to_canonical_trip(parent, &self.defaults),
                None => {
                    missing += 1;
                    let reason = if batch.is_failed(parent.trip_type) {
                        "source fetch failed"
                    } else {
                        "source row not found"
                    };
                    log::warn!(
                        "trip {}: {} ref_id={} unjoined ({reason}); emitting shell trip",
                        parent.id,
                        parent.trip_type,
                        parent.ref_id,
                    );
                    Trip::shell(parent)
                }
            })
            .collect();

        log::debug!(
            "normalized {} trips ({} shells) from {} source rows",
            trips.len(),
            missing,
            batch.len(),
        );
        trips
    }
}
