//! ReportEngine: the pipeline from gateway to report output.
//!
//! EXECUTION ORDER (fixed):
//!   1. Parent trip fetch            (fatal on failure; reports page it to the end)
//!   2. Per-type source fetches      (concurrent; a failure degrades to shells)
//!   3. TripNormalizer
//!   4. VisibilityPolicy             (live stream without a date range only)
//!   5. FilterEngine
//!   6. Payments + subscription count (concurrent; failures degrade)
//!   7. AggregationEngine
//!
//! RULES:
//!   - Each invocation works on its own fetched snapshot. Nothing is cached
//!     between calls and nothing is written back.
//!   - Only the parent trip fetch may fail an invocation.

use crate::{
    clock::ReportClock,
    config::ReportConfig,
    error::{ReportError, ReportResult},
    filter::{DateRange, TripFilter},
    gateway::{BookingSourceGateway, DailySummaryRow, TripQuery, WeeklySummaryRow},
    normalizer::{SourceBatch, TripNormalizer},
    payments::{EnrichedTrip, PaymentEnricher, PaymentScope},
    reports::{self, ReportInput, ReportKind, ReportOutcome, ReportOutput},
    source::SourceRecord,
    trip::{Trip, TripRecord, TripType},
    types::RefId,
    visibility::VisibilityPolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What to run, over which dates, narrowed by which filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub period: DateRange,
    #[serde(default)]
    pub filter: TripFilter,
}

impl ReportRequest {
    pub fn new(kind: ReportKind, period: DateRange) -> Self {
        Self {
            kind,
            period,
            filter: TripFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: TripFilter) -> Self {
        self.filter = filter;
        self
    }
}

pub struct ReportEngine<G> {
    gateway: G,
    config: ReportConfig,
    normalizer: TripNormalizer,
}

impl<G: BookingSourceGateway> ReportEngine<G> {
    pub fn new(gateway: G, config: ReportConfig) -> Self {
        let normalizer = TripNormalizer::new(config.source_defaults());
        Self {
            gateway,
            config,
            normalizer,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The default parent query: every type and status, one page of the
    /// configured size.
    pub fn default_query(&self) -> TripQuery {
        TripQuery::all(self.config.parent_fetch_limit)
    }

    /// Fetch one page of parent trips and their source rows, and normalize
    /// them. A full page means older trips were left out.
    pub async fn load_trips(&self, query: &TripQuery) -> ReportResult<Vec<Trip>> {
        let parents = self.fetch_parents(query).await?;
        if parents.len() as i64 >= query.limit.max(1) {
            log::warn!(
                "parent fetch hit its cap of {} rows at offset {}, older trips are not loaded",
                query.limit,
                query.offset,
            );
        }
        self.normalize_parents(parents).await
    }

    /// Every parent trip in the store, paged by the configured fetch limit
    /// until a short page comes back. Reports read history through this.
    pub async fn load_history(&self) -> ReportResult<Vec<Trip>> {
        let mut query = self.default_query();
        let mut seen = HashSet::new();
        let mut parents = Vec::new();
        let mut pages = 0;
        loop {
            let page = self.fetch_parents(&query).await?;
            pages += 1;
            let short = (page.len() as i64) < query.limit.max(1);
            let before = parents.len();
            // Rows created between pages shift the offset; keep the first sighting.
            parents.extend(page.into_iter().filter(|p| seen.insert(p.id.clone())));
            if short || parents.len() == before {
                break;
            }
            query = query.next_page();
        }
        log::debug!("history: {} parent trips over {pages} pages", parents.len());
        self.normalize_parents(parents).await
    }

    async fn fetch_parents(&self, query: &TripQuery) -> ReportResult<Vec<TripRecord>> {
        self.gateway.fetch_trips(query).await.map_err(|e| match e {
            ReportError::FetchFailure { .. } => e,
            other => ReportError::fetch("trips", other),
        })
    }

    async fn normalize_parents(&self, parents: Vec<TripRecord>) -> ReportResult<Vec<Trip>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }

        let mut wanted: HashMap<TripType, Vec<RefId>> = HashMap::new();
        for parent in &parents {
            wanted
                .entry(parent.trip_type)
                .or_default()
                .push(parent.ref_id.clone());
        }

        let (subscription, airport, rental, manual) = tokio::join!(
            self.fetch_kind(TripType::Subscription, refs_for(&wanted, TripType::Subscription)),
            self.fetch_kind(TripType::Airport, refs_for(&wanted, TripType::Airport)),
            self.fetch_kind(TripType::Rental, refs_for(&wanted, TripType::Rental)),
            self.fetch_kind(TripType::Manual, refs_for(&wanted, TripType::Manual)),
        );

        let mut batch = SourceBatch::new();
        for (trip_type, result) in [
            (TripType::Subscription, subscription),
            (TripType::Airport, airport),
            (TripType::Rental, rental),
            (TripType::Manual, manual),
        ] {
            match result {
                Ok(rows) => batch.extend(rows),
                Err(e) => {
                    log::warn!(
                        "{trip_type} source fetch failed for {} refs, degrading to shells: {e}",
                        refs_for(&wanted, trip_type).len(),
                    );
                    batch.mark_failed(trip_type);
                }
            }
        }

        Ok(self.normalizer.normalize(&parents, &batch))
    }

    async fn fetch_kind(
        &self,
        trip_type: TripType,
        ref_ids: &[RefId],
    ) -> ReportResult<Vec<SourceRecord>> {
        if ref_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.gateway.fetch_source_records(trip_type, ref_ids).await
    }

    /// The dashboard stream. Visibility applies unless the filter carries
    /// a date range. Payment-mode filtering is ignored here: the live
    /// stream is never enriched.
    pub async fn live_trips(
        &self,
        query: &TripQuery,
        filter: &TripFilter,
        policy: VisibilityPolicy,
        clock: &ReportClock,
    ) -> ReportResult<Vec<Trip>> {
        let trips = self.load_trips(query).await?;
        let visible = match filter.date_range {
            Some(_) => trips,
            None => policy.apply(trips, clock.today()),
        };
        let selected = filter.apply(visible, clock);
        log::debug!("live stream: {} trips", selected.len());
        Ok(selected)
    }

    /// Range-bounded, filtered and enriched trips, as reports see them.
    pub async fn report_trips(
        &self,
        filter: &TripFilter,
        period: DateRange,
        scope: Option<PaymentScope>,
        clock: &ReportClock,
    ) -> ReportResult<Vec<EnrichedTrip>> {
        let history = self.load_history().await?;
        let filter = filter.clone().with_date_range(period);
        let selected = filter.select(&history, clock);
        let enriched = match effective_scope(scope, &filter) {
            Some(scope) => PaymentEnricher::enrich(&self.gateway, selected, scope).await,
            None => selected.into_iter().map(EnrichedTrip::without_payment).collect(),
        };
        Ok(filter.select_paid(enriched))
    }

    pub async fn run_report(
        &self,
        request: &ReportRequest,
        clock: &ReportClock,
    ) -> ReportResult<ReportOutput> {
        log::info!(
            "running {} for {}..{}",
            request.kind.as_str(),
            request.period.from,
            request.period.to,
        );

        // Unfiltered history stays around for lifetime metrics.
        let history = self.load_history().await?;
        let filter = request.filter.clone().with_date_range(request.period);
        let selected = filter.select(&history, clock);
        let scope = effective_scope(request.kind.payment_scope(), &filter);

        let payments = async {
            match scope {
                Some(scope) => Some(PaymentEnricher::fetch_map(&self.gateway, &selected, scope).await),
                None => None,
            }
        };
        let active_subscriptions = async {
            if request.kind != ReportKind::SubscriptionPerformance {
                return 0;
            }
            match self.gateway.count_active_subscriptions().await {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("active subscription count failed, using 0: {e}");
                    0
                }
            }
        };
        let (payments, active_subscriptions) = tokio::join!(payments, active_subscriptions);

        let enriched = match payments {
            Some(map) => PaymentEnricher::attach(selected, &map),
            None => selected.into_iter().map(EnrichedTrip::without_payment).collect(),
        };
        let trips = filter.select_paid(enriched);
        log::debug!(
            "{}: {} of {} trips in scope",
            request.kind.as_str(),
            trips.len(),
            history.len(),
        );

        let input = ReportInput {
            trips: &trips,
            history: &history,
            period: request.period,
            active_subscriptions,
            config: &self.config,
        };
        Ok(reports::run(request.kind, &input))
    }

    /// Precomputed per-day rollups straight from the gateway.
    pub async fn daily_rollup(
        &self,
        period: DateRange,
        hub_id: Option<&str>,
    ) -> ReportResult<ReportOutcome<Vec<DailySummaryRow>>> {
        let rows = self
            .gateway
            .fetch_daily_summary(period.from, period.to, hub_id)
            .await
            .map_err(|e| ReportError::fetch("daily summary", e))?;
        Ok(non_empty(rows))
    }

    pub async fn weekly_rollup(
        &self,
        period: DateRange,
        hub_id: Option<&str>,
    ) -> ReportResult<ReportOutcome<Vec<WeeklySummaryRow>>> {
        let rows = self
            .gateway
            .fetch_weekly_summary(period.from, period.to, hub_id)
            .await
            .map_err(|e| ReportError::fetch("weekly summary", e))?;
        Ok(non_empty(rows))
    }
}

fn refs_for(wanted: &HashMap<TripType, Vec<RefId>>, trip_type: TripType) -> &[RefId] {
    wanted.get(&trip_type).map(Vec::as_slice).unwrap_or_default()
}

/// A payment-mode filter needs completed payments even when the report
/// itself ignores them.
fn effective_scope(scope: Option<PaymentScope>, filter: &TripFilter) -> Option<PaymentScope> {
    scope.or(filter.payment_mode.map(|_| PaymentScope::CompletedOnly))
}

fn non_empty<T>(rows: Vec<T>) -> ReportOutcome<Vec<T>> {
    if rows.is_empty() {
        ReportOutcome::NoData
    } else {
        ReportOutcome::Ready(rows)
    }
}
