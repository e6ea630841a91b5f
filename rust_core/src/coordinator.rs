//! Batch processing of provider fixtures.
//!
//! The coordinator turns a page of provider records into fixtures, resolves
//! home advantage for each one through a shared lookup cache, and reports a
//! single settled event once every lookup of the batch has finished.
//!
//! Settlement is tracked explicitly: each fixture that needs lookups holds
//! the tracker open until its resolution completes, and each individual
//! lookup is counted while it is in flight. The event fires when dispatch
//! is finished and nothing is outstanding, and never more than once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::LookupError;
use crate::home_advantage::{AdvantageResolution, HomeAdvantageResolver};
use crate::models::{Fixture, FixtureRecord, RankingsSnapshot, TeamId};
use crate::venue_lookup::{CountryLookup, TeamSource, VenueLookupCache};

/// Emitted once per batch when all lookups have completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSettled {
    /// Lookups requested by resolvers, including ones served from the cache
    pub lookups_issued: usize,
    pub lookups_failed: usize,
    pub fixtures_resolved: usize,
}

/// Outstanding-lookup counter with a one-shot settled signal.
pub struct LookupTracker {
    outstanding: AtomicUsize,
    issued: AtomicUsize,
    failed: AtomicUsize,
    resolved: AtomicUsize,
    dispatched: AtomicBool,
    fired: AtomicBool,
    settled_tx: watch::Sender<Option<BatchSettled>>,
}

impl LookupTracker {
    pub fn new() -> Arc<Self> {
        let (settled_tx, _) = watch::channel(None);
        Arc::new(Self {
            outstanding: AtomicUsize::new(0),
            issued: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            resolved: AtomicUsize::new(0),
            dispatched: AtomicBool::new(false),
            fired: AtomicBool::new(false),
            settled_tx,
        })
    }

    /// Count one unit of outstanding work until the guard is dropped.
    pub fn begin(self: &Arc<Self>) -> LookupGuard {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        LookupGuard {
            tracker: Arc::clone(self),
        }
    }

    /// No more work will be started for this batch.
    pub fn finish_dispatch(&self) {
        self.dispatched.store(true, Ordering::SeqCst);
        self.try_settle();
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    pub fn is_settled(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<BatchSettled>> {
        self.settled_tx.subscribe()
    }

    /// Wait for the settled event. Returns immediately if it already fired.
    pub async fn settled(&self) -> BatchSettled {
        let mut rx = self.subscribe();
        loop {
            if let Some(event) = *rx.borrow_and_update() {
                return event;
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn record_resolved(&self) {
        self.resolved.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> BatchSettled {
        BatchSettled {
            lookups_issued: self.issued.load(Ordering::SeqCst),
            lookups_failed: self.failed.load(Ordering::SeqCst),
            fixtures_resolved: self.resolved.load(Ordering::SeqCst),
        }
    }

    fn release(&self) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.try_settle();
    }

    fn try_settle(&self) {
        if !self.dispatched.load(Ordering::SeqCst) || self.outstanding() != 0 {
            return;
        }
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let event = self.snapshot();
        info!(
            "Batch settled: {} lookups ({} failed), {} fixtures resolved",
            event.lookups_issued, event.lookups_failed, event.fixtures_resolved
        );
        self.settled_tx.send_replace(Some(event));
    }
}

/// Releases one unit of outstanding work on drop.
pub struct LookupGuard {
    tracker: Arc<LookupTracker>,
}

impl Drop for LookupGuard {
    fn drop(&mut self) {
        self.tracker.release();
    }
}

/// Country lookup that reports every request to the batch tracker.
struct TrackedLookup<'a> {
    cache: &'a VenueLookupCache,
    tracker: &'a Arc<LookupTracker>,
}

#[async_trait]
impl<'a> CountryLookup for TrackedLookup<'a> {
    async fn country_of(&self, team: &TeamId) -> Result<String, LookupError> {
        let _guard = self.tracker.begin();
        self.tracker.record_issued();
        let result = self.cache.country_of(team).await;
        if result.is_err() {
            self.tracker.record_failure();
        }
        result
    }
}

/// Result of processing one batch of provider records.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Fixtures in provider order
    pub fixtures: Vec<Fixture>,
    pub settled: BatchSettled,
    /// Records dropped because a team isn't in the rankings
    pub skipped: usize,
    /// Requests actually sent to the team source
    pub requests_sent: usize,
}

impl BatchReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(|f| f.resolution.is_failure())
    }
}

pub struct FixtureBatchCoordinator {
    source: Arc<dyn TeamSource>,
    resolver: HomeAdvantageResolver,
}

impl FixtureBatchCoordinator {
    pub fn new(source: Arc<dyn TeamSource>, resolver: HomeAdvantageResolver) -> Self {
        Self { source, resolver }
    }

    /// Build fixtures from records, dropping those with unranked teams.
    pub fn build_fixtures(
        &self,
        records: Vec<FixtureRecord>,
        rankings: &RankingsSnapshot,
        now: DateTime<Utc>,
    ) -> (Vec<Fixture>, usize) {
        let total = records.len();
        let fixtures: Vec<Fixture> = records
            .into_iter()
            .filter_map(|record| {
                let match_id = record.match_id.clone();
                let fixture = Fixture::from_record(record, rankings, now);
                if fixture.is_none() {
                    debug!(
                        "Skipping fixture {}: team not in rankings",
                        match_id.as_deref().unwrap_or("-")
                    );
                }
                fixture
            })
            .collect();
        let skipped = total - fixtures.len();
        (fixtures, skipped)
    }

    pub async fn process_all(
        &self,
        records: Vec<FixtureRecord>,
        rankings: &RankingsSnapshot,
        now: DateTime<Utc>,
    ) -> BatchReport {
        let tracker = LookupTracker::new();
        self.process_all_tracked(records, rankings, now, &tracker)
            .await
    }

    /// Like `process_all`, with a caller-owned tracker so the settled event
    /// can be observed. Use a fresh tracker for every batch.
    pub async fn process_all_tracked(
        &self,
        records: Vec<FixtureRecord>,
        rankings: &RankingsSnapshot,
        now: DateTime<Utc>,
        tracker: &Arc<LookupTracker>,
    ) -> BatchReport {
        let (mut fixtures, skipped) = self.build_fixtures(records, rankings, now);
        info!(
            "Processing {} fixtures ({} skipped)",
            fixtures.len(),
            skipped
        );

        let cache = VenueLookupCache::new(Arc::clone(&self.source));
        let lookup = TrackedLookup {
            cache: &cache,
            tracker,
        };

        let resolutions: Vec<(usize, AdvantageResolution)> = {
            let resolver = &self.resolver;
            let lookup = &lookup;
            let mut pending = FuturesUnordered::new();

            for (index, fixture) in fixtures.iter().enumerate() {
                // Held until the fixture's last lookup completes, so the
                // counter can't touch zero between its home and away lookups.
                let hold = resolver.needs_lookup(fixture).then(|| tracker.begin());
                pending.push(async move {
                    let resolution = resolver.resolve(fixture, lookup).await;
                    if resolution.is_resolved() && hold.is_some() {
                        tracker.record_resolved();
                    }
                    drop(hold);
                    (index, resolution)
                });
            }
            tracker.finish_dispatch();

            let mut done = Vec::with_capacity(pending.len());
            while let Some(result) = pending.next().await {
                done.push(result);
            }
            done
        };

        for (index, resolution) in resolutions {
            fixtures[index].apply_resolution(resolution);
        }

        let settled = tracker.settled().await;
        BatchReport {
            fixtures,
            settled,
            skipped,
            requests_sent: cache.requests_issued(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracker_settles_at_dispatch_end_without_work() {
        let tracker = LookupTracker::new();
        assert!(!tracker.is_settled());
        tracker.finish_dispatch();
        assert!(tracker.is_settled());
        assert_eq!(tracker.settled().await, BatchSettled::default());
    }

    #[tokio::test]
    async fn test_tracker_waits_for_outstanding_guards() {
        let tracker = LookupTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();
        tracker.finish_dispatch();
        assert!(!tracker.is_settled());

        drop(first);
        assert!(!tracker.is_settled());
        assert_eq!(tracker.outstanding(), 1);

        drop(second);
        assert!(tracker.is_settled());
    }

    #[tokio::test]
    async fn test_tracker_does_not_settle_before_dispatch_ends() {
        let tracker = LookupTracker::new();
        drop(tracker.begin());
        assert!(!tracker.is_settled());

        let mut rx = tracker.subscribe();
        tracker.finish_dispatch();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
    }

    #[tokio::test]
    async fn test_tracker_fires_once() {
        let tracker = LookupTracker::new();
        tracker.finish_dispatch();
        let mut rx = tracker.subscribe();
        assert!(rx.borrow_and_update().is_some());

        // Later work on a settled tracker never produces a second event
        drop(tracker.begin());
        tracker.finish_dispatch();
        assert!(!rx.has_changed().unwrap());
    }
}
