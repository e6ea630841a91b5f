//! Deduplicated team-country lookups.
//!
//! Several fixtures in one batch usually share a team. The cache hands every
//! caller for the same team the same in-flight request, so each distinct team
//! is fetched at most once per cache lifetime. Failures are cached as well;
//! a batch that hit a failed lookup gets a fresh cache on the next run.

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{LookupError, RankingError, Result};
use crate::models::{TeamId, TeamRecord};

/// Remote source of team details.
#[async_trait]
pub trait TeamSource: Send + Sync {
    async fn fetch_team(&self, id: &TeamId) -> Result<TeamRecord>;
}

/// Resolves a team to its home country code.
#[async_trait]
pub trait CountryLookup: Send + Sync {
    async fn country_of(&self, team: &TeamId) -> std::result::Result<String, LookupError>;
}

type SharedLookup = Shared<BoxFuture<'static, std::result::Result<String, LookupError>>>;

pub struct VenueLookupCache {
    source: Arc<dyn TeamSource>,
    lookups: Mutex<HashMap<TeamId, SharedLookup>>,
    requests: AtomicUsize,
}

impl VenueLookupCache {
    pub fn new(source: Arc<dyn TeamSource>) -> Self {
        Self {
            source,
            lookups: Mutex::new(HashMap::new()),
            requests: AtomicUsize::new(0),
        }
    }

    /// Future for a team's country, joining an existing request if there
    /// is one.
    pub fn lookup(&self, team: &TeamId) -> SharedLookup {
        let mut lookups = self.lookups.lock();
        if let Some(existing) = lookups.get(team) {
            return existing.clone();
        }

        self.requests.fetch_add(1, Ordering::SeqCst);
        let source = Arc::clone(&self.source);
        let id = team.clone();
        let request = async move { fetch_country(source.as_ref(), &id).await }
            .boxed()
            .shared();
        lookups.insert(team.clone(), request.clone());
        request
    }

    /// Number of requests actually sent to the source.
    pub fn requests_issued(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of distinct teams seen.
    pub fn len(&self) -> usize {
        self.lookups.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.lock().is_empty()
    }
}

#[async_trait]
impl CountryLookup for VenueLookupCache {
    async fn country_of(&self, team: &TeamId) -> std::result::Result<String, LookupError> {
        self.lookup(team).await
    }
}

async fn fetch_country(
    source: &dyn TeamSource,
    id: &TeamId,
) -> std::result::Result<String, LookupError> {
    debug!("Fetching country for team {}", id);
    let record = match source.fetch_team(id).await {
        Ok(record) => record,
        Err(e) => return Err(LookupError::new(id.clone(), e)),
    };
    match record.country {
        Some(country) if !country.trim().is_empty() => Ok(country),
        _ => Err(LookupError::new(
            id.clone(),
            RankingError::MissingCountry(id.clone()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct SlowSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TeamSource for SlowSource {
        async fn fetch_team(&self, id: &TeamId) -> Result<TeamRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            let country = match id.as_str() {
                "1" => Some("IRL".to_string()),
                "2" => Some("FRA".to_string()),
                _ => None,
            };
            Ok(TeamRecord {
                id: id.clone(),
                name: None,
                abbreviation: None,
                country,
            })
        }
    }

    fn cache() -> (Arc<SlowSource>, VenueLookupCache) {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
        });
        let cache = VenueLookupCache::new(source.clone());
        (source, cache)
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_request() {
        let (source, cache) = cache();
        let team = TeamId::from("1");

        let (a, b, c) = tokio::join!(
            cache.country_of(&team),
            cache.country_of(&team),
            cache.country_of(&team)
        );

        assert_eq!(a.unwrap(), "IRL");
        assert_eq!(b.unwrap(), "IRL");
        assert_eq!(c.unwrap(), "IRL");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.requests_issued(), 1);
    }

    #[tokio::test]
    async fn test_distinct_teams_each_fetched_once() {
        let (source, cache) = cache();
        for id in ["1", "2", "1", "2", "1"] {
            cache.country_of(&TeamId::from(id)).await.unwrap();
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_country_is_a_lookup_error() {
        let (source, cache) = cache();
        let team = TeamId::from("77");

        let err = cache.country_of(&team).await.unwrap_err();
        assert_eq!(err.team, team);

        // The failure is shared too, not retried
        assert!(cache.country_of(&team).await.is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
