use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use super::retry::execute_with_retry;
use crate::error::{RankingError, Result};
use crate::models::{
    FixtureRecord, FixturesPage, RankingsRecord, RankingsSnapshot, RankingsSource, TeamId,
    TeamRecord,
};
use crate::venue_lookup::TeamSource;

pub const DEFAULT_BASE_URL: &str = "https://api.wr-rims-prod.pulselive.com/rugby/v3";

/// Page size requested from the fixtures endpoint. A shorter page is the last.
pub const FIXTURES_PAGE_SIZE: usize = 100;

/// Hard stop for paging in case the provider never returns a short page.
const MAX_FIXTURE_PAGES: u32 = 50;

#[derive(Debug, Clone)]
pub struct WorldRugbyClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl Default for WorldRugbyClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
        }
    }
}

#[derive(Clone)]
pub struct WorldRugbyClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
}

impl std::fmt::Debug for WorldRugbyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldRugbyClient")
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Default for WorldRugbyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldRugbyClient {
    pub fn new() -> Self {
        Self::with_config(WorldRugbyClientConfig::default())
    }

    pub fn with_config(config: WorldRugbyClientConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ranking table for a source, optionally as of a past date.
    pub async fn fetch_rankings(
        &self,
        source: RankingsSource,
        as_of: Option<NaiveDate>,
    ) -> Result<RankingsSnapshot> {
        let url = format!("{}/rankings/{}", self.base_url, source.as_str());
        let query: Vec<(&str, String)> = as_of
            .map(|date| vec![("date", format_date(date))])
            .unwrap_or_default();

        let record: RankingsRecord = self.get_json(&url, &query).await?;
        let snapshot = RankingsSnapshot::from_record(record, source, as_of);
        info!(
            "Loaded {} {} rankings effective {}{}",
            snapshot.len(),
            source,
            snapshot.effective_label,
            if snapshot.estimated { " (estimated)" } else { "" }
        );
        Ok(snapshot)
    }

    pub async fn fetch_fixtures_page(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<Vec<FixtureRecord>> {
        let url = format!("{}/match", self.base_url);
        let query = fixtures_query(from, to, page);
        let page: FixturesPage = self.get_json(&url, &query).await?;
        Ok(page.content)
    }

    /// Every fixture between two dates, in provider order.
    pub async fn fetch_all_fixtures(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FixtureRecord>> {
        let fixtures = collect_pages(|page| self.fetch_fixtures_page(from, to, page)).await?;
        info!("Loaded {} fixtures from {} to {}", fixtures.len(), from, to);
        Ok(fixtures)
    }

    pub async fn fetch_team(&self, id: &TeamId) -> Result<TeamRecord> {
        let url = format!("{}/team/{}", self.base_url, id);
        self.get_json(&url, &[]).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let client = &self.client;
        execute_with_retry(
            || async move {
                debug!("GET {}", url);
                let resp = client.get(url).query(query).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(RankingError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(resp.json::<T>().await?)
            },
            self.max_attempts,
        )
        .await
    }
}

#[async_trait]
impl TeamSource for WorldRugbyClient {
    async fn fetch_team(&self, id: &TeamId) -> Result<TeamRecord> {
        WorldRugbyClient::fetch_team(self, id).await
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn fixtures_query(from: NaiveDate, to: NaiveDate, page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("startDate", format_date(from)),
        ("endDate", format_date(to)),
        ("sort", "asc".to_string()),
        ("pageSize", FIXTURES_PAGE_SIZE.to_string()),
        ("page", page.to_string()),
    ]
}

/// Fetch pages starting at 0 until one comes back short.
async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<FixtureRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<FixtureRecord>>>,
{
    let mut all = Vec::new();
    for page in 0..MAX_FIXTURE_PAGES {
        let batch = fetch(page).await?;
        let last = batch.len() < FIXTURES_PAGE_SIZE;
        all.extend(batch);
        if last {
            break;
        }
    }
    Ok(all)
}
