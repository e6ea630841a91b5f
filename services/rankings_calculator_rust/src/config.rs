//! Configuration for the rankings calculator
//!
//! All settings come from environment variables (optionally via `.env`) with
//! defaults that point at the public provider.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rugby_rankings_core::clients::{WorldRugbyClientConfig, DEFAULT_BASE_URL};
use rugby_rankings_core::home_advantage::DEFAULT_VENUE_EXEMPT_PATTERNS;
use rugby_rankings_core::{RankingsSource, VenuePolicy};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub source: RankingsSource,
    /// Load rankings as of this date instead of the latest
    pub rankings_date: Option<NaiveDate>,
    pub http_timeout_secs: u64,
    pub http_max_attempts: u32,
    pub venue_exempt_patterns: Vec<String>,
    pub output: OutputFormat,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = get("WR_API_BASE").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let source = match get("RANKINGS_SOURCE") {
            Some(raw) => raw
                .parse::<RankingsSource>()
                .with_context(|| format!("Invalid RANKINGS_SOURCE: {raw} (expected mru|wru)"))?,
            None => RankingsSource::default(),
        };

        let rankings_date = match get("RANKINGS_DATE").filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("Invalid RANKINGS_DATE: {raw} (expected YYYY-MM-DD)"))?,
            ),
            None => None,
        };

        let http_timeout_secs = parse_num(&get, "HTTP_TIMEOUT_SECS", 10)?;
        if http_timeout_secs == 0 {
            return Err(anyhow!("HTTP_TIMEOUT_SECS must be at least 1"));
        }
        let http_max_attempts = parse_num(&get, "HTTP_MAX_ATTEMPTS", 3)?;
        if http_max_attempts == 0 {
            return Err(anyhow!("HTTP_MAX_ATTEMPTS must be at least 1"));
        }

        let venue_exempt_patterns = match get("VENUE_EXEMPT_PATTERNS") {
            Some(raw) => raw
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_VENUE_EXEMPT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        };

        let output = match get("OUTPUT_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("table") => OutputFormat::Table,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(anyhow!("Invalid OUTPUT_FORMAT: {other} (expected table|json)")),
        };

        Ok(Self {
            api_base,
            source,
            rankings_date,
            http_timeout_secs,
            http_max_attempts,
            venue_exempt_patterns,
            output,
        })
    }

    pub fn client_config(&self) -> WorldRugbyClientConfig {
        WorldRugbyClientConfig {
            base_url: self.api_base.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            max_attempts: self.http_max_attempts,
        }
    }

    pub fn venue_policy(&self) -> Result<VenuePolicy> {
        VenuePolicy::from_patterns(&self.venue_exempt_patterns)
            .context("Invalid VENUE_EXEMPT_PATTERNS")
    }

    /// Log current configuration (useful at startup)
    pub fn log_config(&self) {
        log::info!("Config loaded:");
        log::info!("  api_base: {}", self.api_base);
        log::info!("  source: {}", self.source);
        match self.rankings_date {
            Some(date) => log::info!("  rankings_date: {}", date),
            None => log::info!("  rankings_date: latest"),
        }
        log::info!("  http_timeout_secs: {}s", self.http_timeout_secs);
        log::info!("  http_max_attempts: {}", self.http_max_attempts);
        log::info!("  venue_exempt_patterns: {:?}", self.venue_exempt_patterns);
        log::info!("  output: {:?}", self.output);
    }
}

fn parse_num<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + ToString,
{
    let raw = get(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|_| anyhow!("Invalid {key}: {raw} (expected integer)"))
}
