//! Error types for the rankings core.
//!
//! Nothing in the calculation path is fatal: bad ratings become NaN and
//! failed venue lookups degrade to default flags. These errors only surface
//! from the provider client and from configuration (bad regex, bad source).

use crate::models::TeamId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid provider JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("provider returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid venue exemption pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("unknown rankings source: {0}")]
    UnknownSource(String),

    #[error("team {0} has no country")]
    MissingCountry(TeamId),
}

pub type Result<T> = std::result::Result<T, RankingError>;

/// Failure of a single team-country lookup.
///
/// Cloneable so one failed request can be handed to every fixture that
/// shared it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("country lookup for team {team} failed: {message}")]
pub struct LookupError {
    pub team: TeamId,
    pub message: String,
}

impl LookupError {
    pub fn new(team: TeamId, err: impl std::fmt::Display) -> Self {
        Self {
            team,
            message: err.to_string(),
        }
    }
}
