//! Fixture lifecycle classification.
//!
//! This module provides:
//! - `StatusCode`: the provider's match status codes as a closed enum
//! - `FixtureStatus`: the lifecycle state shown for a fixture
//! - `classify_status`: a pure mapping from code + timestamps to state
//!
//! Nothing here is stored; callers recompute the state from the inputs
//! whenever they need it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// How long after kickoff an unstarted match is still treated as upcoming
/// before we assume the provider is late reporting it.
pub const KICKOFF_LEEWAY_MINUTES: i64 = 5;

/// Assumed length of a match, used to guess whether a completed result was
/// already folded into the rankings snapshot.
pub const MATCH_DURATION_MINUTES: i64 = 90;

/// Provider status code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusCode {
    /// "U"
    Unstarted,
    /// "UP"
    Postponed,
    /// "CC"
    Cancelled,
    /// "C"
    Complete,
    /// "L1"
    FirstHalf,
    /// "LHT"
    HalfTime,
    /// "L2"
    SecondHalf,
    /// Anything the provider adds later.
    Unknown(String),
}

impl StatusCode {
    pub fn parse(code: &str) -> Self {
        match code.trim() {
            "U" => StatusCode::Unstarted,
            "UP" => StatusCode::Postponed,
            "CC" => StatusCode::Cancelled,
            "C" => StatusCode::Complete,
            "L1" => StatusCode::FirstHalf,
            "LHT" => StatusCode::HalfTime,
            "L2" => StatusCode::SecondHalf,
            other => StatusCode::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusCode::Unstarted => "U",
            StatusCode::Postponed => "UP",
            StatusCode::Cancelled => "CC",
            StatusCode::Complete => "C",
            StatusCode::FirstHalf => "L1",
            StatusCode::HalfTime => "LHT",
            StatusCode::SecondHalf => "L2",
            StatusCode::Unknown(code) => code,
        }
    }

    /// True once the match has kicked off and the provider reports a score.
    pub fn has_score(&self) -> bool {
        matches!(
            self,
            StatusCode::Complete
                | StatusCode::FirstHalf
                | StatusCode::HalfTime
                | StatusCode::SecondHalf
        )
    }

}

impl From<String> for StatusCode {
    fn from(code: String) -> Self {
        StatusCode::parse(&code)
    }
}

impl From<StatusCode> for String {
    fn from(code: StatusCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureStatus {
    /// Not started, kickoff (plus leeway) still ahead
    Upcoming,
    /// Not started according to the provider, but kickoff is well past
    Unreported,
    Postponed,
    Cancelled,
    FirstHalf,
    HalfTime,
    SecondHalf,
    Complete {
        /// Finished before the rankings were published, so presumably
        /// already counted in them
        already_in_rankings: bool,
    },
}

impl FixtureStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FixtureStatus::Upcoming => "Upcoming",
            FixtureStatus::Unreported => "Unreported",
            FixtureStatus::Postponed => "Postponed",
            FixtureStatus::Cancelled => "Cancelled",
            FixtureStatus::FirstHalf => "First half",
            FixtureStatus::HalfTime => "Half time",
            FixtureStatus::SecondHalf => "Second half",
            FixtureStatus::Complete { .. } => "Complete",
        }
    }

    pub fn is_unstarted(&self) -> bool {
        matches!(self, FixtureStatus::Upcoming | FixtureStatus::Unreported)
    }

    pub fn already_in_rankings(&self) -> bool {
        matches!(
            self,
            FixtureStatus::Complete {
                already_in_rankings: true
            }
        )
    }
}

impl fmt::Display for FixtureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a fixture from its provider status and timestamps.
///
/// The "already in rankings" check compares the assumed end of the match
/// (kickoff + 90 minutes) with the rankings' effective instant. It will
/// wrongly exclude a match that finished before rankings were published
/// without being counted, and wrongly include one that was counted less than
/// 90 minutes after kickoff.
pub fn classify_status(
    code: &StatusCode,
    kickoff: DateTime<Utc>,
    now: DateTime<Utc>,
    rankings_effective: DateTime<Utc>,
) -> FixtureStatus {
    match code {
        StatusCode::Unstarted => unstarted_status(kickoff, now),
        StatusCode::Postponed => FixtureStatus::Postponed,
        StatusCode::Cancelled => FixtureStatus::Cancelled,
        StatusCode::Complete => {
            // An end past chrono's range is never before the rankings
            let already_in_rankings = kickoff
                .checked_add_signed(Duration::minutes(MATCH_DURATION_MINUTES))
                .is_some_and(|assumed_end| assumed_end < rankings_effective);
            FixtureStatus::Complete {
                already_in_rankings,
            }
        }
        StatusCode::FirstHalf => FixtureStatus::FirstHalf,
        StatusCode::HalfTime => FixtureStatus::HalfTime,
        StatusCode::SecondHalf => FixtureStatus::SecondHalf,
        StatusCode::Unknown(raw) => {
            debug!("Unknown fixture status code {:?}, treating as upcoming", raw);
            FixtureStatus::Upcoming
        }
    }
}

fn unstarted_status(kickoff: DateTime<Utc>, now: DateTime<Utc>) -> FixtureStatus {
    match kickoff.checked_add_signed(Duration::minutes(KICKOFF_LEEWAY_MINUTES)) {
        Some(deadline) if now >= deadline => FixtureStatus::Unreported,
        _ => FixtureStatus::Upcoming,
    }
}
