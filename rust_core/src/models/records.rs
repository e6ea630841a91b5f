//! Provider wire records.
//!
//! These mirror the JSON returned by the rankings provider closely; the
//! domain types in the parent module are built from them.

use serde::{Deserialize, Serialize};

use super::TeamId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntryRecord {
    pub team: TeamRecord,
    pub pts: f64,
    pub pos: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveRecord {
    pub label: String,
    pub millis: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsRecord {
    #[serde(default)]
    pub entries: Vec<RankingEntryRecord>,
    pub effective: EffectiveRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueRecord {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRecord {
    pub millis: i64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub label: String,
    #[serde(default)]
    pub rankings_weight: Option<f64>,
}

/// One match as listed by the fixtures endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureRecord {
    #[serde(default)]
    pub match_id: Option<String>,
    /// Home then away. Either slot may be null before a knockout is decided.
    #[serde(default)]
    pub teams: Vec<Option<TeamRecord>>,
    #[serde(default)]
    pub venue: Option<VenueRecord>,
    pub time: TimeRecord,
    pub status: String,
    #[serde(default)]
    pub scores: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub competition: Option<String>,
}

impl FixtureRecord {
    pub fn home(&self) -> Option<&TeamRecord> {
        self.teams.first().and_then(|t| t.as_ref())
    }

    pub fn away(&self) -> Option<&TeamRecord> {
        self.teams.get(1).and_then(|t| t.as_ref())
    }

    pub fn score(&self, side: usize) -> Option<i32> {
        self.scores.as_ref()?.get(side).copied().flatten()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturesPage {
    #[serde(default)]
    pub content: Vec<FixtureRecord>,
}
