// Shared models for the rankings calculator
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RankingError;

pub mod fixture;
pub mod records;

pub use fixture::{Fixture, Venue};
pub use records::{
    EffectiveRecord, EventRecord, FixtureRecord, FixturesPage, RankingEntryRecord,
    RankingsRecord, TeamRecord, TimeRecord, VenueRecord,
};

/// Names longer than this are shown by abbreviation.
pub const MAX_DISPLAY_NAME_LEN: usize = 15;

// ============================================================================
// Teams
// ============================================================================

/// Opaque team key. The provider sends ids as strings or numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    /// Placeholder id for a knockout slot whose team is not decided yet.
    pub const UNDECIDED: &'static str = "0";

    pub fn undecided() -> Self {
        Self(Self::UNDECIDED.to_string())
    }

    pub fn is_undecided(&self) -> bool {
        self.0 == Self::UNDECIDED || self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for TeamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => TeamId(s),
            RawId::Number(n) => TeamId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub abbreviation: Option<String>,
    /// Home country code, when the provider included it
    pub country: Option<String>,
}

impl Team {
    /// Short name for table columns.
    pub fn display_name(&self) -> &str {
        if self.name.chars().count() > MAX_DISPLAY_NAME_LEN {
            self.abbreviation.as_deref().unwrap_or(&self.name)
        } else {
            &self.name
        }
    }

    /// Full name, only when `display_name` had to shorten it.
    pub fn display_title(&self) -> Option<&str> {
        if self.name.chars().count() > MAX_DISPLAY_NAME_LEN {
            Some(&self.name)
        } else {
            None
        }
    }
}

impl From<TeamRecord> for Team {
    fn from(record: TeamRecord) -> Self {
        Self {
            name: record.name.unwrap_or_else(|| record.id.to_string()),
            id: record.id,
            abbreviation: record.abbreviation,
            country: record.country,
        }
    }
}

// ============================================================================
// Rankings
// ============================================================================

/// Which ranking table to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingsSource {
    /// Men's rankings
    #[default]
    Mru,
    /// Women's rankings
    Wru,
}

impl RankingsSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingsSource::Mru => "mru",
            RankingsSource::Wru => "wru",
        }
    }
}

impl FromStr for RankingsSource {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mru" | "m" => Ok(RankingsSource::Mru),
            // "w" is the legacy women's flag
            "wru" | "w" => Ok(RankingsSource::Wru),
            other => Err(RankingError::UnknownSource(other.to_string())),
        }
    }
}

impl fmt::Display for RankingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub team: Team,
    pub points: f64,
    pub rank: u32,
}

impl From<RankingEntryRecord> for RankingEntry {
    fn from(record: RankingEntryRecord) -> Self {
        Self {
            team: record.team.into(),
            points: record.pts,
            rank: record.pos,
        }
    }
}

/// Ranking table as of one effective instant.
#[derive(Debug, Clone, Serialize)]
pub struct RankingsSnapshot {
    pub source: RankingsSource,
    /// Entries sorted by points, highest first
    pub entries: Vec<RankingEntry>,
    pub effective_label: String,
    pub effective_at: DateTime<Utc>,
    /// True when the provider's effective date was replaced by the requested date
    pub estimated: bool,
    #[serde(skip)]
    index: HashMap<TeamId, usize>,
}

impl RankingsSnapshot {
    pub fn new(
        source: RankingsSource,
        mut entries: Vec<RankingEntry>,
        effective_label: impl Into<String>,
        effective_at: DateTime<Utc>,
    ) -> Self {
        entries.sort_by(|a, b| b.points.total_cmp(&a.points));
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.team.id.clone(), i))
            .collect();
        Self {
            source,
            entries,
            effective_label: effective_label.into(),
            effective_at,
            estimated: false,
            index,
        }
    }

    /// Build from a provider response.
    ///
    /// Historical requests sometimes come back with an effective date after
    /// the requested one. The label is a plain date so it compares
    /// lexicographically; when it is later than the request we fall back to
    /// the requested date at midnight UTC.
    pub fn from_record(
        record: RankingsRecord,
        source: RankingsSource,
        requested: Option<NaiveDate>,
    ) -> Self {
        let effective_at = Utc
            .timestamp_millis_opt(record.effective.millis)
            .single()
            .unwrap_or_else(Utc::now);
        let entries = record.entries.into_iter().map(RankingEntry::from).collect();
        let mut snapshot = Self::new(source, entries, record.effective.label, effective_at);

        if let Some(date) = requested {
            let requested_label = date.format("%Y-%m-%d").to_string();
            if snapshot.effective_label > requested_label {
                snapshot.effective_label = requested_label;
                snapshot.effective_at = midnight_utc(date);
                snapshot.estimated = true;
            }
        }

        snapshot
    }

    pub fn get(&self, id: &TeamId) -> Option<&RankingEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn points(&self, id: &TeamId) -> Option<f64> {
        self.get(id).map(|e| e.points)
    }

    pub fn contains(&self, id: &TeamId) -> bool {
        self.index.contains_key(id)
    }

    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.get(id).map(|e| &e.team)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Date the snapshot is effective from.
    pub fn effective_date(&self) -> NaiveDate {
        NaiveDate::parse_from_str(&self.effective_label, "%Y-%m-%d")
            .unwrap_or_else(|_| self.effective_at.date_naive())
    }
}

pub(crate) fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, name: &str) -> Team {
        Team {
            id: TeamId::from(id),
            name: name.to_string(),
            abbreviation: Some(name.chars().take(3).collect::<String>().to_uppercase()),
            country: None,
        }
    }

    fn entry(id: &str, name: &str, points: f64, rank: u32) -> RankingEntry {
        RankingEntry {
            team: team(id, name),
            points,
            rank,
        }
    }

    #[test]
    fn test_team_id_accepts_strings_and_numbers() {
        let from_str: TeamId = serde_json::from_str("\"37\"").unwrap();
        let from_num: TeamId = serde_json::from_str("37").unwrap();
        assert_eq!(from_str, from_num);
        assert_eq!(serde_json::to_string(&from_num).unwrap(), "\"37\"");
    }

    #[test]
    fn test_undecided_team_id() {
        assert!(TeamId::undecided().is_undecided());
        assert!(TeamId::from("").is_undecided());
        assert!(!TeamId::from("37").is_undecided());
    }

    #[test]
    fn test_display_name_shortens_long_names() {
        let short = team("1", "Wales");
        assert_eq!(short.display_name(), "Wales");
        assert_eq!(short.display_title(), None);

        let long = Team {
            abbreviation: Some("USA".to_string()),
            ..team("2", "United States of America")
        };
        assert_eq!(long.display_name(), "USA");
        assert_eq!(long.display_title(), Some("United States of America"));
    }

    #[test]
    fn test_rankings_source_parsing() {
        assert_eq!("mru".parse::<RankingsSource>().unwrap(), RankingsSource::Mru);
        assert_eq!("WRU".parse::<RankingsSource>().unwrap(), RankingsSource::Wru);
        assert_eq!("w".parse::<RankingsSource>().unwrap(), RankingsSource::Wru);
        assert!("xyz".parse::<RankingsSource>().is_err());
    }

    #[test]
    fn test_snapshot_sorts_and_indexes() {
        let snapshot = RankingsSnapshot::new(
            RankingsSource::Mru,
            vec![entry("1", "Wales", 80.0, 3), entry("2", "Ireland", 92.0, 1)],
            "2024-01-01",
            Utc::now(),
        );
        assert_eq!(snapshot.entries[0].team.name, "Ireland");
        assert_eq!(snapshot.points(&TeamId::from("1")), Some(80.0));
        assert!(!snapshot.contains(&TeamId::from("9")));
    }

    #[test]
    fn test_snapshot_estimates_future_effective_date() {
        let record: RankingsRecord = serde_json::from_value(serde_json::json!({
            "entries": [
                {"team": {"id": 37, "name": "South Africa", "abbreviation": "RSA"}, "pts": 94.5, "pos": 1}
            ],
            "effective": {"label": "2020-09-28", "millis": 1601251200000i64}
        }))
        .unwrap();

        let requested = NaiveDate::from_ymd_opt(2020, 9, 21).unwrap();
        let snapshot = RankingsSnapshot::from_record(record, RankingsSource::Mru, Some(requested));

        assert!(snapshot.estimated);
        assert_eq!(snapshot.effective_label, "2020-09-21");
        assert_eq!(snapshot.effective_at, midnight_utc(requested));
        assert_eq!(snapshot.effective_date(), requested);
    }

    #[test]
    fn test_snapshot_keeps_provider_date_when_not_later() {
        let record: RankingsRecord = serde_json::from_value(serde_json::json!({
            "entries": [],
            "effective": {"label": "2023-09-25", "millis": 1695600000000i64}
        }))
        .unwrap();

        let requested = NaiveDate::from_ymd_opt(2023, 9, 26).unwrap();
        let snapshot = RankingsSnapshot::from_record(record, RankingsSource::Wru, Some(requested));

        assert!(!snapshot.estimated);
        assert_eq!(snapshot.effective_label, "2023-09-25");
        assert_eq!(snapshot.effective_at.timestamp_millis(), 1695600000000);
    }
}
