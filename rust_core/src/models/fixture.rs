//! Fixture model.
//!
//! A fixture holds the provider's facts about a match plus the flags the
//! batch coordinator resolves for it. Point changes, validity and the active
//! result are derived on every read so they always reflect the current
//! ratings and flags.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::{FixtureRecord, RankingsSnapshot, TeamId, TeamRecord, VenueRecord};
use crate::home_advantage::AdvantageResolution;
use crate::outcome::{resolve_outcome_index, Outcome};
use crate::rating_change::{compute_changes, ChangeVector, HomeAdvantage};
use crate::status::{classify_status, FixtureStatus, StatusCode};

/// Any competition whose name contains this is weighted as a World Cup.
const RWC_COMPETITION_MARKER: &str = "Rugby World Cup";

/// Event weighting the provider uses for World Cup matches.
const RWC_RANKINGS_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    pub name: String,
    pub city: Option<String>,
    pub country: String,
}

impl Venue {
    pub fn name_and_country(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

impl From<VenueRecord> for Venue {
    fn from(record: VenueRecord) -> Self {
        Self {
            name: record.name,
            city: record.city,
            country: record.country,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Fixture {
    pub match_id: Option<String>,
    pub home_id: TeamId,
    /// `None` while the second team is undecided
    pub away_id: Option<TeamId>,
    pub venue: Option<Venue>,
    pub kickoff: Option<DateTime<Utc>>,
    pub status_code: StatusCode,
    pub status: Option<FixtureStatus>,
    pub scores: Option<(i32, i32)>,
    pub competition: String,
    pub event_labels: Vec<String>,
    pub is_rwc: bool,
    pub advantage: HomeAdvantage,
    pub resolution: AdvantageResolution,
    pub home_rating_before: Option<f64>,
    pub away_rating_before: Option<f64>,
    /// False for fixtures loaded from the provider
    pub can_edit_teams: bool,
    result: Option<Outcome>,
}

impl Fixture {
    /// A fixture entered by hand. Flags stay at whatever the caller sets.
    pub fn manual(home_id: TeamId, away_id: TeamId, rankings: &RankingsSnapshot) -> Self {
        Self {
            match_id: None,
            home_rating_before: rankings.points(&home_id),
            away_rating_before: rankings.points(&away_id),
            home_id,
            away_id: Some(away_id),
            venue: None,
            kickoff: None,
            status_code: StatusCode::Unstarted,
            status: None,
            scores: None,
            competition: String::new(),
            event_labels: Vec::new(),
            is_rwc: false,
            advantage: HomeAdvantage::Home,
            resolution: AdvantageResolution::NotAttempted,
            can_edit_teams: true,
            result: None,
        }
    }

    /// Build a fixture from a provider record.
    ///
    /// Returns `None` when either team is known but missing from the loaded
    /// rankings (e.g. a club or age-grade side). Undecided slots are allowed.
    pub fn from_record(
        record: FixtureRecord,
        rankings: &RankingsSnapshot,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if is_unranked(record.home(), rankings) || is_unranked(record.away(), rankings) {
            return None;
        }

        let home_id = record
            .home()
            .map(|t| t.id.clone())
            .unwrap_or_else(TeamId::undecided);
        let away_id = record
            .away()
            .map(|t| t.id.clone())
            .filter(|id| !id.is_undecided());

        let kickoff = Utc
            .timestamp_millis_opt(record.time.millis)
            .single()
            .unwrap_or(now);
        let status_code = StatusCode::parse(&record.status);
        let status = classify_status(&status_code, kickoff, now, rankings.effective_at);
        let scores = match (record.score(0), record.score(1)) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        };
        let result = resolve_outcome_index(&status_code, record.score(0), record.score(1));
        let is_rwc = is_rwc_record(&record);
        let competition = record.competition.clone().unwrap_or_default();

        Some(Self {
            match_id: record.match_id,
            home_rating_before: rankings.points(&home_id),
            away_rating_before: away_id.as_ref().and_then(|id| rankings.points(id)),
            home_id,
            away_id,
            venue: record.venue.map(Venue::from),
            kickoff: Some(kickoff),
            status_code,
            status: Some(status),
            scores,
            competition,
            event_labels: record.events.into_iter().map(|e| e.label).collect(),
            is_rwc,
            advantage: HomeAdvantage::Home,
            resolution: AdvantageResolution::NotAttempted,
            can_edit_teams: false,
            result,
        })
    }

    pub fn no_home(&self) -> bool {
        self.advantage.no_home()
    }

    pub fn switched(&self) -> bool {
        self.advantage.switched()
    }

    /// Record how the home advantage was determined. Only a successful
    /// resolution changes the flags; anything else leaves the defaults.
    pub fn apply_resolution(&mut self, resolution: AdvantageResolution) {
        if let Some(advantage) = resolution.advantage() {
            self.advantage = advantage;
        }
        self.resolution = resolution;
    }

    /// Change for the home team under each outcome.
    pub fn change_vector(&self) -> ChangeVector {
        compute_changes(
            self.home_rating_before.unwrap_or(f64::NAN),
            self.away_rating_before.unwrap_or(f64::NAN),
            self.advantage,
            self.is_rwc,
        )
    }

    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    /// User override of the result; always wins over the seeded value.
    pub fn set_result(&mut self, result: Option<Outcome>) {
        self.result = result;
    }

    pub fn already_in_rankings(&self) -> bool {
        self.status.is_some_and(|s| s.already_in_rankings())
    }

    /// Both teams are ranked and distinct.
    pub fn has_valid_teams(&self, rankings: &RankingsSnapshot) -> bool {
        match &self.away_id {
            Some(away) => {
                rankings.contains(&self.home_id)
                    && rankings.contains(away)
                    && &self.home_id != away
            }
            None => false,
        }
    }

    pub fn is_valid(&self, rankings: &RankingsSnapshot) -> bool {
        self.has_valid_teams(rankings) && self.result.is_some()
    }

    pub fn active_outcome(&self, rankings: &RankingsSnapshot) -> Option<Outcome> {
        if self.is_valid(rankings) {
            self.result
        } else {
            None
        }
    }

    /// Home team's change for the active outcome, when it can be shown.
    pub fn active_change(&self, rankings: &RankingsSnapshot) -> Option<f64> {
        let outcome = self.active_outcome(rankings)?;
        let change = self.change_vector().get(outcome);
        change.is_finite().then_some(change)
    }
}

fn is_unranked(team: Option<&TeamRecord>, rankings: &RankingsSnapshot) -> bool {
    team.is_some_and(|t| !t.id.is_undecided() && !rankings.contains(&t.id))
}

fn is_rwc_record(record: &FixtureRecord) -> bool {
    let weighted = record
        .events
        .first()
        .and_then(|e| e.rankings_weight)
        .is_some_and(|w| w == RWC_RANKINGS_WEIGHT);
    let named = record
        .competition
        .as_deref()
        .is_some_and(|c| c.contains(RWC_COMPETITION_MARKER));
    weighted || named
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankingEntry, RankingsSource, Team};
    use chrono::Duration;

    fn rankings() -> RankingsSnapshot {
        let entry = |id: &str, name: &str, points: f64, rank: u32| RankingEntry {
            team: Team {
                id: TeamId::from(id),
                name: name.to_string(),
                abbreviation: None,
                country: None,
            },
            points,
            rank,
        };
        RankingsSnapshot::new(
            RankingsSource::Mru,
            vec![
                entry("1", "Ireland", 92.0, 1),
                entry("2", "France", 88.0, 2),
                entry("3", "Fiji", 80.0, 3),
            ],
            "2023-09-04",
            Utc.with_ymd_and_hms(2023, 9, 4, 12, 0, 0).unwrap(),
        )
    }

    fn record(value: serde_json::Value) -> FixtureRecord {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 9, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_record_complete_match() {
        let kickoff = Utc.with_ymd_and_hms(2023, 9, 9, 19, 0, 0).unwrap();
        let rec = record(serde_json::json!({
            "matchId": "m1",
            "teams": [{"id": "2", "name": "France"}, {"id": "3", "name": "Fiji"}],
            "time": {"millis": kickoff.timestamp_millis()},
            "status": "C",
            "scores": [30, 12],
            "events": [{"label": "Rugby World Cup 2023", "rankingsWeight": 2}],
            "competition": "Rugby World Cup 2023"
        }));

        let fixture = Fixture::from_record(rec, &rankings(), now()).unwrap();
        assert_eq!(fixture.home_id, TeamId::from("2"));
        assert_eq!(fixture.scores, Some((30, 12)));
        assert_eq!(fixture.result(), Some(Outcome::HomeWinBig));
        assert!(fixture.is_rwc);
        assert!(!fixture.can_edit_teams);
        assert_eq!(
            fixture.status,
            Some(FixtureStatus::Complete {
                already_in_rankings: false
            })
        );
        assert_eq!(fixture.home_rating_before, Some(88.0));
        assert_eq!(fixture.away_rating_before, Some(80.0));
    }

    #[test]
    fn test_from_record_skips_unranked_team() {
        let rec = record(serde_json::json!({
            "teams": [{"id": "1"}, {"id": "999"}],
            "time": {"millis": now().timestamp_millis()},
            "status": "U"
        }));
        assert!(Fixture::from_record(rec, &rankings(), now()).is_none());
    }

    #[test]
    fn test_from_record_allows_undecided_team() {
        let rec = record(serde_json::json!({
            "teams": [{"id": "1"}, {"id": "0"}],
            "time": {"millis": (now() + Duration::days(2)).timestamp_millis()},
            "status": "U"
        }));
        let fixture = Fixture::from_record(rec, &rankings(), now()).unwrap();
        assert!(fixture.away_id.is_none());
        assert_eq!(fixture.status, Some(FixtureStatus::Upcoming));
        assert!(!fixture.has_valid_teams(&rankings()));
        assert!(!fixture.change_vector().is_displayable());
    }

    #[test]
    fn test_from_record_far_future_kickoff_is_not_counted() {
        let rec = record(serde_json::json!({
            "teams": [{"id": "1"}, {"id": "2"}],
            "time": {"millis": DateTime::<Utc>::MAX_UTC.timestamp_millis()},
            "status": "C",
            "scores": [20, 10]
        }));
        let fixture = Fixture::from_record(rec, &rankings(), now()).unwrap();
        assert!(!fixture.already_in_rankings());
        assert_eq!(fixture.result(), Some(Outcome::HomeWin));
    }

    #[test]
    fn test_rwc_detected_from_competition_name() {
        let rec = record(serde_json::json!({
            "teams": [{"id": "1"}, {"id": "3"}],
            "time": {"millis": 0},
            "status": "U",
            "competition": "Rugby World Cup 2027"
        }));
        assert!(Fixture::from_record(rec, &rankings(), now()).unwrap().is_rwc);
    }

    #[test]
    fn test_resolution_applies_flags_once_resolved() {
        let mut fixture = Fixture::manual(TeamId::from("1"), TeamId::from("2"), &rankings());
        fixture.apply_resolution(AdvantageResolution::Resolved {
            advantage: HomeAdvantage::Switched,
        });
        assert!(fixture.switched());
        assert!(!fixture.no_home());

        let mut failed = Fixture::manual(TeamId::from("1"), TeamId::from("2"), &rankings());
        failed.apply_resolution(AdvantageResolution::Unresolved {
            team: TeamId::from("1"),
            reason: "timeout".to_string(),
        });
        assert_eq!(failed.advantage, HomeAdvantage::Home);
        assert!(!failed.resolution.is_resolved());
    }

    #[test]
    fn test_user_override_takes_precedence() {
        let rankings = rankings();
        let mut fixture = Fixture::manual(TeamId::from("1"), TeamId::from("3"), &rankings);
        assert_eq!(fixture.active_outcome(&rankings), None);

        fixture.set_result(Some(Outcome::AwayWin));
        assert_eq!(fixture.active_outcome(&rankings), Some(Outcome::AwayWin));

        // Ireland 95 effective vs Fiji 80: gap capped at -10
        let change = fixture.active_change(&rankings).unwrap();
        assert!((change - (-2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_same_team_twice_is_invalid() {
        let rankings = rankings();
        let mut fixture = Fixture::manual(TeamId::from("1"), TeamId::from("1"), &rankings);
        fixture.set_result(Some(Outcome::Draw));
        assert!(!fixture.is_valid(&rankings));
        assert_eq!(fixture.active_change(&rankings), None);
    }
}
