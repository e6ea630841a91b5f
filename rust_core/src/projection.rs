//! Projected ranking table after applying fixture results.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Fixture, RankingsSnapshot, Team, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRanking {
    pub team: Team,
    pub points_before: f64,
    pub points_after: f64,
    pub rank_before: u32,
    pub rank_after: u32,
}

impl ProjectedRanking {
    pub fn points_change(&self) -> f64 {
        self.points_after - self.points_before
    }

    /// Positive when the team moved up the table.
    pub fn rank_change(&self) -> i64 {
        i64::from(self.rank_before) - i64::from(self.rank_after)
    }
}

/// Apply each fixture's active change to the table.
///
/// Results already folded into the snapshot are skipped, as are fixtures
/// without a valid outcome or with a change that can't be computed.
pub fn project_rankings(rankings: &RankingsSnapshot, fixtures: &[Fixture]) -> Vec<ProjectedRanking> {
    let mut deltas: HashMap<&TeamId, f64> = HashMap::new();

    for fixture in fixtures {
        if fixture.already_in_rankings() {
            continue;
        }
        let (Some(change), Some(away_id)) = (fixture.active_change(rankings), fixture.away_id.as_ref())
        else {
            continue;
        };
        *deltas.entry(&fixture.home_id).or_default() += change;
        *deltas.entry(away_id).or_default() -= change;
    }

    let mut projected: Vec<ProjectedRanking> = rankings
        .entries
        .iter()
        .map(|entry| ProjectedRanking {
            team: entry.team.clone(),
            points_before: entry.points,
            points_after: entry.points + deltas.get(&entry.team.id).copied().unwrap_or(0.0),
            rank_before: entry.rank,
            rank_after: entry.rank,
        })
        .collect();

    // Stable, so equal points keep the existing order
    projected.sort_by(|a, b| b.points_after.total_cmp(&a.points_after));
    for (i, row) in projected.iter_mut().enumerate() {
        row.rank_after = i as u32 + 1;
    }
    projected
}
