//! Ranking point-change calculation.
//!
//! Every outcome's change is the same affine function of one capped rating
//! gap, so the five values for a fixture always fall in order from the best
//! home result to the worst.

use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;

/// Rating bonus the home team gets for playing at home.
pub const HOME_ADVANTAGE_POINTS: f64 = 3.0;

/// Rating gap beyond which results no longer move more points.
pub const MAX_RATING_GAP: f64 = 10.0;

/// Multiplier for big-margin results.
pub const BIG_WIN_FACTOR: f64 = 1.5;

/// Multiplier for World Cup fixtures.
pub const RWC_WEIGHT: f64 = 2.0;

/// Where the nominal home team actually stands with respect to the venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeAdvantage {
    /// Nominal home team is at home
    #[default]
    Home,
    /// Venue belongs to neither team (`noHome`)
    Neutral,
    /// Venue is the away team's home ground (`switched`)
    Switched,
}

impl HomeAdvantage {
    /// Build from the two provider-style flags. `no_home` wins if both are set.
    pub fn from_flags(no_home: bool, switched: bool) -> Self {
        match (no_home, switched) {
            (true, _) => HomeAdvantage::Neutral,
            (false, true) => HomeAdvantage::Switched,
            (false, false) => HomeAdvantage::Home,
        }
    }

    pub fn no_home(self) -> bool {
        self == HomeAdvantage::Neutral
    }

    pub fn switched(self) -> bool {
        self == HomeAdvantage::Switched
    }

    /// Adjustment applied to the nominal home team's rating.
    pub fn rating_adjustment(self) -> f64 {
        match self {
            HomeAdvantage::Home => HOME_ADVANTAGE_POINTS,
            HomeAdvantage::Neutral => 0.0,
            HomeAdvantage::Switched => -HOME_ADVANTAGE_POINTS,
        }
    }
}

/// Point change for the home team under each outcome, indexed by
/// `Outcome::index()`. The away team moves by the negation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeVector([f64; 5]);

impl ChangeVector {
    pub fn nan() -> Self {
        Self([f64::NAN; 5])
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        self.0[outcome.index()]
    }

    pub fn values(&self) -> [f64; 5] {
        self.0
    }

    pub fn is_displayable(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Formatted change for one outcome, or `None` when it can't be shown.
    pub fn display(&self, outcome: Outcome) -> Option<String> {
        format_change(self.get(outcome))
    }
}

/// Compute the five possible point changes for a fixture.
///
/// Non-finite ratings yield an all-NaN vector rather than an error.
pub fn compute_changes(
    home_rating_before: f64,
    away_rating_before: f64,
    advantage: HomeAdvantage,
    is_rwc: bool,
) -> ChangeVector {
    if !home_rating_before.is_finite() || !away_rating_before.is_finite() {
        return ChangeVector::nan();
    }

    let effective_home = home_rating_before + advantage.rating_adjustment();

    // Positive when the away side is rated higher, i.e. a home loss is expected.
    let ranking_diff = away_rating_before - effective_home;
    let capped_diff = ranking_diff.clamp(-MAX_RATING_GAP, MAX_RATING_GAP);

    // A draw moves one tenth of the capped gap, never more than a point.
    let draw_change = capped_diff / MAX_RATING_GAP;

    let mult = if is_rwc { RWC_WEIGHT } else { 1.0 };
    ChangeVector([
        mult * BIG_WIN_FACTOR * (draw_change + 1.0),
        mult * (draw_change + 1.0),
        mult * draw_change,
        mult * (draw_change - 1.0),
        mult * BIG_WIN_FACTOR * (draw_change - 1.0),
    ])
}

/// Format a change the way the fixture table shows it: two decimals, with
/// `<` before gains for the home team and `>` after losses.
pub fn format_change(change: f64) -> Option<String> {
    if change.is_nan() {
        return None;
    }
    let prefix = if change > 0.0 { "<" } else { "" };
    let suffix = if change < 0.0 { ">" } else { "" };
    Some(format!("{}{:.2}{}", prefix, change.abs(), suffix))
}
