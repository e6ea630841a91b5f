//! Match outcome bands and score → outcome resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::status::StatusCode;

/// Winning margin at which a win counts as "big" (1.5x the change).
pub const BIG_WIN_MARGIN: i32 = 16;

/// The five result bands the ranking formula distinguishes, ordered from
/// best to worst for the home team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HomeWinBig = 0,
    HomeWin = 1,
    Draw = 2,
    AwayWin = 3,
    AwayWinBig = 4,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::HomeWinBig,
        Outcome::HomeWin,
        Outcome::Draw,
        Outcome::AwayWin,
        Outcome::AwayWinBig,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::HomeWinBig => "Home win by 16+",
            Outcome::HomeWin => "Home win by 1-15",
            Outcome::Draw => "Draw",
            Outcome::AwayWin => "Away win by 1-15",
            Outcome::AwayWinBig => "Away win by 16+",
        }
    }

    /// Band for a score difference (home minus away).
    pub fn from_margin(diff: i32) -> Self {
        if diff >= BIG_WIN_MARGIN {
            Outcome::HomeWinBig
        } else if diff > 0 {
            Outcome::HomeWin
        } else if diff == 0 {
            Outcome::Draw
        } else if diff > -BIG_WIN_MARGIN {
            Outcome::AwayWin
        } else {
            Outcome::AwayWinBig
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Seed an outcome from the provider's live or final score.
///
/// Returns `None` for matches that have not started (or were postponed,
/// cancelled or carry an unknown code) and when either score is missing.
pub fn resolve_outcome_index(
    status: &StatusCode,
    score_home: Option<i32>,
    score_away: Option<i32>,
) -> Option<Outcome> {
    if !status.has_score() {
        return None;
    }
    let (home, away) = (score_home?, score_away?);
    Some(Outcome::from_margin(home.saturating_sub(away)))
}
