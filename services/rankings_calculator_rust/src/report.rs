use chrono::{DateTime, Utc};
use rugby_rankings_core::{
    AdvantageResolution, BatchReport, Fixture, HomeAdvantage, Outcome, ProjectedRanking,
    RankingsSnapshot, TeamId,
};
use serde::Serialize;

const UNDECIDED_LABEL: &str = "TBC";

/// Short team label for table columns.
pub fn team_label(rankings: &RankingsSnapshot, id: Option<&TeamId>) -> String {
    match id {
        Some(id) if !id.is_undecided() => rankings
            .team(id)
            .map(|t| t.display_name().to_string())
            .unwrap_or_else(|| id.to_string()),
        _ => UNDECIDED_LABEL.to_string(),
    }
}

pub fn advantage_label(fixture: &Fixture) -> String {
    let base = match fixture.advantage {
        HomeAdvantage::Home => "home",
        HomeAdvantage::Neutral => "neutral",
        HomeAdvantage::Switched => "switched",
    };
    match &fixture.resolution {
        AdvantageResolution::Exempt => format!("{} (exempt)", base),
        AdvantageResolution::Unresolved { .. } => format!("{} (venue unknown)", base),
        _ => base.to_string(),
    }
}

fn kickoff_label(kickoff: Option<DateTime<Utc>>) -> String {
    kickoff
        .map(|k| k.format("%a %d %b %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One line per fixture: teams, venue, status, advantage, the five changes
/// for the home team and the active outcome.
pub fn format_fixture_row(fixture: &Fixture, rankings: &RankingsSnapshot) -> String {
    let changes = fixture.change_vector();
    let cells: Vec<String> = Outcome::ALL
        .iter()
        .map(|&o| changes.display(o).unwrap_or_else(|| "-".to_string()))
        .collect();

    let venue = fixture
        .venue
        .as_ref()
        .map(|v| v.name_and_country())
        .unwrap_or_else(|| "venue TBC".to_string());
    let status = fixture
        .status
        .map(|s| s.label().to_string())
        .unwrap_or_default();
    let score = fixture
        .scores
        .map(|(h, a)| format!(" {}-{}", h, a))
        .unwrap_or_default();
    let active = fixture
        .active_outcome(rankings)
        .map(|o| o.label())
        .unwrap_or("-");

    format!(
        "{:<16} {:>15} v {:<15} {:<34} {:<12}{:<8} {:<24} | {:>6} {:>6} {:>6} {:>6} {:>6} | {}{}",
        kickoff_label(fixture.kickoff),
        team_label(rankings, Some(&fixture.home_id)),
        team_label(rankings, fixture.away_id.as_ref()),
        venue,
        status,
        score,
        advantage_label(fixture),
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        cells[4],
        active,
        if fixture.already_in_rankings() {
            " (already in rankings)"
        } else {
            ""
        }
    )
}

pub fn format_projection_row(row: &ProjectedRanking) -> String {
    let movement = match row.rank_change() {
        0 => String::new(),
        n if n > 0 => format!("(+{})", n),
        n => format!("({})", n),
    };
    format!(
        "{:>3} {:<5} {:<24} {:>6.2} -> {:>6.2} ({:+.2})",
        row.rank_after,
        movement,
        row.team.name,
        row.points_before,
        row.points_after,
        row.points_change()
    )
}

pub fn format_table(
    rankings: &RankingsSnapshot,
    report: &BatchReport,
    projection: &[ProjectedRanking],
) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} rankings effective {}{}\n\n",
        rankings.source.as_str().to_uppercase(),
        rankings.effective_label,
        if rankings.estimated { " (estimated)" } else { "" }
    ));

    out.push_str(&format!(
        "Fixtures ({} shown, {} skipped, {} venue lookups failed)\n",
        report.fixtures.len(),
        report.skipped,
        report.settled.lookups_failed
    ));
    for fixture in &report.fixtures {
        out.push_str(&format_fixture_row(fixture, rankings));
        out.push('\n');
    }

    out.push_str("\nProjected rankings\n");
    for row in projection {
        out.push_str(&format_projection_row(row));
        out.push('\n');
    }
    out
}

#[derive(Debug, Serialize)]
pub struct FixtureView {
    pub match_id: Option<String>,
    pub home: String,
    pub away: String,
    pub venue: Option<String>,
    pub status: Option<String>,
    pub advantage: HomeAdvantage,
    pub resolution: AdvantageResolution,
    pub changes: [Option<f64>; 5],
    pub active_outcome: Option<Outcome>,
    pub already_in_rankings: bool,
}

impl FixtureView {
    pub fn new(fixture: &Fixture, rankings: &RankingsSnapshot) -> Self {
        let changes = fixture.change_vector().values().map(|v| v.is_finite().then_some(v));
        Self {
            match_id: fixture.match_id.clone(),
            home: team_label(rankings, Some(&fixture.home_id)),
            away: team_label(rankings, fixture.away_id.as_ref()),
            venue: fixture.venue.as_ref().map(|v| v.name_and_country()),
            status: fixture.status.map(|s| s.label().to_string()),
            advantage: fixture.advantage,
            resolution: fixture.resolution.clone(),
            changes,
            active_outcome: fixture.active_outcome(rankings),
            already_in_rankings: fixture.already_in_rankings(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub source: &'a str,
    pub effective: &'a str,
    pub estimated: bool,
    pub skipped: usize,
    pub settled: rugby_rankings_core::BatchSettled,
    pub fixtures: Vec<FixtureView>,
    pub projection: &'a [ProjectedRanking],
}

pub fn format_json(
    rankings: &RankingsSnapshot,
    report: &BatchReport,
    projection: &[ProjectedRanking],
) -> serde_json::Result<String> {
    let view = JsonReport {
        source: rankings.source.as_str(),
        effective: &rankings.effective_label,
        estimated: rankings.estimated,
        skipped: report.skipped,
        settled: report.settled,
        fixtures: report
            .fixtures
            .iter()
            .map(|f| FixtureView::new(f, rankings))
            .collect(),
        projection,
    };
    serde_json::to_string_pretty(&view)
}
