//! Home advantage resolution from venue and team countries.
//!
//! The provider lists a nominal home team but plenty of fixtures are played
//! on neutral ground or at the away team's stadium. Comparing the venue's
//! country with each team's home country tells us which.

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Fixture, TeamId};
use crate::rating_change::HomeAdvantage;
use crate::venue_lookup::CountryLookup;

/// Tournaments ranked as if every match had a home team, regardless of venue.
pub const DEFAULT_VENUE_EXEMPT_PATTERNS: &[&str] = &[r"^202[01] Rugby Championship$"];

/// How a fixture's home advantage was (or wasn't) determined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvantageResolution {
    /// No venue, home team undecided, or entered by hand
    #[default]
    NotAttempted,
    /// Tournament ignores venue location
    Exempt,
    Resolved { advantage: HomeAdvantage },
    /// A country lookup failed; flags were left at their defaults
    Unresolved { team: TeamId, reason: String },
}

impl AdvantageResolution {
    pub fn advantage(&self) -> Option<HomeAdvantage> {
        match self {
            AdvantageResolution::Resolved { advantage } => Some(*advantage),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, AdvantageResolution::Resolved { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AdvantageResolution::Unresolved { .. })
    }
}

/// Which tournaments ignore stadium location.
#[derive(Debug, Clone)]
pub struct VenuePolicy {
    exempt: Vec<Regex>,
}

impl VenuePolicy {
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exempt = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { exempt })
    }

    /// Policy that respects every venue.
    pub fn none() -> Self {
        Self { exempt: Vec::new() }
    }

    /// False when any event label or the competition name matches an
    /// exemption pattern.
    pub fn respects_stadium_location(&self, fixture: &Fixture) -> bool {
        let mut labels = fixture
            .event_labels
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(fixture.competition.as_str()));
        !labels.any(|label| self.exempt.iter().any(|re| re.is_match(label)))
    }
}

impl Default for VenuePolicy {
    fn default() -> Self {
        Self {
            exempt: DEFAULT_VENUE_EXEMPT_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeAdvantageResolver {
    policy: VenuePolicy,
}

impl HomeAdvantageResolver {
    pub fn new(policy: VenuePolicy) -> Self {
        Self { policy }
    }

    /// Whether resolving this fixture will issue any country lookups.
    pub fn needs_lookup(&self, fixture: &Fixture) -> bool {
        self.settled_without_lookup(fixture).is_none()
    }

    fn settled_without_lookup(&self, fixture: &Fixture) -> Option<AdvantageResolution> {
        if fixture.venue.is_none() || fixture.home_id.is_undecided() || fixture.can_edit_teams {
            return Some(AdvantageResolution::NotAttempted);
        }
        if !self.policy.respects_stadium_location(fixture) {
            return Some(AdvantageResolution::Exempt);
        }
        None
    }

    /// Determine where the nominal home team stands.
    ///
    /// The away team is only looked up when the venue isn't in the home
    /// team's country. A failed lookup is reported, never propagated.
    pub async fn resolve<L>(&self, fixture: &Fixture, lookup: &L) -> AdvantageResolution
    where
        L: CountryLookup + ?Sized,
    {
        if let Some(resolution) = self.settled_without_lookup(fixture) {
            return resolution;
        }
        let Some(venue) = fixture.venue.as_ref() else {
            return AdvantageResolution::NotAttempted;
        };

        let home_country = match lookup.country_of(&fixture.home_id).await {
            Ok(country) => country,
            Err(e) => return unresolved(fixture, e.team, e.message),
        };
        if same_country(&venue.country, &home_country) {
            return resolved(fixture, HomeAdvantage::Home);
        }

        let away_id = match fixture.away_id.as_ref().filter(|id| !id.is_undecided()) {
            Some(id) => id,
            None => return resolved(fixture, HomeAdvantage::Neutral),
        };

        match lookup.country_of(away_id).await {
            Ok(away_country) if same_country(&venue.country, &away_country) => {
                resolved(fixture, HomeAdvantage::Switched)
            }
            Ok(_) => resolved(fixture, HomeAdvantage::Neutral),
            Err(e) => unresolved(fixture, e.team, e.message),
        }
    }
}

fn same_country(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

fn resolved(fixture: &Fixture, advantage: HomeAdvantage) -> AdvantageResolution {
    debug!(
        "Fixture {} vs {}: home advantage {:?}",
        fixture.home_id,
        fixture.away_id.as_ref().map(TeamId::as_str).unwrap_or("?"),
        advantage
    );
    AdvantageResolution::Resolved { advantage }
}

fn unresolved(fixture: &Fixture, team: TeamId, reason: String) -> AdvantageResolution {
    warn!(
        "Could not resolve venue for fixture {} (team {}): {}",
        fixture.match_id.as_deref().unwrap_or("-"),
        team,
        reason
    );
    AdvantageResolution::Unresolved { team, reason }
}
