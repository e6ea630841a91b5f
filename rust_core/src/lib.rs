//! Rugby Rankings Core - ranking point changes and fixture home advantage.
//!
//! This module provides:
//! - Point-change calculation for the five result bands of a fixture
//! - Outcome seeding from live and final scores
//! - Fixture lifecycle classification against the rankings' effective date
//! - Home advantage resolution from venue and team countries
//! - Batch processing with deduplicated lookups and a single settled event
//! - Projected ranking tables
//! - An HTTP client for the rankings provider

pub mod error;
pub mod models;

pub mod outcome;
pub mod rating_change;
pub mod status;

pub mod coordinator;
pub mod home_advantage;
pub mod projection;
pub mod venue_lookup;

pub mod clients;

pub use coordinator::{BatchReport, BatchSettled, FixtureBatchCoordinator, LookupGuard, LookupTracker};
pub use error::{LookupError, RankingError, Result};
pub use home_advantage::{AdvantageResolution, HomeAdvantageResolver, VenuePolicy};
pub use models::{Fixture, RankingsSnapshot, RankingsSource, Team, TeamId, Venue};
pub use outcome::{resolve_outcome_index, Outcome};
pub use projection::{project_rankings, ProjectedRanking};
pub use rating_change::{compute_changes, format_change, ChangeVector, HomeAdvantage};
pub use status::{classify_status, FixtureStatus, StatusCode};
pub use venue_lookup::{CountryLookup, TeamSource, VenueLookupCache};
