//! Data structures: catalog entities, competitors, and the tournament aggregate.

mod common;
mod competitor;
mod game_match;
mod sport;
mod tournament;

pub use common::{
    CompetitorId, Label, MatchGroupId, MatchId, RuleSetId, RulesId, SportId, StageId, Status,
    TournamentId,
};
pub use competitor::Competitor;
pub use game_match::{FeederPolarity, FeederRef, Match, MatchSide, Side};
pub use sport::{RuleSet, Rules, Sport};
pub use tournament::{MatchGroup, Stage, StatusChanges, Tournament};
