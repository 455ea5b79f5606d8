//! Tournament aggregate: stages, match groups, and matches.

use crate::models::common::{
    CompetitorId, Label, MatchGroupId, MatchId, SportId, StageId, Status, TournamentId,
};
use crate::models::game_match::{FeederPolarity, Match, Side};
use crate::models::sport::Rules;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stage of the tournament, e.g. "pools", "elims", "finals".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub label: Label,
    /// Execution order within the tournament.
    pub ordinality: u32,
    pub status: Status,
    pub groups: Vec<MatchGroup>,
}

impl Stage {
    pub fn new(label: Label, ordinality: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            ordinality,
            status: Status::NotReady,
            groups: Vec::new(),
        }
    }
}

/// A group of matches within a stage, e.g. "pool 1" or "round of 16".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub id: MatchGroupId,
    pub label: Label,
    /// Execution order within the stage.
    pub ordinality: u32,
    pub status: Status,
    pub matches: Vec<Match>,
}

impl MatchGroup {
    pub fn new(label: Label, ordinality: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            ordinality,
            status: Status::NotReady,
            matches: Vec::new(),
        }
    }
}

/// Status transitions surfaced by a recompute pass, for event emission.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusChanges {
    /// Stages that moved into Completed during this pass.
    pub completed_stages: Vec<StageId>,
    /// Whether the tournament as a whole moved into Completed.
    pub tournament_completed: bool,
}

/// The full tournament aggregate: sport reference, roster, rules, and the
/// stage/group/match hierarchy. Feeder references between matches are plain
/// ids resolved through the aggregate, never live pointers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub label: Label,
    /// Opaque owner identity from the authentication boundary. Only the owner
    /// may alter the tournament.
    pub owner: String,
    pub sport_id: SportId,
    /// Competitors entered in the tournament.
    pub competitor_ids: Vec<CompetitorId>,
    /// Exactly-one configured rules, owned inline (cascade delete for free).
    pub rules: Rules,
    /// Stages in execution order.
    pub stages: Vec<Stage>,
    /// Derived from stage statuses; never set directly.
    pub status: Status,
    /// Optimistic concurrency counter, bumped by the entity store on every
    /// accepted write.
    pub version: u64,
}

impl Tournament {
    pub fn new(
        owner: impl Into<String>,
        label: Label,
        sport_id: SportId,
        rules: Rules,
        competitor_ids: Vec<CompetitorId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            owner: owner.into(),
            sport_id,
            competitor_ids,
            rules,
            stages: Vec::new(),
            status: Status::NotReady,
            version: 0,
        }
    }

    /// All matches in the tournament, in stage/group order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.stages
            .iter()
            .flat_map(|s| s.groups.iter())
            .flat_map(|g| g.matches.iter())
    }

    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches().find(|m| m.id == id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.stages
            .iter_mut()
            .flat_map(|s| s.groups.iter_mut())
            .flat_map(|g| g.matches.iter_mut())
            .find(|m| m.id == id)
    }

    /// Downstream edges: every (match, side, polarity) whose feeder points at
    /// the given match.
    pub fn fed_by(&self, id: MatchId) -> Vec<(MatchId, Side, FeederPolarity)> {
        let mut edges = Vec::new();
        for m in self.matches() {
            for side in [Side::Red, Side::Blue] {
                if let Some(feeder) = m.side(side).feeder {
                    if feeder.match_id == id {
                        edges.push((m.id, side, feeder.polarity));
                    }
                }
            }
        }
        edges
    }

    pub fn has_completed_match(&self) -> bool {
        self.matches().any(|m| m.status == Status::Completed)
    }

    /// Recompute group, stage, and tournament statuses bottom-up from match
    /// statuses. Returns which stages (and whether the tournament) newly
    /// completed, so the caller can emit events.
    pub fn recompute_statuses(&mut self) -> StatusChanges {
        let mut changes = StatusChanges::default();
        for stage in &mut self.stages {
            for group in &mut stage.groups {
                group.status = Status::derive(group.matches.iter().map(|m| m.status));
            }
            let next = Status::derive(stage.groups.iter().map(|g| g.status));
            if next == Status::Completed && stage.status != Status::Completed {
                changes.completed_stages.push(stage.id);
            }
            stage.status = next;
        }
        let next = Status::derive(self.stages.iter().map(|s| s.status));
        if next == Status::Completed && self.status != Status::Completed {
            changes.tournament_completed = true;
        }
        self.status = next;
        changes
    }
}
