//! Shared value types: entity id aliases, labels, and statuses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a sport.
pub type SportId = Uuid;
/// Unique identifier for a rule set.
pub type RuleSetId = Uuid;
/// Unique identifier for a tournament's configured rules.
pub type RulesId = Uuid;
/// Unique identifier for a competitor.
pub type CompetitorId = Uuid;
/// Unique identifier for a tournament.
pub type TournamentId = Uuid;
/// Unique identifier for a stage.
pub type StageId = Uuid;
/// Unique identifier for a match group.
pub type MatchGroupId = Uuid;
/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Name and optional description, embedded in every named entity.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub description: Option<String>,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn described(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
        }
    }
}

/// Execution status shared by matches, match groups, stages, and the tournament.
///
/// Leaf matches follow `NotReady -> Ready -> InProgress -> Completed`; parent
/// statuses are derived from their children via [`Status::derive`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotReady,
    Ready,
    InProgress,
    Completed,
}

impl Status {
    /// Aggregate status of a collection of children: `Completed` iff all are
    /// Completed; `InProgress` iff any is InProgress; else `Ready` iff any is
    /// Ready; else `NotReady`. An empty collection is `NotReady`.
    pub fn derive<I>(children: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let mut seen_any = false;
        let mut all_completed = true;
        let mut any_in_progress = false;
        let mut any_ready = false;
        for status in children {
            seen_any = true;
            match status {
                Status::Completed => {}
                Status::InProgress => {
                    any_in_progress = true;
                    all_completed = false;
                }
                Status::Ready => {
                    any_ready = true;
                    all_completed = false;
                }
                Status::NotReady => all_completed = false,
            }
        }
        if !seen_any {
            Status::NotReady
        } else if all_completed {
            Status::Completed
        } else if any_in_progress {
            Status::InProgress
        } else if any_ready {
            Status::Ready
        } else {
            Status::NotReady
        }
    }
}
