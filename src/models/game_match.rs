//! Match, sides, and feeder references.

use crate::models::common::{CompetitorId, MatchId, Status};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Red,
    Blue,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }
}

/// Whether the feeder's winner or loser fills the slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeederPolarity {
    WinnerAdvances,
    LoserAdvances,
}

/// Reference to an earlier match whose outcome fills a slot. Plain id, not a
/// live pointer; resolved against the tournament aggregate on demand.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeederRef {
    pub match_id: MatchId,
    pub polarity: FeederPolarity,
}

/// One side of a match (red or blue).
///
/// `competitor` and `feeder` are mutually exclusive: a side is either seeded
/// directly or wired to an upstream match. `advanced` holds the occupant the
/// feeder delivered once it completed, and is cleared if that result is
/// reverted.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSide {
    pub competitor: Option<CompetitorId>,
    pub feeder: Option<FeederRef>,
    pub advanced: Option<CompetitorId>,
    pub score: Option<u32>,
}

impl MatchSide {
    /// A side seeded directly with a known competitor.
    pub fn seeded(competitor: CompetitorId) -> Self {
        Self {
            competitor: Some(competitor),
            ..Self::default()
        }
    }

    /// A side filled by the outcome of an earlier match.
    pub fn fed(match_id: MatchId, polarity: FeederPolarity) -> Self {
        Self {
            feeder: Some(FeederRef { match_id, polarity }),
            ..Self::default()
        }
    }

    /// A side not yet wired (legal only before the bracket is fully wired).
    pub fn open() -> Self {
        Self::default()
    }

    /// The competitor occupying this side, if known yet.
    pub fn resolved(&self) -> Option<CompetitorId> {
        self.competitor.or(self.advanced)
    }
}

/// A single match between a red and a blue side.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Execution order within the owning match group.
    pub ordinality: u32,
    pub red: MatchSide,
    pub blue: MatchSide,
    pub status: Status,
    /// Set when Completed; `None` with status Completed encodes a draw.
    pub winner: Option<Side>,
}

impl Match {
    pub fn new(ordinality: u32, red: MatchSide, blue: MatchSide) -> Self {
        let mut m = Self {
            id: Uuid::new_v4(),
            ordinality,
            red,
            blue,
            status: Status::NotReady,
            winner: None,
        };
        m.refresh_readiness();
        m
    }

    pub fn side(&self, side: Side) -> &MatchSide {
        match side {
            Side::Red => &self.red,
            Side::Blue => &self.blue,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut MatchSide {
        match side {
            Side::Red => &mut self.red,
            Side::Blue => &mut self.blue,
        }
    }

    pub fn both_resolved(&self) -> bool {
        self.red.resolved().is_some() && self.blue.resolved().is_some()
    }

    /// Recompute NotReady/Ready from slot resolution. InProgress and Completed
    /// are left alone. Returns true if the match just became Ready.
    pub fn refresh_readiness(&mut self) -> bool {
        match self.status {
            Status::NotReady | Status::Ready => {
                let next = if self.both_resolved() {
                    Status::Ready
                } else {
                    Status::NotReady
                };
                let became_ready = next == Status::Ready && self.status != Status::Ready;
                self.status = next;
                became_ready
            }
            _ => false,
        }
    }

    /// The competitor a feeder edge of the given polarity would deliver from
    /// this match's outcome. `None` while unplayed or drawn.
    pub fn outcome_competitor(&self, polarity: FeederPolarity) -> Option<CompetitorId> {
        let winner = self.winner?;
        let side = match polarity {
            FeederPolarity::WinnerAdvances => winner,
            FeederPolarity::LoserAdvances => winner.other(),
        };
        self.side(side).resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_match_starts_ready() {
        let m = Match::new(0, MatchSide::seeded(Uuid::new_v4()), MatchSide::seeded(Uuid::new_v4()));
        assert_eq!(m.status, Status::Ready);
    }

    #[test]
    fn fed_match_starts_not_ready() {
        let m = Match::new(
            0,
            MatchSide::fed(Uuid::new_v4(), FeederPolarity::WinnerAdvances),
            MatchSide::seeded(Uuid::new_v4()),
        );
        assert_eq!(m.status, Status::NotReady);
    }

    #[test]
    fn outcome_competitor_respects_polarity() {
        let red = Uuid::new_v4();
        let blue = Uuid::new_v4();
        let mut m = Match::new(0, MatchSide::seeded(red), MatchSide::seeded(blue));
        m.winner = Some(Side::Red);
        m.status = Status::Completed;
        assert_eq!(m.outcome_competitor(FeederPolarity::WinnerAdvances), Some(red));
        assert_eq!(m.outcome_competitor(FeederPolarity::LoserAdvances), Some(blue));
    }
}
