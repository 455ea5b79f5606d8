//! Pluggable rule set capability: score validation, outcome determination, and
//! bracket construction.

use crate::bracket::{self, BracketSkeleton};
use crate::models::{CompetitorId, RuleSetId, Side};
use serde_json::Value;
use std::collections::HashMap;

/// Result of a match as determined by a rule set.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Winner(Side),
    Draw,
}

/// Errors produced by a rule set capability.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RuleSetError {
    /// Scores rejected by the rule set.
    InvalidScore(String),
    /// A draw outcome on a match that feeds a later match.
    DrawNotPermitted,
    /// The rule set cannot build a bracket for this many competitors.
    UnsupportedFieldSize(usize),
    /// A skeleton slot references a match position that does not exist.
    MalformedSkeleton,
    /// Malformed rule parameters.
    BadParams(String),
    /// No capability registered for this rule set id.
    UnknownRuleSet(RuleSetId),
}

impl std::fmt::Display for RuleSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSetError::InvalidScore(msg) => write!(f, "invalid score: {msg}"),
            RuleSetError::DrawNotPermitted => {
                write!(f, "draw not permitted on a match that feeds a later match")
            }
            RuleSetError::UnsupportedFieldSize(n) => {
                write!(f, "cannot build a bracket for {n} competitor(s)")
            }
            RuleSetError::MalformedSkeleton => {
                write!(f, "bracket skeleton references a match position that does not exist")
            }
            RuleSetError::BadParams(msg) => write!(f, "bad rule parameters: {msg}"),
            RuleSetError::UnknownRuleSet(id) => write!(f, "no capability registered for rule set {id}"),
        }
    }
}

/// The pluggable policy a rule set supplies: how scores are judged, who wins,
/// and what the initial bracket looks like. The engine treats this as opaque.
pub trait RuleSetCapability: Send + Sync {
    /// Check scores before any outcome is computed.
    fn validate_scores(&self, red: u32, blue: u32, params: &Value) -> Result<(), RuleSetError>;

    /// Decide the winner (or a draw, if the rule set permits it).
    fn determine_outcome(&self, red: u32, blue: u32, params: &Value) -> Result<Outcome, RuleSetError>;

    /// Produce the initial match/feeder skeleton for a field of competitors,
    /// given in seed order.
    fn build_bracket(
        &self,
        competitors: &[CompetitorId],
        params: &Value,
    ) -> Result<BracketSkeleton, RuleSetError>;
}

/// Registered capabilities, keyed by rule set id.
#[derive(Default)]
pub struct RuleSetRegistry {
    capabilities: HashMap<RuleSetId, Box<dyn RuleSetCapability>>,
}

impl RuleSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: RuleSetId, capability: Box<dyn RuleSetCapability>) {
        self.capabilities.insert(id, capability);
    }

    pub fn get(&self, id: RuleSetId) -> Result<&dyn RuleSetCapability, RuleSetError> {
        self.capabilities
            .get(&id)
            .map(|c| c.as_ref())
            .ok_or(RuleSetError::UnknownRuleSet(id))
    }
}

/// Shipped rule set: plain score comparison, single-elimination brackets.
///
/// Recognized params: `"max_score"` (u64, reject scores above it),
/// `"allow_draw"` (bool, tied scores become [`Outcome::Draw`] instead of an
/// error), `"seeding"` (`"random"` shuffles the field instead of using the
/// given seed order).
pub struct StandardScoring;

impl RuleSetCapability for StandardScoring {
    fn validate_scores(&self, red: u32, blue: u32, params: &Value) -> Result<(), RuleSetError> {
        if let Some(max) = params.get("max_score").and_then(Value::as_u64) {
            if u64::from(red) > max || u64::from(blue) > max {
                return Err(RuleSetError::InvalidScore(format!(
                    "score above maximum {max}"
                )));
            }
        }
        Ok(())
    }

    fn determine_outcome(&self, red: u32, blue: u32, params: &Value) -> Result<Outcome, RuleSetError> {
        self.validate_scores(red, blue, params)?;
        match red.cmp(&blue) {
            std::cmp::Ordering::Greater => Ok(Outcome::Winner(Side::Red)),
            std::cmp::Ordering::Less => Ok(Outcome::Winner(Side::Blue)),
            std::cmp::Ordering::Equal => {
                if params.get("allow_draw").and_then(Value::as_bool).unwrap_or(false) {
                    Ok(Outcome::Draw)
                } else {
                    Err(RuleSetError::InvalidScore(format!(
                        "tied score {red}-{blue} is not allowed"
                    )))
                }
            }
        }
    }

    fn build_bracket(
        &self,
        competitors: &[CompetitorId],
        params: &Value,
    ) -> Result<BracketSkeleton, RuleSetError> {
        bracket::single_elimination(competitors, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn higher_score_wins() {
        let params = json!({});
        assert_eq!(
            StandardScoring.determine_outcome(10, 5, &params),
            Ok(Outcome::Winner(Side::Red))
        );
        assert_eq!(
            StandardScoring.determine_outcome(3, 9, &params),
            Ok(Outcome::Winner(Side::Blue))
        );
    }

    #[test]
    fn tie_is_error_unless_draws_allowed() {
        assert!(matches!(
            StandardScoring.determine_outcome(7, 7, &json!({})),
            Err(RuleSetError::InvalidScore(_))
        ));
        assert_eq!(
            StandardScoring.determine_outcome(7, 7, &json!({"allow_draw": true})),
            Ok(Outcome::Draw)
        );
    }

    #[test]
    fn max_score_is_enforced() {
        assert!(matches!(
            StandardScoring.validate_scores(16, 2, &json!({"max_score": 15})),
            Err(RuleSetError::InvalidScore(_))
        ));
        assert_eq!(
            StandardScoring.validate_scores(15, 2, &json!({"max_score": 15})),
            Ok(())
        );
    }

    #[test]
    fn registry_rejects_unknown_ruleset() {
        let registry = RuleSetRegistry::new();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(
            registry.get(id),
            Err(RuleSetError::UnknownRuleSet(_))
        ));
    }
}
