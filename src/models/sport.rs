//! Catalog entities: sports, rule sets, and per-tournament Rules.

use crate::models::common::{Label, RuleSetId, RulesId, SportId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A sport, together with the rule sets that may be used with it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: SportId,
    pub label: Label,
    /// Rule sets applicable to this sport (many-to-many with [`RuleSet`]).
    pub ruleset_ids: Vec<RuleSetId>,
}

impl Sport {
    pub fn new(label: Label, ruleset_ids: Vec<RuleSetId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            ruleset_ids,
        }
    }

    pub fn allows_ruleset(&self, ruleset_id: RuleSetId) -> bool {
        self.ruleset_ids.contains(&ruleset_id)
    }
}

/// A named rule set competitors can choose for a tournament. The scoring and
/// bracket-construction behavior lives in the registered
/// [`RuleSetCapability`](crate::ruleset::RuleSetCapability), not here.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub label: Label,
    /// Sports this rule set applies to (back side of the many-to-many).
    pub sport_ids: Vec<SportId>,
}

impl RuleSet {
    pub fn new(label: Label, sport_ids: Vec<SportId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            sport_ids,
        }
    }
}

/// A rule set plus configured parameters, owned by exactly one tournament.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub id: RulesId,
    pub ruleset_id: RuleSetId,
    /// Opaque configuration handed to the rule set capability.
    pub params: Value,
}

impl Rules {
    pub fn new(ruleset_id: RuleSetId, params: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            ruleset_id,
            params,
        }
    }
}
