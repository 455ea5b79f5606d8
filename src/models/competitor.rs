//! Competitor data structure.

use crate::models::common::{CompetitorId, TournamentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A human competitor. Can participate in multiple tournaments.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    /// Unique across the whole system (enforced at registration).
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// For example a club or federation name.
    pub affiliation: Option<String>,
    /// Tournaments the competitor is entered in.
    pub tournament_ids: Vec<TournamentId>,
}

impl Competitor {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            affiliation: None,
            tournament_ids: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
