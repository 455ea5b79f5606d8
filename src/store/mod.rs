//! Entity store contract: get, query, put-with-version, delete.
//!
//! The engine issues no direct I/O; everything routes through this trait. A
//! remote implementation may fail at any call, and the engine treats any store
//! failure as fatal to the current operation (retry belongs to the caller).

mod memory;

pub use memory::MemoryStore;

use crate::models::{Competitor, RuleSet, Sport, Tournament};
use uuid::Uuid;

/// The entity types the store knows about. Stages, match groups, matches, and
/// Rules live inside the [`Tournament`] aggregate and are not stored separately.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Sport,
    RuleSet,
    Competitor,
    Tournament,
}

/// A stored entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    Sport(Sport),
    RuleSet(RuleSet),
    Competitor(Competitor),
    Tournament(Tournament),
}

impl Entity {
    pub fn id(&self) -> Uuid {
        match self {
            Entity::Sport(s) => s.id,
            Entity::RuleSet(r) => r.id,
            Entity::Competitor(c) => c.id,
            Entity::Tournament(t) => t.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Sport(_) => EntityKind::Sport,
            Entity::RuleSet(_) => EntityKind::RuleSet,
            Entity::Competitor(_) => EntityKind::Competitor,
            Entity::Tournament(_) => EntityKind::Tournament,
        }
    }
}

/// Query filters. Kept as a closed enum so stores can translate them to
/// whatever their backend supports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Filter {
    All,
    /// Competitors with this email (case-insensitive).
    CompetitorEmail(String),
    /// Tournaments owned by this identity.
    TournamentsByOwner(String),
}

/// What to do with dependents on delete.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CascadePolicy {
    /// Refuse to delete an entity that is still referenced.
    Restrict,
    /// Delete or detach dependents along with the entity.
    Cascade,
}

/// Errors surfaced by the entity store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    NotFound(Uuid),
    /// Write rejected because the caller read a stale version.
    VersionConflict { id: Uuid, expected: u64, actual: u64 },
    /// Delete rejected under `Restrict` because dependents exist.
    StillReferenced(Uuid),
    /// Backend failure (lock poisoning, transport, ...).
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "entity {id} not found"),
            StoreError::VersionConflict { id, expected, actual } => write!(
                f,
                "stale write on {id}: expected version {expected}, store has {actual}"
            ),
            StoreError::StillReferenced(id) => {
                write!(f, "entity {id} is still referenced and cannot be deleted")
            }
            StoreError::Backend(msg) => write!(f, "store backend error: {msg}"),
        }
    }
}

/// Durable storage for all entities. `put` with an expected version implements
/// optimistic concurrency: the write is rejected if the stored version moved.
pub trait EntityStore {
    fn get(&self, kind: EntityKind, id: Uuid) -> Result<Entity, StoreError>;

    fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<Entity>, StoreError>;

    /// Persist an entity. `expected_version: None` writes unconditionally
    /// (creates included); `Some(v)` requires the stored version to equal `v`.
    /// Returns the new version.
    fn put(&self, entity: Entity, expected_version: Option<u64>) -> Result<u64, StoreError>;

    fn delete(&self, id: Uuid, cascade: CascadePolicy) -> Result<(), StoreError>;

    fn get_sport(&self, id: Uuid) -> Result<Sport, StoreError> {
        match self.get(EntityKind::Sport, id)? {
            Entity::Sport(s) => Ok(s),
            _ => Err(StoreError::Backend(format!("entity {id} is not a sport"))),
        }
    }

    fn get_ruleset(&self, id: Uuid) -> Result<RuleSet, StoreError> {
        match self.get(EntityKind::RuleSet, id)? {
            Entity::RuleSet(r) => Ok(r),
            _ => Err(StoreError::Backend(format!("entity {id} is not a rule set"))),
        }
    }

    fn get_competitor(&self, id: Uuid) -> Result<Competitor, StoreError> {
        match self.get(EntityKind::Competitor, id)? {
            Entity::Competitor(c) => Ok(c),
            _ => Err(StoreError::Backend(format!("entity {id} is not a competitor"))),
        }
    }

    fn get_tournament(&self, id: Uuid) -> Result<Tournament, StoreError> {
        match self.get(EntityKind::Tournament, id)? {
            Entity::Tournament(t) => Ok(t),
            _ => Err(StoreError::Backend(format!("entity {id} is not a tournament"))),
        }
    }
}
