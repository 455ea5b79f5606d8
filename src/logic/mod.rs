//! Engine logic: structural validation and result advancement.

mod advance;
mod validate;

pub use advance::{amend_result, record_interim_score, submit_result, AdvancementOutcome};
pub use validate::{
    validate_mutation, validate_tournament_graph, ProposedChange, StructuralError,
    StructuralErrorKind,
};

use crate::models::MatchId;
use crate::ruleset::RuleSetError;
use crate::store::StoreError;
use uuid::Uuid;

/// Error taxonomy for every engine operation. Validation errors surface the
/// offending entity verbatim; version conflicts are the caller's cue to
/// re-read and retry.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    /// Structural invariant violation.
    Validation(StructuralError),
    /// Caller is not the tournament owner.
    PermissionDenied,
    NotFound(Uuid),
    /// Optimistic-concurrency conflict: the aggregate moved under the caller.
    Conflict { id: Uuid, expected: u64, actual: u64 },
    UnknownMatch(MatchId),
    /// Match preconditions unmet (unresolved sides or not yet Ready).
    NotReady(MatchId),
    /// Match already Completed and no force flag given.
    AlreadyCompleted(MatchId),
    /// Amendment would invalidate a downstream match that has started
    /// (completed or in progress); retry with force.
    DownstreamCompleted(MatchId),
    /// Rejected by the pluggable rule set capability.
    RuleSet(RuleSetError),
    /// Unexpected store failure, propagated unchanged.
    Store(StoreError),
    /// Competitor email already registered.
    DuplicateEmail(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "{e}"),
            EngineError::PermissionDenied => write!(f, "caller is not the tournament owner"),
            EngineError::NotFound(id) => write!(f, "entity {id} not found"),
            EngineError::Conflict { id, expected, actual } => write!(
                f,
                "version conflict on {id}: read {expected}, store has {actual}; re-read and retry"
            ),
            EngineError::UnknownMatch(id) => write!(f, "no such match: {id}"),
            EngineError::NotReady(id) => write!(f, "match {id} is not ready for a result"),
            EngineError::AlreadyCompleted(id) => write!(f, "match {id} is already completed"),
            EngineError::DownstreamCompleted(id) => write!(
                f,
                "downstream match {id} has already started; amend with force to revert it"
            ),
            EngineError::RuleSet(e) => write!(f, "{e}"),
            EngineError::Store(e) => write!(f, "{e}"),
            EngineError::DuplicateEmail(email) => {
                write!(f, "a competitor with email {email} already exists")
            }
        }
    }
}

impl From<StructuralError> for EngineError {
    fn from(e: StructuralError) -> Self {
        EngineError::Validation(e)
    }
}

impl From<RuleSetError> for EngineError {
    fn from(e: RuleSetError) -> Self {
        EngineError::RuleSet(e)
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::VersionConflict { id, expected, actual } => {
                EngineError::Conflict { id, expected, actual }
            }
            other => EngineError::Store(other),
        }
    }
}
