//! Tournament bracket engine: structural validation and result propagation
//! over a feeder dependency graph.
//!
//! A tournament is an aggregate of stages, match groups, and matches whose
//! participants may depend on earlier matches ("feeders", as in
//! single-elimination brackets). This crate keeps that graph consistent as
//! results come in: the [`logic`] module validates structure and runs the
//! propagation cascade, [`bracket`] builds initial skeletons, and
//! [`service::TournamentService`] adds permission checks and optimistic
//! concurrency over a pluggable [`store::EntityStore`].

pub mod bracket;
pub mod events;
pub mod logic;
pub mod models;
pub mod ruleset;
pub mod service;
pub mod store;

pub use bracket::{
    instantiate_skeleton, single_elimination, BracketSkeleton, GroupSkeleton, MatchSkeleton,
    SkeletonRef, SlotSkeleton, StageSkeleton,
};
pub use events::{Event, EventEmitter, EventKind, LogEmitter, NullEmitter};
pub use logic::{
    amend_result, record_interim_score, submit_result, validate_mutation,
    validate_tournament_graph, AdvancementOutcome, EngineError, ProposedChange, StructuralError,
    StructuralErrorKind,
};
pub use models::{
    Competitor, CompetitorId, FeederPolarity, FeederRef, Label, Match, MatchGroup, MatchGroupId,
    MatchId, MatchSide, RuleSet, RuleSetId, Rules, RulesId, Side, Sport, SportId, Stage, StageId,
    Status, StatusChanges, Tournament, TournamentId,
};
pub use ruleset::{Outcome, RuleSetCapability, RuleSetError, RuleSetRegistry, StandardScoring};
pub use service::TournamentService;
pub use store::{CascadePolicy, Entity, EntityKind, EntityStore, Filter, MemoryStore, StoreError};
