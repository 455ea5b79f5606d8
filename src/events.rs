//! State-change events produced by the advancement engine.
//!
//! Events are collected during the cascade and handed to the emitter only
//! after the store write commits, so consumers never observe a half-applied
//! cascade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MatchReady,
    MatchCompleted,
    MatchReverted,
    StageCompleted,
    TournamentCompleted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub tournament_id: Uuid,
    /// The match, stage, or tournament the event is about.
    pub entity_id: Uuid,
    pub at: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind, tournament_id: Uuid, entity_id: Uuid) -> Self {
        Self {
            kind,
            tournament_id,
            entity_id,
            at: Utc::now(),
        }
    }
}

/// Consumes state-change notifications the engine produces.
pub trait EventEmitter {
    fn emit(&self, event: &Event);
}

/// Routes events to the `log` facade. Reverts are warnings, the rest info.
pub struct LogEmitter;

impl EventEmitter for LogEmitter {
    fn emit(&self, event: &Event) {
        match event.kind {
            EventKind::MatchReverted => log::warn!(
                "match {} reverted (tournament {})",
                event.entity_id,
                event.tournament_id
            ),
            kind => log::info!(
                "{:?}: {} (tournament {})",
                kind,
                event.entity_id,
                event.tournament_id
            ),
        }
    }
}

/// Drops all events.
pub struct NullEmitter;

impl EventEmitter for NullEmitter {
    fn emit(&self, _event: &Event) {}
}
