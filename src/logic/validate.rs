//! Structural validation of the tournament graph.
//!
//! Read-only and idempotent: repeated calls on an unmodified graph return
//! identical results, and violations are surfaced verbatim, never corrected.

use crate::models::{MatchId, Side, Sport, Tournament};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StructuralErrorKind {
    /// Two siblings share an ordinality.
    DuplicateOrdinality,
    /// A match side has both a direct competitor and a feeder.
    CompetitorAndFeeder,
    /// A side carries an advanced occupant without a feeder to deliver it.
    AdvancedWithoutFeeder,
    /// A feeder points at a match outside this tournament.
    UnknownFeeder,
    /// The feeder relation contains a cycle.
    FeederCycle,
    /// A match is fed by a match that is not ordered before it.
    FeederOrderViolation,
    /// The tournament's rules use a rule set its sport does not allow.
    RuleSetNotApplicable,
    /// A match references a competitor not entered in the tournament.
    UnknownCompetitor,
    /// Ordinality edits are locked once any match has completed.
    OrdinalityLocked,
    /// Score mutation on a match whose sides are not both resolved.
    UnresolvedSides,
    /// The mutation targets a match that does not exist.
    UnknownMatch,
}

/// A structural invariant violation, carrying the offending entity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    pub entity_id: Uuid,
}

impl StructuralError {
    fn new(kind: StructuralErrorKind, entity_id: Uuid) -> Self {
        Self { kind, entity_id }
    }
}

impl std::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self.kind {
            StructuralErrorKind::DuplicateOrdinality => "duplicate ordinality among siblings",
            StructuralErrorKind::CompetitorAndFeeder => {
                "match side has both a competitor and a feeder"
            }
            StructuralErrorKind::AdvancedWithoutFeeder => {
                "match side has an advanced occupant but no feeder"
            }
            StructuralErrorKind::UnknownFeeder => "feeder points outside the tournament",
            StructuralErrorKind::FeederCycle => "feeder relation contains a cycle",
            StructuralErrorKind::FeederOrderViolation => "match is fed by a later-ordered match",
            StructuralErrorKind::RuleSetNotApplicable => {
                "rule set is not applicable to the tournament's sport"
            }
            StructuralErrorKind::UnknownCompetitor => {
                "match references a competitor not in the tournament"
            }
            StructuralErrorKind::OrdinalityLocked => {
                "ordinality cannot change after the tournament has started"
            }
            StructuralErrorKind::UnresolvedSides => {
                "scores cannot be set while a side is unresolved"
            }
            StructuralErrorKind::UnknownMatch => "no such match in the tournament",
        };
        write!(f, "{what} (entity {})", self.entity_id)
    }
}

/// A structural edit proposed against a single match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProposedChange {
    Ordinality(u32),
    Score { side: Side, score: u32 },
}

/// Check invariants over the full graph: unique ordinalities, slot
/// exclusivity, feeder acyclicity and ordering, rule set applicability, and
/// roster membership. Produces no side effects.
pub fn validate_tournament_graph(
    tournament: &Tournament,
    sport: &Sport,
) -> Result<(), StructuralError> {
    if !sport.allows_ruleset(tournament.rules.ruleset_id) {
        return Err(StructuralError::new(
            StructuralErrorKind::RuleSetNotApplicable,
            tournament.rules.id,
        ));
    }

    let mut stage_ordinals = HashSet::new();
    for stage in &tournament.stages {
        if !stage_ordinals.insert(stage.ordinality) {
            return Err(StructuralError::new(
                StructuralErrorKind::DuplicateOrdinality,
                stage.id,
            ));
        }
        let mut group_ordinals = HashSet::new();
        for group in &stage.groups {
            if !group_ordinals.insert(group.ordinality) {
                return Err(StructuralError::new(
                    StructuralErrorKind::DuplicateOrdinality,
                    group.id,
                ));
            }
            let mut match_ordinals = HashSet::new();
            for m in &group.matches {
                if !match_ordinals.insert(m.ordinality) {
                    return Err(StructuralError::new(
                        StructuralErrorKind::DuplicateOrdinality,
                        m.id,
                    ));
                }
            }
        }
    }

    // Position of every match in (stage, group, match) ordinality space.
    let mut positions: HashMap<MatchId, (u32, u32, u32)> = HashMap::new();
    for stage in &tournament.stages {
        for group in &stage.groups {
            for m in &group.matches {
                positions.insert(m.id, (stage.ordinality, group.ordinality, m.ordinality));
            }
        }
    }

    let roster: HashSet<_> = tournament.competitor_ids.iter().copied().collect();
    for m in tournament.matches() {
        for side in [Side::Red, Side::Blue] {
            let slot = m.side(side);
            if slot.competitor.is_some() && slot.feeder.is_some() {
                return Err(StructuralError::new(
                    StructuralErrorKind::CompetitorAndFeeder,
                    m.id,
                ));
            }
            if slot.advanced.is_some() && slot.feeder.is_none() {
                return Err(StructuralError::new(
                    StructuralErrorKind::AdvancedWithoutFeeder,
                    m.id,
                ));
            }
            for occupant in slot.competitor.iter().chain(slot.advanced.iter()) {
                if !roster.contains(occupant) {
                    return Err(StructuralError::new(
                        StructuralErrorKind::UnknownCompetitor,
                        m.id,
                    ));
                }
            }
            if let Some(feeder) = slot.feeder {
                if !positions.contains_key(&feeder.match_id) {
                    return Err(StructuralError::new(
                        StructuralErrorKind::UnknownFeeder,
                        m.id,
                    ));
                }
            }
        }
    }

    if let Some(in_cycle) = find_feeder_cycle(tournament) {
        return Err(StructuralError::new(
            StructuralErrorKind::FeederCycle,
            in_cycle,
        ));
    }

    for m in tournament.matches() {
        let own = positions[&m.id];
        for side in [Side::Red, Side::Blue] {
            if let Some(feeder) = m.side(side).feeder {
                if let Some(&feeder_pos) = positions.get(&feeder.match_id) {
                    if feeder_pos >= own {
                        return Err(StructuralError::new(
                            StructuralErrorKind::FeederOrderViolation,
                            m.id,
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Depth-first walk over feeder edges; returns a match on a cycle, if any.
fn find_feeder_cycle(tournament: &Tournament) -> Option<MatchId> {
    fn visit(
        id: MatchId,
        tournament: &Tournament,
        state: &mut HashMap<MatchId, u8>,
    ) -> Option<MatchId> {
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;
        match state.get(&id) {
            Some(&ON_PATH) => return Some(id),
            Some(&DONE) => return None,
            _ => {}
        }
        state.insert(id, ON_PATH);
        if let Some(m) = tournament.match_by_id(id) {
            for feeder in [m.red.feeder, m.blue.feeder].into_iter().flatten() {
                if tournament.match_by_id(feeder.match_id).is_some() {
                    if let Some(hit) = visit(feeder.match_id, tournament, state) {
                        return Some(hit);
                    }
                }
            }
        }
        state.insert(id, DONE);
        None
    }

    let ids: Vec<MatchId> = tournament.matches().map(|m| m.id).collect();
    let mut state = HashMap::new();
    for id in ids {
        if let Some(hit) = visit(id, tournament, &mut state) {
            return Some(hit);
        }
    }
    None
}

/// Check a proposed single-match edit: ordinality changes are rejected once
/// the tournament has started, and direct score mutation requires both sides
/// resolved.
pub fn validate_mutation(
    tournament: &Tournament,
    match_id: MatchId,
    change: &ProposedChange,
) -> Result<(), StructuralError> {
    let m = tournament
        .match_by_id(match_id)
        .ok_or_else(|| StructuralError::new(StructuralErrorKind::UnknownMatch, match_id))?;
    match change {
        ProposedChange::Ordinality(_) => {
            if tournament.has_completed_match() {
                return Err(StructuralError::new(
                    StructuralErrorKind::OrdinalityLocked,
                    match_id,
                ));
            }
        }
        ProposedChange::Score { .. } => {
            if !m.both_resolved() {
                return Err(StructuralError::new(
                    StructuralErrorKind::UnresolvedSides,
                    match_id,
                ));
            }
        }
    }
    Ok(())
}
