//! Advancement engine: applies match results and propagates outcomes through
//! the feeder graph.
//!
//! All functions here mutate only the in-memory aggregate; the service layer
//! commits the whole cascade with a single versioned store write, so a
//! half-propagated graph is never observable.

use crate::events::{Event, EventKind};
use crate::logic::validate::{validate_mutation, ProposedChange};
use crate::logic::EngineError;
use crate::models::{CompetitorId, FeederPolarity, MatchId, Side, Status, Tournament};
use crate::ruleset::{Outcome, RuleSetCapability, RuleSetError};

/// What a submit/amend call did to the graph.
#[derive(Clone, Debug, PartialEq)]
pub struct AdvancementOutcome {
    pub match_id: MatchId,
    pub outcome: Outcome,
    /// Slots resolved downstream: (match, side, competitor delivered).
    pub advanced: Vec<(MatchId, Side, CompetitorId)>,
    /// Matches whose completed results were cleared by a forced amendment.
    pub reverted: Vec<MatchId>,
    /// Events to emit once the cascade commits.
    pub events: Vec<Event>,
}

/// Record a result on a Ready (or InProgress) match and run the propagation
/// cascade: the winner/loser advances into every slot fed by this match, and
/// aggregate statuses are recomputed up the hierarchy.
pub fn submit_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    red_score: u32,
    blue_score: u32,
    ruleset: &dyn RuleSetCapability,
) -> Result<AdvancementOutcome, EngineError> {
    let m = tournament
        .match_by_id(match_id)
        .ok_or(EngineError::UnknownMatch(match_id))?;
    match m.status {
        Status::Completed => return Err(EngineError::AlreadyCompleted(match_id)),
        Status::NotReady => return Err(EngineError::NotReady(match_id)),
        Status::Ready | Status::InProgress => {}
    }
    if !m.both_resolved() {
        return Err(EngineError::NotReady(match_id));
    }
    ruleset.validate_scores(red_score, blue_score, &tournament.rules.params)?;
    apply_scores(tournament, match_id, red_score, blue_score, ruleset, &[])
}

/// Re-run scoring on an already-Completed match.
///
/// Without `force`, the amendment is rejected if any downstream match that
/// this one feeds has started (completed, or in progress with interim scores)
/// and would receive a different competitor. With `force`, such matches are
/// reverted (result and interim scores cleared, fed slot emptied) recursively,
/// and the new result is recorded. Reverted matches are left unresolved; a
/// follow-up amendment re-propagates into them once their results have been
/// reviewed.
pub fn amend_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    red_score: u32,
    blue_score: u32,
    force: bool,
    ruleset: &dyn RuleSetCapability,
) -> Result<AdvancementOutcome, EngineError> {
    let m = tournament
        .match_by_id(match_id)
        .ok_or(EngineError::UnknownMatch(match_id))?;
    if m.status != Status::Completed {
        return Err(EngineError::NotReady(match_id));
    }
    let red_occupant = m.red.resolved();
    let blue_occupant = m.blue.resolved();

    let outcome = ruleset.determine_outcome(red_score, blue_score, &tournament.rules.params)?;
    let downstream = tournament.fed_by(match_id);
    if outcome == Outcome::Draw && !downstream.is_empty() {
        return Err(EngineError::RuleSet(RuleSetError::DrawNotPermitted));
    }
    let new_occupant = |polarity: FeederPolarity| match (outcome, polarity) {
        (Outcome::Winner(Side::Red), FeederPolarity::WinnerAdvances) => red_occupant,
        (Outcome::Winner(Side::Blue), FeederPolarity::WinnerAdvances) => blue_occupant,
        (Outcome::Winner(Side::Red), FeederPolarity::LoserAdvances) => blue_occupant,
        (Outcome::Winner(Side::Blue), FeederPolarity::LoserAdvances) => red_occupant,
        (Outcome::Draw, _) => None,
    };

    // Decide up front which dependents the changed outcome breaks. A
    // dependent that has completed, or is mid-play with interim scores,
    // cannot silently receive a different occupant.
    let mut to_revert = Vec::new();
    for &(dep_id, side, polarity) in &downstream {
        let dep = tournament
            .match_by_id(dep_id)
            .ok_or(EngineError::UnknownMatch(dep_id))?;
        let started = matches!(dep.status, Status::Completed | Status::InProgress);
        if started && dep.side(side).advanced != new_occupant(polarity) {
            if !force {
                return Err(EngineError::DownstreamCompleted(dep_id));
            }
            to_revert.push((dep_id, side));
        }
    }

    let mut reverted = Vec::new();
    let mut revert_events = Vec::new();
    for (dep_id, side) in to_revert {
        if let Some(dep) = tournament.match_mut(dep_id) {
            dep.side_mut(side).advanced = None;
        }
        revert_match(tournament, dep_id, &mut reverted, &mut revert_events);
    }

    let mut result = apply_scores(
        tournament,
        match_id,
        red_score,
        blue_score,
        ruleset,
        &reverted,
    )?;
    revert_events.extend(result.events);
    result.events = revert_events;
    result.reverted = reverted;
    Ok(result)
}

/// Record a partial score on one side without completing the match. Marks the
/// match InProgress (advisory).
pub fn record_interim_score(
    tournament: &mut Tournament,
    match_id: MatchId,
    side: Side,
    score: u32,
) -> Result<(), EngineError> {
    validate_mutation(tournament, match_id, &ProposedChange::Score { side, score })?;
    let m = tournament
        .match_mut(match_id)
        .ok_or(EngineError::UnknownMatch(match_id))?;
    match m.status {
        Status::Completed => return Err(EngineError::AlreadyCompleted(match_id)),
        Status::NotReady => return Err(EngineError::NotReady(match_id)),
        Status::Ready | Status::InProgress => {}
    }
    m.side_mut(side).score = Some(score);
    m.status = Status::InProgress;
    tournament.recompute_statuses();
    Ok(())
}

/// Shared tail of submit and amend: record the outcome, push it into every
/// downstream slot (except matches just reverted), and recompute aggregate
/// statuses. Preconditions are the caller's job.
fn apply_scores(
    tournament: &mut Tournament,
    match_id: MatchId,
    red_score: u32,
    blue_score: u32,
    ruleset: &dyn RuleSetCapability,
    skip: &[MatchId],
) -> Result<AdvancementOutcome, EngineError> {
    let outcome = ruleset.determine_outcome(red_score, blue_score, &tournament.rules.params)?;
    let downstream = tournament.fed_by(match_id);
    if outcome == Outcome::Draw && !downstream.is_empty() {
        return Err(EngineError::RuleSet(RuleSetError::DrawNotPermitted));
    }

    let tournament_id = tournament.id;
    {
        let m = tournament
            .match_mut(match_id)
            .ok_or(EngineError::UnknownMatch(match_id))?;
        m.red.score = Some(red_score);
        m.blue.score = Some(blue_score);
        m.winner = match outcome {
            Outcome::Winner(side) => Some(side),
            Outcome::Draw => None,
        };
        m.status = Status::Completed;
    }

    let mut events = vec![Event::new(EventKind::MatchCompleted, tournament_id, match_id)];
    let mut advanced = Vec::new();
    for (dep_id, side, polarity) in downstream {
        if skip.contains(&dep_id) {
            continue;
        }
        let occupant = tournament
            .match_by_id(match_id)
            .and_then(|m| m.outcome_competitor(polarity));
        if let Some(competitor) = occupant {
            if let Some(dep) = tournament.match_mut(dep_id) {
                dep.side_mut(side).advanced = Some(competitor);
                if dep.refresh_readiness() {
                    events.push(Event::new(EventKind::MatchReady, tournament_id, dep_id));
                }
                advanced.push((dep_id, side, competitor));
                log::debug!("match {match_id} advanced {competitor} into {dep_id} ({side:?})");
            }
        }
    }

    let changes = tournament.recompute_statuses();
    for stage_id in changes.completed_stages {
        events.push(Event::new(EventKind::StageCompleted, tournament_id, stage_id));
    }
    if changes.tournament_completed {
        events.push(Event::new(
            EventKind::TournamentCompleted,
            tournament_id,
            tournament_id,
        ));
    }

    Ok(AdvancementOutcome {
        match_id,
        outcome,
        advanced,
        reverted: Vec::new(),
        events,
    })
}

/// Clear a completed match's result and empty every downstream slot it had
/// filled; completed dependents are reverted recursively.
fn revert_match(
    tournament: &mut Tournament,
    match_id: MatchId,
    reverted: &mut Vec<MatchId>,
    events: &mut Vec<Event>,
) {
    if reverted.contains(&match_id) {
        return;
    }
    let tournament_id = tournament.id;
    let downstream = tournament.fed_by(match_id);
    if let Some(m) = tournament.match_mut(match_id) {
        m.winner = None;
        m.red.score = None;
        m.blue.score = None;
        m.status = Status::NotReady;
        m.refresh_readiness();
    }
    reverted.push(match_id);
    events.push(Event::new(EventKind::MatchReverted, tournament_id, match_id));
    for (dep_id, side, _) in downstream {
        let dep_started = match tournament.match_mut(dep_id) {
            Some(dep) => {
                dep.side_mut(side).advanced = None;
                let started = matches!(dep.status, Status::Completed | Status::InProgress);
                if !started {
                    dep.status = Status::NotReady;
                    dep.refresh_readiness();
                }
                started
            }
            None => false,
        };
        if dep_started {
            revert_match(tournament, dep_id, reverted, events);
        }
    }
}
