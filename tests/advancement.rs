//! Integration tests for the advancement engine: result submission,
//! propagation, and amendments.

use bracket_engine::{
    amend_result, record_interim_score, submit_result, CompetitorId, EngineError, EventKind,
    FeederPolarity, Label, Match, MatchGroup, MatchId, MatchSide, Outcome, RuleSetError, Rules,
    Side, Stage, StandardScoring, Status, Tournament,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn two_competitor_tournament(params: Value) -> (Tournament, MatchId, [CompetitorId; 2]) {
    let competitors: [CompetitorId; 2] = std::array::from_fn(|_| Uuid::new_v4());
    let m = Match::new(
        0,
        MatchSide::seeded(competitors[0]),
        MatchSide::seeded(competitors[1]),
    );
    let match_id = m.id;
    let mut group = MatchGroup::new(Label::new("Final"), 0);
    group.matches = vec![m];
    let mut stage = Stage::new(Label::new("Single Elimination"), 0);
    stage.groups = vec![group];
    let mut tournament = Tournament::new(
        "alice",
        Label::new("Duel"),
        Uuid::new_v4(),
        Rules::new(Uuid::new_v4(), params),
        competitors.to_vec(),
    );
    tournament.stages = vec![stage];
    tournament.recompute_statuses();
    (tournament, match_id, competitors)
}

/// Four competitors, two semifinals feeding a final (winner-advances).
fn four_bracket(params: Value) -> (Tournament, [CompetitorId; 4], MatchId, MatchId, MatchId) {
    let competitors: [CompetitorId; 4] = std::array::from_fn(|_| Uuid::new_v4());
    let m1 = Match::new(
        0,
        MatchSide::seeded(competitors[0]),
        MatchSide::seeded(competitors[1]),
    );
    let m2 = Match::new(
        1,
        MatchSide::seeded(competitors[2]),
        MatchSide::seeded(competitors[3]),
    );
    let final_match = Match::new(
        0,
        MatchSide::fed(m1.id, FeederPolarity::WinnerAdvances),
        MatchSide::fed(m2.id, FeederPolarity::WinnerAdvances),
    );
    let (m1_id, m2_id, f_id) = (m1.id, m2.id, final_match.id);
    let mut semis = MatchGroup::new(Label::new("Semifinals"), 0);
    semis.matches = vec![m1, m2];
    let mut last = MatchGroup::new(Label::new("Final"), 1);
    last.matches = vec![final_match];
    let mut stage = Stage::new(Label::new("Single Elimination"), 0);
    stage.groups = vec![semis, last];
    let mut tournament = Tournament::new(
        "alice",
        Label::new("Cup"),
        Uuid::new_v4(),
        Rules::new(Uuid::new_v4(), params),
        competitors.to_vec(),
    );
    tournament.stages = vec![stage];
    tournament.recompute_statuses();
    (tournament, competitors, m1_id, m2_id, f_id)
}

fn kinds(events: &[bracket_engine::Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}

#[test]
fn single_match_red_victory_completes_tournament() {
    let (mut tournament, match_id, _) = two_competitor_tournament(json!({}));
    let outcome = submit_result(&mut tournament, match_id, 10, 5, &StandardScoring).unwrap();
    assert_eq!(outcome.outcome, Outcome::Winner(Side::Red));

    let m = tournament.match_by_id(match_id).unwrap();
    assert_eq!(m.status, Status::Completed);
    assert_eq!(m.winner, Some(Side::Red));
    assert_eq!(m.red.score, Some(10));
    assert_eq!(m.blue.score, Some(5));
    assert_eq!(tournament.status, Status::Completed);

    let kinds = kinds(&outcome.events);
    assert!(kinds.contains(&EventKind::MatchCompleted));
    assert!(kinds.contains(&EventKind::StageCompleted));
    assert!(kinds.contains(&EventKind::TournamentCompleted));
}

#[test]
fn winner_advances_into_final() {
    let (mut tournament, competitors, m1_id, m2_id, f_id) = four_bracket(json!({}));
    assert_eq!(tournament.match_by_id(f_id).unwrap().status, Status::NotReady);

    let outcome = submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    assert_eq!(outcome.advanced, vec![(f_id, Side::Red, competitors[0])]);
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.red.advanced, Some(competitors[0]));
    assert_eq!(f.status, Status::NotReady);

    let outcome = submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.blue.advanced, Some(competitors[2]));
    assert_eq!(f.status, Status::Ready);
    assert!(kinds(&outcome.events).contains(&EventKind::MatchReady));
}

#[test]
fn loser_advances_edge_delivers_loser() {
    let (mut tournament, competitors, m1_id, _, f_id) = four_bracket(json!({}));
    tournament.match_mut(f_id).unwrap().red.feeder = Some(bracket_engine::FeederRef {
        match_id: m1_id,
        polarity: FeederPolarity::LoserAdvances,
    });
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.red.advanced, Some(competitors[1]));
}

#[test]
fn double_submit_without_force_is_rejected_and_leaves_state_unchanged() {
    let (mut tournament, _, m1_id, ..) = four_bracket(json!({}));
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    let snapshot = tournament.clone();
    let err = submit_result(&mut tournament, m1_id, 3, 9, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::AlreadyCompleted(m1_id));
    assert_eq!(tournament, snapshot);
}

#[test]
fn submitting_an_unready_match_is_rejected() {
    let (mut tournament, _, _, _, f_id) = four_bracket(json!({}));
    let err = submit_result(&mut tournament, f_id, 1, 0, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::NotReady(f_id));
}

#[test]
fn unknown_match_is_rejected() {
    let (mut tournament, ..) = four_bracket(json!({}));
    let missing = Uuid::new_v4();
    let err = submit_result(&mut tournament, missing, 1, 0, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::UnknownMatch(missing));
}

#[test]
fn tied_score_is_rejected_when_draws_are_off() {
    let (mut tournament, _, m1_id, ..) = four_bracket(json!({}));
    let err = submit_result(&mut tournament, m1_id, 5, 5, &StandardScoring).unwrap_err();
    assert!(matches!(err, EngineError::RuleSet(RuleSetError::InvalidScore(_))));
}

#[test]
fn draw_is_rejected_on_a_match_that_feeds_another() {
    let (mut tournament, _, m1_id, ..) = four_bracket(json!({"allow_draw": true}));
    let err = submit_result(&mut tournament, m1_id, 5, 5, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::RuleSet(RuleSetError::DrawNotPermitted));
    // Nothing was recorded.
    assert_eq!(tournament.match_by_id(m1_id).unwrap().status, Status::Ready);
}

#[test]
fn draw_completes_a_terminal_match() {
    let (mut tournament, match_id, _) = two_competitor_tournament(json!({"allow_draw": true}));
    let outcome = submit_result(&mut tournament, match_id, 5, 5, &StandardScoring).unwrap();
    assert_eq!(outcome.outcome, Outcome::Draw);
    let m = tournament.match_by_id(match_id).unwrap();
    assert_eq!(m.status, Status::Completed);
    assert_eq!(m.winner, None);
}

#[test]
fn interim_score_marks_match_in_progress() {
    let (mut tournament, _, m1_id, ..) = four_bracket(json!({}));
    record_interim_score(&mut tournament, m1_id, Side::Red, 3).unwrap();
    let m1 = tournament.match_by_id(m1_id).unwrap();
    assert_eq!(m1.status, Status::InProgress);
    assert_eq!(m1.red.score, Some(3));
    assert_eq!(tournament.stages[0].groups[0].status, Status::InProgress);
    // An in-progress match still accepts a final result.
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    assert_eq!(
        tournament.match_by_id(m1_id).unwrap().status,
        Status::Completed
    );
}

#[test]
fn amend_without_force_is_blocked_by_completed_downstream() {
    let (mut tournament, _, m1_id, m2_id, f_id) = four_bracket(json!({}));
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    submit_result(&mut tournament, f_id, 15, 12, &StandardScoring).unwrap();
    let err = amend_result(&mut tournament, m1_id, 0, 10, false, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::DownstreamCompleted(f_id));
    assert_eq!(tournament.match_by_id(f_id).unwrap().status, Status::Completed);
}

#[test]
fn forced_amend_reverts_completed_downstream_and_clears_slot() {
    let (mut tournament, competitors, m1_id, m2_id, f_id) = four_bracket(json!({}));
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    submit_result(&mut tournament, f_id, 15, 12, &StandardScoring).unwrap();

    let outcome = amend_result(&mut tournament, m1_id, 0, 10, true, &StandardScoring).unwrap();
    assert_eq!(outcome.outcome, Outcome::Winner(Side::Blue));
    assert_eq!(outcome.reverted, vec![f_id]);
    assert!(kinds(&outcome.events).contains(&EventKind::MatchReverted));

    let m1 = tournament.match_by_id(m1_id).unwrap();
    assert_eq!(m1.winner, Some(Side::Blue));
    assert_eq!((m1.red.score, m1.blue.score), (Some(0), Some(10)));

    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.status, Status::NotReady);
    assert_eq!(f.red.advanced, None);
    assert_eq!(f.winner, None);
    assert_eq!(f.red.score, None);
    assert_eq!(f.blue.score, None);
    // The other slot, fed by the untouched semifinal, keeps its occupant.
    assert_eq!(f.blue.advanced, Some(competitors[2]));
    // The tournament is no longer complete.
    assert_ne!(tournament.status, Status::Completed);

    // A follow-up amendment re-propagates the new winner into the final.
    amend_result(&mut tournament, m1_id, 0, 10, false, &StandardScoring).unwrap();
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.red.advanced, Some(competitors[1]));
    assert_eq!(f.status, Status::Ready);
}

#[test]
fn amend_cannot_swap_occupant_of_an_in_progress_downstream_match() {
    let (mut tournament, competitors, m1_id, m2_id, f_id) = four_bracket(json!({}));
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    record_interim_score(&mut tournament, f_id, Side::Red, 9).unwrap();

    // The final is mid-play; its red finalist cannot be replaced silently.
    let err = amend_result(&mut tournament, m1_id, 0, 10, false, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::DownstreamCompleted(f_id));
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.status, Status::InProgress);
    assert_eq!(f.red.advanced, Some(competitors[0]));
    assert_eq!(f.red.score, Some(9));

    // Forcing reverts the final: interim score gone, slot emptied.
    let outcome = amend_result(&mut tournament, m1_id, 0, 10, true, &StandardScoring).unwrap();
    assert_eq!(outcome.reverted, vec![f_id]);
    let f = tournament.match_by_id(f_id).unwrap();
    assert_eq!(f.status, Status::NotReady);
    assert_eq!(f.red.advanced, None);
    assert_eq!(f.red.score, None);
    assert_eq!(f.blue.advanced, Some(competitors[2]));
}

#[test]
fn amend_keeping_the_winner_leaves_downstream_alone() {
    let (mut tournament, _, m1_id, m2_id, f_id) = four_bracket(json!({}));
    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    submit_result(&mut tournament, f_id, 15, 12, &StandardScoring).unwrap();

    let outcome = amend_result(&mut tournament, m1_id, 10, 8, false, &StandardScoring).unwrap();
    assert!(outcome.reverted.is_empty());
    let m1 = tournament.match_by_id(m1_id).unwrap();
    assert_eq!(m1.blue.score, Some(8));
    assert_eq!(tournament.match_by_id(f_id).unwrap().status, Status::Completed);
    assert_eq!(tournament.status, Status::Completed);
}

#[test]
fn amend_requires_a_completed_match() {
    let (mut tournament, _, m1_id, ..) = four_bracket(json!({}));
    let err = amend_result(&mut tournament, m1_id, 10, 5, false, &StandardScoring).unwrap_err();
    assert_eq!(err, EngineError::NotReady(m1_id));
}

#[test]
fn forced_amend_reverts_recursively_through_chains() {
    // Three-round chain: m1, m2 -> f, plus a third-round match fed by f.
    let (mut tournament, _competitors, m1_id, m2_id, f_id) = four_bracket(json!({}));
    let bystander = Uuid::new_v4();
    tournament.competitor_ids.push(bystander);
    let decider = Match::new(
        0,
        MatchSide::fed(f_id, FeederPolarity::WinnerAdvances),
        MatchSide::seeded(bystander),
    );
    let decider_id = decider.id;
    let mut group = MatchGroup::new(Label::new("Decider"), 2);
    group.matches = vec![decider];
    tournament.stages[0].groups.push(group);
    tournament.recompute_statuses();

    submit_result(&mut tournament, m1_id, 10, 5, &StandardScoring).unwrap();
    submit_result(&mut tournament, m2_id, 7, 3, &StandardScoring).unwrap();
    submit_result(&mut tournament, f_id, 15, 12, &StandardScoring).unwrap();
    submit_result(&mut tournament, decider_id, 9, 1, &StandardScoring).unwrap();

    let outcome = amend_result(&mut tournament, m1_id, 0, 10, true, &StandardScoring).unwrap();
    assert_eq!(outcome.reverted, vec![f_id, decider_id]);

    let decider = tournament.match_by_id(decider_id).unwrap();
    assert_eq!(decider.winner, None);
    assert_eq!(decider.red.advanced, None);
    // Its seeded side is untouched, but one slot is gone, so it is NotReady.
    assert_eq!(decider.blue.competitor, Some(bystander));
    assert_eq!(decider.status, Status::NotReady);
}
