//! Bracket skeletons: the initial match/feeder graph generated before any
//! results exist, plus the shipped single-elimination builder.

use crate::models::{
    CompetitorId, FeederPolarity, Label, Match, MatchGroup, MatchId, MatchSide, Stage, Tournament,
};
use crate::ruleset::RuleSetError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Addresses a match within a skeleton by position (stage, group, match index).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SkeletonRef {
    pub stage: usize,
    pub group: usize,
    pub index: usize,
}

/// How a skeleton match side gets its competitor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SlotSkeleton {
    /// Not wired yet.
    Open,
    /// Seeded directly.
    Competitor(CompetitorId),
    /// Filled by the outcome of an earlier skeleton match.
    Feeder {
        source: SkeletonRef,
        polarity: FeederPolarity,
    },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchSkeleton {
    pub red: SlotSkeleton,
    pub blue: SlotSkeleton,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupSkeleton {
    pub label: Label,
    pub matches: Vec<MatchSkeleton>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StageSkeleton {
    pub label: Label,
    pub groups: Vec<GroupSkeleton>,
}

/// The initial match/feeder graph for a tournament, produced by a rule set's
/// bracket-construction capability and validated before persistence.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketSkeleton {
    pub stages: Vec<StageSkeleton>,
}

/// Seed index occupying each bracket slot, classic 1-vs-N fold: for 8 slots
/// this yields `[0, 7, 3, 4, 1, 6, 2, 5]`.
fn fold_positions(size: usize) -> Vec<usize> {
    let mut order = vec![0usize];
    while order.len() < size {
        let next_size = order.len() * 2;
        let mut next = Vec::with_capacity(next_size);
        for &seed in &order {
            next.push(seed);
            next.push(next_size - 1 - seed);
        }
        order = next;
    }
    order
}

fn round_label(remaining: usize) -> Label {
    match remaining {
        2 => Label::new("Final"),
        4 => Label::new("Semifinals"),
        8 => Label::new("Quarterfinals"),
        n => Label::new(format!("Round of {n}")),
    }
}

/// Build a single-elimination skeleton: one stage, one match group per round.
///
/// Competitors are taken in seed order (or shuffled when params ask for
/// `"seeding": "random"`); the field is padded to the next power of two and
/// byes advance the unopposed competitor straight into the next round, so no
/// phantom bye matches appear in the skeleton.
pub fn single_elimination(
    competitors: &[CompetitorId],
    params: &Value,
) -> Result<BracketSkeleton, RuleSetError> {
    if competitors.len() < 2 {
        return Err(RuleSetError::UnsupportedFieldSize(competitors.len()));
    }

    let mut seeds: Vec<CompetitorId> = competitors.to_vec();
    if params.get("seeding").and_then(Value::as_str) == Some("random") {
        seeds.shuffle(&mut rand::thread_rng());
    }

    let size = seeds.len().next_power_of_two();
    let mut entries: Vec<SlotSkeleton> = fold_positions(size)
        .into_iter()
        .map(|seed| match seeds.get(seed) {
            Some(&c) => SlotSkeleton::Competitor(c),
            None => SlotSkeleton::Open,
        })
        .collect();

    let mut groups: Vec<GroupSkeleton> = Vec::new();
    while entries.len() > 1 {
        let group_index = groups.len();
        let mut matches: Vec<MatchSkeleton> = Vec::new();
        let mut next = Vec::with_capacity(entries.len() / 2);
        for pair in entries.chunks(2) {
            match (pair[0], pair[1]) {
                // Bye: the unopposed entry advances without a match.
                (slot, SlotSkeleton::Open) | (SlotSkeleton::Open, slot) => next.push(slot),
                (red, blue) => {
                    matches.push(MatchSkeleton { red, blue });
                    next.push(SlotSkeleton::Feeder {
                        source: SkeletonRef {
                            stage: 0,
                            group: group_index,
                            index: matches.len() - 1,
                        },
                        polarity: FeederPolarity::WinnerAdvances,
                    });
                }
            }
        }
        groups.push(GroupSkeleton {
            label: round_label(entries.len()),
            matches,
        });
        entries = next;
    }

    Ok(BracketSkeleton {
        stages: vec![StageSkeleton {
            label: Label::new("Single Elimination"),
            groups,
        }],
    })
}

/// Materialize a skeleton onto the tournament: fresh ids, ordinalities from
/// positions, skeleton refs mapped to match ids, and initial statuses derived.
/// Replaces any existing stages. The caller runs the structural validator on
/// the result before persisting.
///
/// Skeletons come from pluggable capabilities, so a slot referencing a
/// position outside the skeleton is rejected (the tournament is left
/// untouched) rather than trusted.
pub fn instantiate_skeleton(
    tournament: &mut Tournament,
    skeleton: &BracketSkeleton,
) -> Result<(), RuleSetError> {
    // First pass: assign a match id per skeleton position so feeder slots can
    // reference matches that appear later in the walk.
    let ids: Vec<Vec<Vec<MatchId>>> = skeleton
        .stages
        .iter()
        .map(|stage| {
            stage
                .groups
                .iter()
                .map(|group| group.matches.iter().map(|_| Uuid::new_v4()).collect())
                .collect()
        })
        .collect();

    let side_for = |slot: &SlotSkeleton| -> Result<MatchSide, RuleSetError> {
        match *slot {
            SlotSkeleton::Open => Ok(MatchSide::open()),
            SlotSkeleton::Competitor(c) => Ok(MatchSide::seeded(c)),
            SlotSkeleton::Feeder { source, polarity } => ids
                .get(source.stage)
                .and_then(|groups| groups.get(source.group))
                .and_then(|matches| matches.get(source.index))
                .map(|&id| MatchSide::fed(id, polarity))
                .ok_or(RuleSetError::MalformedSkeleton),
        }
    };

    let mut stages = Vec::with_capacity(skeleton.stages.len());
    for (si, stage_skel) in skeleton.stages.iter().enumerate() {
        let mut stage = Stage::new(stage_skel.label.clone(), si as u32);
        for (gi, group_skel) in stage_skel.groups.iter().enumerate() {
            let mut group = MatchGroup::new(group_skel.label.clone(), gi as u32);
            for (mi, m) in group_skel.matches.iter().enumerate() {
                let mut built = Match::new(mi as u32, side_for(&m.red)?, side_for(&m.blue)?);
                built.id = ids[si][gi][mi];
                group.matches.push(built);
            }
            stage.groups.push(group);
        }
        stages.push(stage);
    }
    tournament.stages = stages;
    tournament.recompute_statuses();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(n: usize) -> Vec<CompetitorId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn fold_is_classic_bracket_order() {
        assert_eq!(fold_positions(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
        assert_eq!(fold_positions(4), vec![0, 3, 1, 2]);
        assert_eq!(fold_positions(2), vec![0, 1]);
    }

    #[test]
    fn too_small_field_is_rejected() {
        assert_eq!(
            single_elimination(&field(1), &json!({})),
            Err(RuleSetError::UnsupportedFieldSize(1))
        );
    }

    #[test]
    fn four_competitors_make_two_rounds() {
        let competitors = field(4);
        let skeleton = single_elimination(&competitors, &json!({})).unwrap();
        assert_eq!(skeleton.stages.len(), 1);
        let groups = &skeleton.stages[0].groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label.name, "Semifinals");
        assert_eq!(groups[0].matches.len(), 2);
        assert_eq!(groups[1].label.name, "Final");
        assert_eq!(groups[1].matches.len(), 1);
        // Final is fed by both semifinals, winner-advances.
        let final_match = &groups[1].matches[0];
        for slot in [final_match.red, final_match.blue] {
            match slot {
                SlotSkeleton::Feeder { source, polarity } => {
                    assert_eq!(source.group, 0);
                    assert_eq!(polarity, FeederPolarity::WinnerAdvances);
                }
                other => panic!("expected feeder slot, got {other:?}"),
            }
        }
    }

    #[test]
    fn six_competitors_get_two_byes() {
        let competitors = field(6);
        let skeleton = single_elimination(&competitors, &json!({})).unwrap();
        let groups = &skeleton.stages[0].groups;
        assert_eq!(groups.len(), 3);
        // Seeds 1 and 2 sit out round one: only two opening matches.
        assert_eq!(groups[0].matches.len(), 2);
        assert_eq!(groups[1].matches.len(), 2);
        assert_eq!(groups[2].matches.len(), 1);
        // The semifinals mix direct seeds (byes) with feeders.
        let semis = &groups[1].matches;
        let direct = semis
            .iter()
            .flat_map(|m| [m.red, m.blue])
            .filter(|s| matches!(s, SlotSkeleton::Competitor(_)))
            .count();
        assert_eq!(direct, 2);
        assert!(semis
            .iter()
            .flat_map(|m| [m.red, m.blue])
            .any(|s| matches!(s, SlotSkeleton::Feeder { .. })));
    }

    #[test]
    fn out_of_range_skeleton_ref_is_rejected() {
        use crate::models::Rules;
        let competitors = field(2);
        let skeleton = BracketSkeleton {
            stages: vec![StageSkeleton {
                label: Label::new("Single Elimination"),
                groups: vec![GroupSkeleton {
                    label: Label::new("Final"),
                    matches: vec![MatchSkeleton {
                        red: SlotSkeleton::Feeder {
                            source: SkeletonRef { stage: 0, group: 0, index: 99 },
                            polarity: FeederPolarity::WinnerAdvances,
                        },
                        blue: SlotSkeleton::Competitor(competitors[0]),
                    }],
                }],
            }],
        };
        let mut tournament = Tournament::new(
            "alice",
            Label::new("Cup"),
            Uuid::new_v4(),
            Rules::new(Uuid::new_v4(), json!({})),
            competitors,
        );
        assert_eq!(
            instantiate_skeleton(&mut tournament, &skeleton),
            Err(RuleSetError::MalformedSkeleton)
        );
        // Nothing was materialized.
        assert!(tournament.stages.is_empty());
    }

    #[test]
    fn top_seeds_meet_last() {
        let competitors = field(4);
        let skeleton = single_elimination(&competitors, &json!({})).unwrap();
        let opener = &skeleton.stages[0].groups[0].matches[0];
        // Seed 1 opens against seed 4, not seed 2.
        assert_eq!(opener.red, SlotSkeleton::Competitor(competitors[0]));
        assert_eq!(opener.blue, SlotSkeleton::Competitor(competitors[3]));
    }
}
