//! Strategic planner.
//!
//! An optional overlay that periodically reads the board and nudges an
//! agent's per-kind weights. It never changes which actions are legal,
//! only how they rank, so turning it off leaves play correct.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use terra_types::{ParticipantId, Participant, WorldSnapshot};
use tracing::debug;

use crate::numeric::units;
use crate::personality::KindWeights;

/// Planner settings from the `planner` section of `terra-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Whether assessments are computed at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Turns between reassessments of one agent.
    #[serde(default = "default_reassess_interval")]
    pub reassess_interval: u32,
    /// Turns before this count are the opening.
    #[serde(default = "default_opening_turns")]
    pub opening_turns: u32,
    /// Turns from this count on are the endgame.
    #[serde(default = "default_endgame_turn")]
    pub endgame_turn: u32,
}

const fn default_enabled() -> bool {
    true
}

const fn default_reassess_interval() -> u32 {
    3
}

const fn default_opening_turns() -> u32 {
    4
}

const fn default_endgame_turn() -> u32 {
    15
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            reassess_interval: default_reassess_interval(),
            opening_turns: default_opening_turns(),
            endgame_turn: default_endgame_turn(),
        }
    }
}

/// Phase of the game as the planner sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStage {
    /// Early turns: grab land.
    Opening,
    /// Everything between.
    Midgame,
    /// Late turns: convert resources into points.
    Endgame,
}

/// One agent's reading of the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategicAssessment {
    /// Turn the assessment was made on.
    pub turn: u32,
    /// Game phase.
    pub stage: GameStage,
    /// Share of bordering foreign regions held by stronger opponents.
    pub threat: f64,
    /// Uncontrolled regions bordering the agent's territory.
    pub expansion_room: usize,
    /// 1 for the richest active participant.
    pub wealth_rank: usize,
    /// Weight multipliers derived from the above.
    pub bias: KindWeights,
}

/// Read the board for `participant`.
pub fn assess(
    participant: &Participant,
    world: &WorldSnapshot,
    config: &PlannerConfig,
) -> StrategicAssessment {
    let stage = if world.turn < config.opening_turns {
        GameStage::Opening
    } else if world.turn >= config.endgame_turn {
        GameStage::Endgame
    } else {
        GameStage::Midgame
    };

    let mut foreign = 0_u64;
    let mut stronger = 0_u64;
    let mut expansion_room = 0_usize;
    for region in world.frontier(participant).iter().filter_map(|id| world.region(*id)) {
        match region.controller.and_then(|c| world.participant(c)) {
            None => expansion_room = expansion_room.saturating_add(1),
            Some(owner) if !owner.eliminated => {
                foreign = foreign.saturating_add(1);
                if owner.victory_points > participant.victory_points {
                    stronger = stronger.saturating_add(1);
                }
            }
            Some(_) => {}
        }
    }
    let threat = if foreign == 0 {
        0.0
    } else {
        units(stronger) / units(foreign)
    };

    let wealth = participant.total_resources();
    let wealth_rank = world
        .active_participants()
        .filter(|p| p.total_resources() > wealth)
        .count()
        .saturating_add(1);
    let field = world.active_participants().count();

    let mut bias = KindWeights::NEUTRAL;
    match stage {
        GameStage::Opening => {
            bias.claim = 1.2;
            bias.explore = 1.1;
        }
        GameStage::Midgame => {}
        GameStage::Endgame => {
            bias.build = 1.3;
            bias.claim = 0.9;
        }
    }
    if threat > 0.5 {
        bias.dispute = 0.7;
    } else if threat < 0.2 && expansion_room == 0 && foreign > 0 {
        bias.dispute = 1.2;
    }
    if field > 1 && wealth_rank == field {
        bias.collect = 1.15;
    }

    StrategicAssessment {
        turn: world.turn,
        stage,
        threat,
        expansion_room,
        wealth_rank,
        bias,
    }
}

/// Caches one assessment per agent and refreshes it on schedule.
#[derive(Debug, Clone, Default)]
pub struct StrategicPlanner {
    config: PlannerConfig,
    assessments: BTreeMap<ParticipantId, StrategicAssessment>,
}

impl StrategicPlanner {
    /// Create a planner.
    pub const fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            assessments: BTreeMap::new(),
        }
    }

    /// Reassess `participant` if the planner is enabled and the last
    /// assessment is at least `reassess_interval` turns old.
    pub fn refresh(&mut self, participant: &Participant, world: &WorldSnapshot) {
        if !self.config.enabled {
            return;
        }
        let due = self.assessments.get(&participant.id).is_none_or(|a| {
            world.turn.saturating_sub(a.turn) >= self.config.reassess_interval.max(1)
        });
        if !due {
            return;
        }
        let assessment = assess(participant, world, &self.config);
        debug!(
            participant = %participant.id,
            turn = world.turn,
            stage = ?assessment.stage,
            threat = assessment.threat,
            room = assessment.expansion_room,
            rank = assessment.wealth_rank,
            "strategic reassessment"
        );
        self.assessments.insert(participant.id, assessment);
    }

    /// Latest assessment for `participant`.
    pub fn assessment(&self, participant: ParticipantId) -> Option<&StrategicAssessment> {
        self.assessments.get(&participant)
    }

    /// Weight bias for `participant`; neutral when disabled or unassessed.
    pub fn bias(&self, participant: ParticipantId) -> KindWeights {
        if !self.config.enabled {
            return KindWeights::NEUTRAL;
        }
        self.assessment(participant)
            .map_or(KindWeights::NEUTRAL, |a| a.bias)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use terra_types::{Biome, GridSpec, Neighborhood, Region, RegionId, Resource, ResourceBundle};

    use super::*;

    const ME: ParticipantId = ParticipantId(1);
    const RIVAL: ParticipantId = ParticipantId(2);

    fn world(turn: u32, rival_points: u32) -> WorldSnapshot {
        // 3x1 strip: me at 0, rival at 1, 2 unclaimed.
        let region = |id: u32, controller: Option<ParticipantId>| Region {
            id: RegionId(id),
            x: id,
            y: 0,
            biome: Biome::Plains,
            exploration_level: 0,
            resources: ResourceBundle::new(),
            controller,
            structures: BTreeSet::new(),
        };
        let me = Participant {
            id: ME,
            name: String::from("me"),
            resources: ResourceBundle::from([(Resource::Wood, 1)]),
            victory_points: 2,
            regions: BTreeSet::from([RegionId(0)]),
            eliminated: false,
        };
        let rival = Participant {
            id: RIVAL,
            name: String::from("rival"),
            resources: ResourceBundle::from([(Resource::Wood, 9)]),
            victory_points: rival_points,
            regions: BTreeSet::from([RegionId(1)]),
            eliminated: false,
        };
        WorldSnapshot {
            turn,
            grid: GridSpec {
                width: 3,
                height: 1,
                neighborhood: Neighborhood::Four,
            },
            participants: BTreeMap::from([(ME, me), (RIVAL, rival)]),
            regions: BTreeMap::from([
                (RegionId(0), region(0, Some(ME))),
                (RegionId(1), region(1, Some(RIVAL))),
                (RegionId(2), region(2, None)),
            ]),
        }
    }

    #[test]
    fn boxed_in_by_stronger_rival_lowers_dispute() {
        let w = world(10, 5);
        let a = assess(w.participant(ME).unwrap(), &w, &PlannerConfig::default());
        assert_eq!(a.stage, GameStage::Midgame);
        assert!((a.threat - 1.0).abs() < 1e-9);
        assert_eq!(a.expansion_room, 0);
        assert_eq!(a.wealth_rank, 2);
        assert!(a.bias.dispute < 1.0);
        assert!(a.bias.collect > 1.0);
    }

    #[test]
    fn boxed_in_by_weaker_rival_raises_dispute() {
        let w = world(10, 0);
        let a = assess(w.participant(ME).unwrap(), &w, &PlannerConfig::default());
        assert!(a.threat.abs() < 1e-9);
        assert!(a.bias.dispute > 1.0);
    }

    #[test]
    fn opening_favours_claims_and_endgame_building() {
        let config = PlannerConfig::default();
        let w = world(1, 0);
        let opening = assess(w.participant(ME).unwrap(), &w, &config);
        assert_eq!(opening.stage, GameStage::Opening);
        assert!(opening.bias.claim > 1.0);
        let w = world(40, 0);
        let endgame = assess(w.participant(ME).unwrap(), &w, &config);
        assert_eq!(endgame.stage, GameStage::Endgame);
        assert!(endgame.bias.build > 1.0);
    }

    #[test]
    fn refresh_waits_for_the_interval() {
        let mut planner = StrategicPlanner::new(PlannerConfig::default());
        let early = world(1, 0);
        planner.refresh(early.participant(ME).unwrap(), &early);
        assert_eq!(planner.assessment(ME).unwrap().turn, 1);

        let soon = world(2, 0);
        planner.refresh(soon.participant(ME).unwrap(), &soon);
        assert_eq!(planner.assessment(ME).unwrap().turn, 1);

        let later = world(4, 0);
        planner.refresh(later.participant(ME).unwrap(), &later);
        assert_eq!(planner.assessment(ME).unwrap().turn, 4);
    }

    #[test]
    fn disabled_planner_is_neutral() {
        let mut planner = StrategicPlanner::new(PlannerConfig {
            enabled: false,
            ..PlannerConfig::default()
        });
        let w = world(1, 0);
        planner.refresh(w.participant(ME).unwrap(), &w);
        assert!(planner.assessment(ME).is_none());
        assert_eq!(planner.bias(ME), KindWeights::NEUTRAL);
    }
}
