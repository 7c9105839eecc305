//! World snapshot: participants, regions, and the grid they sit on.
//!
//! The engine never owns this state. The world-state collaborator hands
//! out a fresh [`WorldSnapshot`] before each decision step, and the
//! snapshot is discarded after one action has been chosen.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::bundle::ResourceBundle;
use crate::enums::{Biome, Neighborhood, StructureType};
use crate::ids::{ParticipantId, RegionId};

/// Highest exploration level a region can reach.
pub const MAX_EXPLORATION_LEVEL: u8 = 3;

/// A player in the game, human or agent-controlled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Current holdings.
    pub resources: ResourceBundle,
    /// Current victory points.
    pub victory_points: u32,
    /// Regions this participant controls.
    pub regions: BTreeSet<RegionId>,
    /// Whether the participant has been knocked out of the game.
    pub eliminated: bool,
}

impl Participant {
    /// Sum of all held resources.
    pub fn total_resources(&self) -> u64 {
        self.resources.total()
    }

    /// Whether the participant controls `region`.
    pub fn owns(&self, region: RegionId) -> bool {
        self.regions.contains(&region)
    }
}

/// A cell of the territory grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Region {
    /// Region identifier (row-major grid index).
    pub id: RegionId,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Terrain type.
    pub biome: Biome,
    /// Exploration level, `0..=MAX_EXPLORATION_LEVEL`.
    pub exploration_level: u8,
    /// Resources the region yields when collected.
    pub resources: ResourceBundle,
    /// Controlling participant, if any.
    pub controller: Option<ParticipantId>,
    /// Structures built in the region.
    pub structures: BTreeSet<StructureType>,
}

impl Region {
    /// Whether the region has been explored at least once.
    pub const fn is_explored(&self) -> bool {
        self.exploration_level > 0
    }

    /// Sum of the region's resource yields.
    pub fn resource_value(&self) -> u64 {
        self.resources.total()
    }
}

/// Dimensions and adjacency rule of the territory grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridSpec {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Which cells count as adjacent.
    pub neighborhood: Neighborhood,
}

impl GridSpec {
    /// Region id of the cell at `(x, y)`, or `None` outside the grid.
    pub fn region_at(&self, x: u32, y: u32) -> Option<RegionId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        y.checked_mul(self.width)?.checked_add(x).map(RegionId)
    }

    /// Coordinates of `region`, or `None` if the id lies outside the grid.
    pub fn coords(&self, region: RegionId) -> Option<(u32, u32)> {
        let x = region.0.checked_rem(self.width)?;
        let y = region.0.checked_div(self.width)?;
        (y < self.height).then_some((x, y))
    }

    /// Ids of every cell adjacent to `region` under the grid's neighborhood,
    /// in ascending id order.
    pub fn neighbors(&self, region: RegionId) -> Vec<RegionId> {
        let Some((x, y)) = self.coords(region) else {
            return Vec::new();
        };
        let offsets: &[(i64, i64)] = match self.neighborhood {
            Neighborhood::Four => &[(0, -1), (-1, 0), (1, 0), (0, 1)],
            Neighborhood::Eight => &[
                (-1, -1),
                (0, -1),
                (1, -1),
                (-1, 0),
                (1, 0),
                (-1, 1),
                (0, 1),
                (1, 1),
            ],
        };
        let mut out: Vec<RegionId> = offsets
            .iter()
            .filter_map(|&(dx, dy)| {
                let nx = u32::try_from(i64::from(x).checked_add(dx)?).ok()?;
                let ny = u32::try_from(i64::from(y).checked_add(dy)?).ok()?;
                self.region_at(nx, ny)
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Grid distance between two cells: Manhattan for a four-neighborhood,
    /// Chebyshev for an eight-neighborhood. `None` if either id is off-grid.
    pub fn distance(&self, a: RegionId, b: RegionId) -> Option<u32> {
        let (ax, ay) = self.coords(a)?;
        let (bx, by) = self.coords(b)?;
        let dx = ax.abs_diff(bx);
        let dy = ay.abs_diff(by);
        Some(match self.neighborhood {
            Neighborhood::Four => dx.saturating_add(dy),
            Neighborhood::Eight => dx.max(dy),
        })
    }
}

/// A point-in-time copy of everything the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// Global turn number.
    pub turn: u32,
    /// Grid dimensions and adjacency.
    pub grid: GridSpec,
    /// Every participant keyed by id.
    pub participants: BTreeMap<ParticipantId, Participant>,
    /// Every region keyed by id.
    pub regions: BTreeMap<RegionId, Region>,
}

impl WorldSnapshot {
    /// Look up a participant.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Look up a region.
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Participants still in the game, in id order.
    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(|p| !p.eliminated)
    }

    /// Regions controlled by `participant`, in id order.
    pub fn owned_regions<'a>(
        &'a self,
        participant: &'a Participant,
    ) -> impl Iterator<Item = &'a Region> + 'a {
        participant
            .regions
            .iter()
            .filter_map(|id| self.regions.get(id))
    }

    /// Ids of regions adjacent to the participant's territory that the
    /// participant does not control.
    pub fn frontier(&self, participant: &Participant) -> BTreeSet<RegionId> {
        participant
            .regions
            .iter()
            .flat_map(|&owned| self.grid.neighbors(owned))
            .filter(|id| !participant.owns(*id))
            .collect()
    }

    /// Distance from `region` to the nearest region the participant owns.
    pub fn distance_to_territory(
        &self,
        participant: &Participant,
        region: RegionId,
    ) -> Option<u32> {
        participant
            .regions
            .iter()
            .filter_map(|&owned| self.grid.distance(owned, region))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(neighborhood: Neighborhood) -> GridSpec {
        GridSpec {
            width: 4,
            height: 3,
            neighborhood,
        }
    }

    #[test]
    fn coords_roundtrip_row_major() {
        let g = grid(Neighborhood::Four);
        assert_eq!(g.region_at(1, 2), Some(RegionId(9)));
        assert_eq!(g.coords(RegionId(9)), Some((1, 2)));
        assert_eq!(g.region_at(4, 0), None);
        assert_eq!(g.coords(RegionId(12)), None);
    }

    #[test]
    fn four_neighborhood_at_corner() {
        let g = grid(Neighborhood::Four);
        assert_eq!(g.neighbors(RegionId(0)), vec![RegionId(1), RegionId(4)]);
    }

    #[test]
    fn eight_neighborhood_in_middle() {
        let g = grid(Neighborhood::Eight);
        let n = g.neighbors(RegionId(5));
        assert_eq!(n.len(), 8);
        assert!(n.contains(&RegionId(0)));
        assert!(n.contains(&RegionId(10)));
    }

    #[test]
    fn distance_follows_neighborhood() {
        let four = grid(Neighborhood::Four);
        let eight = grid(Neighborhood::Eight);
        assert_eq!(four.distance(RegionId(0), RegionId(5)), Some(2));
        assert_eq!(eight.distance(RegionId(0), RegionId(5)), Some(1));
    }
}
