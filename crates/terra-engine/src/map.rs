//! Seeded board generation for self-play.
//!
//! Every cell of the grid becomes a region with a random biome and a
//! yield drawn from that biome. Starting regions are spread out by
//! farthest-point selection so no two seats begin adjacent on any board
//! with room for it. The same seed always produces the same board.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use terra_core::{GameConfig, ParticipantConfig};
use terra_types::{
    Biome, GridSpec, Participant, ParticipantId, Region, RegionId, Resource, ResourceBundle,
    WorldSnapshot,
};
use tracing::{debug, info};

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Yields
// -----------------------------------------------------------------------

/// Holdings every seat starts with.
pub fn starting_resources() -> ResourceBundle {
    ResourceBundle::new()
        .with(Resource::Wood, 6)
        .with(Resource::Stone, 4)
        .with(Resource::Gold, 2)
        .with(Resource::Water, 4)
}

/// Primary and secondary resource of a biome.
const fn biome_yields(biome: Biome) -> (Resource, Resource) {
    match biome {
        Biome::Forest => (Resource::Wood, Resource::Water),
        Biome::Mountain => (Resource::Stone, Resource::Gold),
        Biome::Plains | Biome::Swamp => (Resource::Water, Resource::Wood),
        Biome::Desert => (Resource::Gold, Resource::Stone),
        Biome::Lake => (Resource::Water, Resource::Stone),
    }
}

fn roll_region(rng: &mut SmallRng, id: RegionId, x: u32, y: u32) -> Region {
    let biome = Biome::ALL
        .get(rng.random_range(0..Biome::ALL.len()))
        .copied()
        .unwrap_or(Biome::Plains);
    let (primary, secondary) = biome_yields(biome);
    Region {
        id,
        x,
        y,
        biome,
        exploration_level: 0,
        resources: ResourceBundle::new()
            .with(primary, rng.random_range(2..=4))
            .with(secondary, rng.random_range(0..=1)),
        controller: None,
        structures: BTreeSet::new(),
    }
}

// -----------------------------------------------------------------------
// Starting positions
// -----------------------------------------------------------------------

/// Pick `count` starting cells, each as far as possible from those
/// already picked. Ties go to the lowest id.
pub fn spread_starts(grid: &GridSpec, count: usize) -> Vec<RegionId> {
    let cells = grid.width.saturating_mul(grid.height);
    let mut chosen: Vec<RegionId> = Vec::with_capacity(count);
    while chosen.len() < count {
        let mut best: Option<(u32, RegionId)> = None;
        for region in (0..cells).map(RegionId) {
            if chosen.contains(&region) {
                continue;
            }
            let gap = chosen
                .iter()
                .filter_map(|c| grid.distance(*c, region))
                .min()
                .unwrap_or(0);
            if best.is_none_or(|(g, _)| gap > g) {
                best = Some((gap, region));
            }
        }
        let Some((_, region)) = best else {
            break;
        };
        chosen.push(region);
    }
    chosen
}

// -----------------------------------------------------------------------
// Generation
// -----------------------------------------------------------------------

/// Build the opening board for `seats`, seeded by `game.seed`.
///
/// Seat `i` plays as `ParticipantId(i)` and starts owning one explored
/// region.
pub fn generate_world(
    game: &GameConfig,
    seats: &[ParticipantConfig],
) -> Result<WorldSnapshot, EngineError> {
    let grid = GridSpec {
        width: game.grid_width,
        height: game.grid_height,
        neighborhood: game.neighborhood,
    };
    let cells = game
        .grid_width
        .checked_mul(game.grid_height)
        .ok_or_else(|| EngineError::Map {
            message: String::from("grid too large"),
        })?;

    let mut rng = SmallRng::seed_from_u64(game.seed);
    let mut regions = BTreeMap::new();
    for id in (0..cells).map(RegionId) {
        let (x, y) = grid.coords(id).ok_or_else(|| EngineError::Map {
            message: format!("region {id} has no coordinates"),
        })?;
        regions.insert(id, roll_region(&mut rng, id, x, y));
    }

    let starts = spread_starts(&grid, seats.len());
    if starts.len() < seats.len() {
        return Err(EngineError::Map {
            message: format!("{} seats but only {} free cells", seats.len(), starts.len()),
        });
    }

    let mut participants = BTreeMap::new();
    for ((seat, start), index) in seats.iter().zip(starts).zip(0_u32..) {
        let id = ParticipantId(index);
        if let Some(region) = regions.get_mut(&start) {
            region.controller = Some(id);
            region.exploration_level = 1;
        }
        debug!(participant = %id, name = seat.name, region = %start, "starting region assigned");
        participants.insert(
            id,
            Participant {
                id,
                name: seat.name.clone(),
                resources: starting_resources(),
                victory_points: game.starting_victory_points,
                regions: BTreeSet::from([start]),
                eliminated: false,
            },
        );
    }

    info!(
        width = grid.width,
        height = grid.height,
        seats = participants.len(),
        seed = game.seed,
        "board generated"
    );
    Ok(WorldSnapshot {
        turn: 0,
        grid,
        participants,
        regions,
    })
}
