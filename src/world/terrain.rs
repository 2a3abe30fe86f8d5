//! Terrain categories and the elevation/moisture classifier

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::biome::BiomeProperties;

pub const WATER_LEVEL: f64 = 0.25;
pub const SAND_LEVEL: f64 = 0.30;
pub const STONE_LEVEL: f64 = 0.75;
pub const DIRT_LEVEL: f64 = 0.65;
pub const FOREST_MOISTURE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    #[default]
    Grass,
    Water,
    Sand,
    Forest,
    Stone,
    Dirt,
}

impl TerrainType {
    /// Citizens cannot walk on water
    pub fn is_walkable(&self) -> bool {
        !matches!(self, TerrainType::Water)
    }

    /// Counted as buildable land by the playability passes
    pub fn is_buildable(&self) -> bool {
        matches!(self, TerrainType::Grass | TerrainType::Dirt)
    }

    /// Terrain a building footprint may be placed on
    pub fn accepts_building(&self) -> bool {
        matches!(self, TerrainType::Grass | TerrainType::Dirt | TerrainType::Sand)
    }
}

/// Classify terrain from elevation and moisture
///
/// Thresholds are checked in priority order. The forest roll consumes one
/// value from `rng` only when the moisture test passes.
pub fn classify_terrain<R: Rng + ?Sized>(
    props: &BiomeProperties,
    elevation: f64,
    moisture: f64,
    rng: &mut R,
) -> TerrainType {
    if elevation < WATER_LEVEL {
        return TerrainType::Water;
    }
    if elevation < SAND_LEVEL {
        return TerrainType::Sand;
    }
    if elevation > STONE_LEVEL {
        return TerrainType::Stone;
    }
    if elevation > DIRT_LEVEL {
        return TerrainType::Dirt;
    }
    if moisture > FOREST_MOISTURE && rng.gen::<f64>() < props.tree_density {
        return TerrainType::Forest;
    }
    TerrainType::Grass
}
