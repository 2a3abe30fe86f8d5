//! Tile records for the three generation tiers

use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, GridPos, ResourceNodeId};
use crate::entity::resource_node::ResourceNode;
use crate::spatial::grid::TileGrid;
use crate::spatial::pathfinding::NavGrid;
use crate::world::biome::Biome;
use crate::world::terrain::TerrainType;

/// World tier cell: one whole region at coarse scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldTile {
    pub position: GridPos,
    /// 0.0 to 1.0
    pub elevation: f64,
    /// -1.0 (cold) to 1.0 (hot)
    pub temperature: f64,
    /// 0.0 to 1.0
    pub rainfall: f64,
    pub biome: Biome,
}

/// Region tier cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionTile {
    pub position: GridPos,
    pub elevation: f64,
    pub moisture: f64,
    pub biome: Biome,
    pub terrain: TerrainType,
}

/// Playable local tile
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalTile {
    pub terrain: TerrainType,
    #[serde(default)]
    pub resource: Option<ResourceNodeId>,
    #[serde(default)]
    pub building: Option<BuildingId>,
}

impl LocalTile {
    pub fn new(terrain: TerrainType) -> Self {
        Self {
            terrain,
            resource: None,
            building: None,
        }
    }
}

pub type WorldMap = TileGrid<WorldTile>;
pub type RegionMap = TileGrid<RegionTile>;

/// The playable map: terrain plus the resource node arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMap {
    pub tiles: TileGrid<LocalTile>,
    pub nodes: Vec<ResourceNode>,
}

impl LocalMap {
    pub fn new(tiles: TileGrid<LocalTile>) -> Self {
        Self {
            tiles,
            nodes: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    pub fn terrain_at(&self, pos: GridPos) -> Option<TerrainType> {
        self.tiles.at(pos).map(|t| t.terrain)
    }

    pub fn node(&self, id: ResourceNodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: ResourceNodeId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(id.index())
    }

    /// Append a node and link it from its tile
    pub fn add_node(&mut self, node: ResourceNode) -> ResourceNodeId {
        let id = ResourceNodeId(self.nodes.len() as u32);
        if let Some(tile) = self.tiles.at_mut(node.position) {
            tile.resource = Some(id);
        }
        self.nodes.push(node);
        id
    }

    pub fn node_ids(&self) -> impl Iterator<Item = ResourceNodeId> {
        (0..self.nodes.len() as u32).map(ResourceNodeId)
    }

    pub fn center(&self) -> GridPos {
        GridPos::new((self.width() / 2) as i32, (self.height() / 2) as i32)
    }
}

impl NavGrid for TileGrid<LocalTile> {
    fn nav_width(&self) -> usize {
        self.width()
    }

    fn nav_height(&self) -> usize {
        self.height()
    }

    fn is_passable(&self, pos: GridPos) -> bool {
        self.at(pos).map(|t| t.terrain.is_walkable()).unwrap_or(false)
    }
}
