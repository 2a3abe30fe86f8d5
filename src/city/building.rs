//! Building catalog and building instances

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::{BuildingId, CitizenId, GridPos, ResourceKind, Vec2};

/// Type of building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    House,
    Storage,
    Warehouse,
    Workshop,
    Farm,
    Mine,
    LumberCamp,
    Well,
    Market,
    Wagon,
}

impl BuildingType {
    pub const ALL: [BuildingType; 10] = [
        BuildingType::House,
        BuildingType::Storage,
        BuildingType::Warehouse,
        BuildingType::Workshop,
        BuildingType::Farm,
        BuildingType::Mine,
        BuildingType::LumberCamp,
        BuildingType::Well,
        BuildingType::Market,
        BuildingType::Wagon,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuildingType::House => "House",
            BuildingType::Storage => "Storage",
            BuildingType::Warehouse => "Warehouse",
            BuildingType::Workshop => "Workshop",
            BuildingType::Farm => "Farm",
            BuildingType::Mine => "Mine",
            BuildingType::LumberCamp => "Lumber Camp",
            BuildingType::Well => "Well",
            BuildingType::Market => "Market",
            BuildingType::Wagon => "Wagon Stockpile",
        }
    }

    /// Footprint (width, height) in tiles
    pub fn size(&self) -> (i32, i32) {
        match self {
            BuildingType::House => (3, 3),
            BuildingType::Storage => (4, 4),
            BuildingType::Warehouse => (5, 5),
            BuildingType::Workshop => (3, 3),
            BuildingType::Farm => (5, 5),
            BuildingType::Mine => (2, 2),
            BuildingType::LumberCamp => (3, 2),
            BuildingType::Well => (1, 1),
            BuildingType::Market => (4, 3),
            BuildingType::Wagon => (2, 2),
        }
    }

    /// Materials that must be hauled in before construction
    pub fn required_materials(&self) -> &'static [(ResourceKind, u32)] {
        match self {
            BuildingType::House => &[(ResourceKind::Wood, 20), (ResourceKind::Stone, 10)],
            BuildingType::Storage => &[(ResourceKind::Wood, 30)],
            BuildingType::Warehouse => &[(ResourceKind::Wood, 50), (ResourceKind::Stone, 30)],
            BuildingType::Workshop => &[(ResourceKind::Wood, 25), (ResourceKind::Stone, 15)],
            BuildingType::Farm => &[(ResourceKind::Wood, 10)],
            BuildingType::Mine => &[(ResourceKind::Wood, 15), (ResourceKind::Stone, 5)],
            BuildingType::LumberCamp => &[(ResourceKind::Wood, 15)],
            BuildingType::Well => &[(ResourceKind::Stone, 20)],
            BuildingType::Market => &[(ResourceKind::Wood, 40), (ResourceKind::Stone, 20)],
            BuildingType::Wagon => &[],
        }
    }

    /// Total construction work to complete
    pub fn work_required(&self) -> f32 {
        match self {
            BuildingType::House => 100.0,
            BuildingType::Storage => 80.0,
            BuildingType::Warehouse => 150.0,
            BuildingType::Workshop => 120.0,
            BuildingType::Farm => 60.0,
            BuildingType::Mine => 150.0,
            BuildingType::LumberCamp => 70.0,
            BuildingType::Well => 100.0,
            BuildingType::Market => 140.0,
            BuildingType::Wagon => 0.0,
        }
    }

    /// Worker slots once active; 0 means not a workplace
    pub fn max_workers(&self) -> u32 {
        match self {
            BuildingType::Workshop => 4,
            BuildingType::Farm => 3,
            BuildingType::Mine => 5,
            BuildingType::LumberCamp => 4,
            BuildingType::Market => 6,
            _ => 0,
        }
    }
}

/// Construction lifecycle; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingState {
    /// Placed, waiting for materials
    Planned,
    UnderConstruction,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub building_type: BuildingType,
    /// Top-left tile of the footprint
    pub position: GridPos,
    pub state: BuildingState,
    #[serde(default)]
    pub construction_progress: f32,
    #[serde(default)]
    pub materials_delivered: BTreeMap<ResourceKind, u32>,
    #[serde(default)]
    pub assigned_workers: Vec<CitizenId>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub production_progress: f32,
}

impl Building {
    pub fn new(id: BuildingId, building_type: BuildingType, position: GridPos) -> Self {
        Self {
            id,
            building_type,
            position,
            state: BuildingState::Planned,
            construction_progress: 0.0,
            materials_delivered: BTreeMap::new(),
            assigned_workers: Vec::new(),
            is_active: false,
            production_progress: 0.0,
        }
    }

    /// A building that skips the construction pipeline
    pub fn prebuilt(id: BuildingId, building_type: BuildingType, position: GridPos) -> Self {
        let mut building = Self::new(id, building_type, position);
        building.state = BuildingState::Complete;
        building.construction_progress = building_type.work_required();
        building.is_active = true;
        building
    }

    /// Materials still missing, by kind
    pub fn required_materials(&self) -> BTreeMap<ResourceKind, u32> {
        self.building_type
            .required_materials()
            .iter()
            .filter_map(|&(kind, amount)| {
                let delivered = self.materials_delivered.get(&kind).copied().unwrap_or(0);
                (delivered < amount).then(|| (kind, amount - delivered))
            })
            .collect()
    }

    pub fn has_all_materials(&self) -> bool {
        self.required_materials().is_empty()
    }

    pub fn deliver_material(&mut self, kind: ResourceKind, amount: u32) {
        *self.materials_delivered.entry(kind).or_insert(0) += amount;
    }

    pub fn can_start_construction(&self) -> bool {
        self.state == BuildingState::Planned && self.has_all_materials()
    }

    /// Planned -> UnderConstruction once every material is in
    pub fn start_construction(&mut self) -> bool {
        if !self.can_start_construction() {
            return false;
        }
        self.state = BuildingState::UnderConstruction;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.state == BuildingState::Complete
    }

    pub fn is_stockpile(&self) -> bool {
        self.building_type == BuildingType::Wagon
    }

    pub fn size(&self) -> (i32, i32) {
        self.building_type.size()
    }

    pub fn occupies_tile(&self, tile: GridPos) -> bool {
        let (w, h) = self.size();
        tile.x >= self.position.x
            && tile.x < self.position.x + w
            && tile.y >= self.position.y
            && tile.y < self.position.y + h
    }

    pub fn footprint(&self) -> impl Iterator<Item = GridPos> + '_ {
        let (w, h) = self.size();
        (0..h).flat_map(move |dy| {
            (0..w).map(move |dx| GridPos::new(self.position.x + dx, self.position.y + dy))
        })
    }

    /// Tiles orthogonally or diagonally touching the footprint
    pub fn perimeter(&self) -> impl Iterator<Item = GridPos> + '_ {
        let (w, h) = self.size();
        let (x0, y0) = (self.position.x - 1, self.position.y - 1);
        (0..h + 2).flat_map(move |dy| {
            (0..w + 2).filter_map(move |dx| {
                let edge = dx == 0 || dy == 0 || dx == w + 1 || dy == h + 1;
                edge.then(|| GridPos::new(x0 + dx, y0 + dy))
            })
        })
    }

    pub fn center(&self) -> Vec2 {
        let (w, h) = self.size();
        Vec2::new(
            self.position.x as f32 + w as f32 / 2.0,
            self.position.y as f32 + h as f32 / 2.0,
        )
    }

    pub fn overlaps(&self, other: &Building) -> bool {
        let (w, h) = self.size();
        let (ow, oh) = other.size();
        self.position.x < other.position.x + ow
            && other.position.x < self.position.x + w
            && self.position.y < other.position.y + oh
            && other.position.y < self.position.y + h
    }

    /// Active workplace with a free slot
    pub fn needs_workers(&self) -> bool {
        let max = self.building_type.max_workers();
        max > 0 && self.is_active && (self.assigned_workers.len() as u32) < max
    }

    /// Returns false if already assigned or all slots are taken
    pub fn assign_worker(&mut self, citizen: CitizenId) -> bool {
        if self.assigned_workers.contains(&citizen)
            || self.assigned_workers.len() as u32 >= self.building_type.max_workers()
        {
            return false;
        }
        self.assigned_workers.push(citizen);
        true
    }

    pub fn remove_worker(&mut self, citizen: CitizenId) {
        self.assigned_workers.retain(|&c| c != citizen);
    }
}

/// Every tile covered by a building footprint
pub fn footprint_obstacles<'a>(buildings: impl IntoIterator<Item = &'a Building>) -> AHashSet<GridPos> {
    let mut blocked = AHashSet::new();
    for building in buildings {
        blocked.extend(building.footprint());
    }
    blocked
}
