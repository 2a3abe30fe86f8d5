//! Game state - owns every tier, entity and service for one session
//!
//! `update` is the single per-frame entry point: it scales time, keeps the
//! storage capacity in step with completed warehouses, runs the job system,
//! retires finished designations and queues auto-saves.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::city::building::{Building, BuildingType};
use crate::city::designation::{DesignationKind, DesignationManager};
use crate::city::placement::{check_placement, PlacementError};
use crate::city::stockpile::Stockpile;
use crate::core::config::GameConfig;
use crate::core::error::{KingdomError, Result};
use crate::core::types::{BuildingId, CitizenId, GridPos, Vec2};
use crate::entity::citizen::Citizen;
use crate::game::save::{AutoSaver, SaveSystem};
use crate::simulation::events::{EventLog, GameEvent};
use crate::simulation::jobs::JobManager;
use crate::world::biome::Biome;
use crate::world::generator::{biome_distribution, TieredWorldGenerator, LOCAL_SALT, REGION_SALT};
use crate::world::local::LocalRequest;
use crate::world::tiles::{LocalMap, RegionMap, WorldMap};

/// Citizens spawn this many tiles around the map centre
const SPAWN_SPREAD: i32 = 3;

/// Which tier the player is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewTier {
    World,
    Region,
    #[default]
    Local,
}

/// Camera position remembered per tier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cameras {
    pub world: Vec2,
    pub region: Vec2,
    pub local: Vec2,
}

impl Cameras {
    pub fn get(&self, tier: ViewTier) -> Vec2 {
        match tier {
            ViewTier::World => self.world,
            ViewTier::Region => self.region,
            ViewTier::Local => self.local,
        }
    }

    pub fn set(&mut self, tier: ViewTier, position: Vec2) {
        match tier {
            ViewTier::World => self.world = position,
            ViewTier::Region => self.region = position,
            ViewTier::Local => self.local = position,
        }
    }
}

/// Everything a save file round-trips
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedWorld {
    pub seed: u64,
    pub world_map: Option<WorldMap>,
    pub region_map: Option<RegionMap>,
    pub local_map: Option<LocalMap>,
    /// World cell the region was generated from
    pub world_cell: Option<GridPos>,
    /// Top-left region cell of the local chunk
    pub region_chunk: Option<GridPos>,
    pub view: ViewTier,
    pub cameras: Cameras,
    pub citizens: Vec<Citizen>,
    pub buildings: Vec<Building>,
    pub stockpile: Stockpile,
    pub designations: DesignationManager,
    pub game_time: f64,
    pub next_citizen_id: u32,
    pub next_building_id: u32,
}

#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    generator: TieredWorldGenerator,
    rng: ChaCha8Rng,

    pub world_map: Option<WorldMap>,
    pub region_map: Option<RegionMap>,
    pub local_map: Option<LocalMap>,
    pub world_cell: Option<GridPos>,
    pub region_chunk: Option<GridPos>,

    view: ViewTier,
    cameras: Cameras,

    pub citizens: Vec<Citizen>,
    pub buildings: Vec<Building>,
    pub stockpile: Stockpile,
    pub designations: DesignationManager,

    jobs: JobManager,
    events: EventLog,

    /// In-game seconds since the session began
    pub game_time: f64,
    pub paused: bool,
    /// Multiplier on every `update` delta
    pub game_speed: f32,

    next_citizen_id: u32,
    next_building_id: u32,

    save_system: SaveSystem,
    autosaver: Option<AutoSaver>,
}

impl GameState {
    fn empty(config: GameConfig, seed: u64) -> Self {
        let save_system = SaveSystem::new(config.saves.save_dir.clone());
        let jobs = JobManager::new(config.jobs.clone());
        let stockpile = Stockpile::new(config.storage.base_capacity);
        Self {
            generator: TieredWorldGenerator::new(seed),
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            world_map: None,
            region_map: None,
            local_map: None,
            world_cell: None,
            region_chunk: None,
            view: ViewTier::Local,
            cameras: Cameras::default(),
            citizens: Vec::new(),
            buildings: Vec::new(),
            stockpile,
            designations: DesignationManager::new(),
            jobs,
            events: EventLog::new(),
            game_time: 0.0,
            paused: false,
            game_speed: 1.0,
            next_citizen_id: 0,
            next_building_id: 0,
            save_system,
            autosaver: None,
        }
    }

    /// Generate all three tiers and found the starting settlement
    ///
    /// With no seed a random one is drawn. The preferred biome steers the
    /// starting world cell when such a cell exists.
    pub fn new_game(config: GameConfig, seed: Option<u64>, preferred_biome: Option<Biome>) -> Result<Self> {
        config.validate().map_err(KingdomError::Config)?;
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let sizes = config.generation.clone();

        let mut state = Self::empty(config, seed);
        info!(seed, "Starting new game");

        let world = state.generator.generate_world_map(sizes.world_width, sizes.world_height)?;
        let start = TieredWorldGenerator::find_starting_location(&world, preferred_biome, &mut state.rng);
        let start_tile = *world
            .at(start)
            .ok_or_else(|| KingdomError::InvalidRequest(format!("start {start:?} outside world")))?;
        info!(x = start.x, y = start.y, biome = %start_tile.biome, "Starting location selected");

        let mut region_rng = state.generator.tier_rng(REGION_SALT, start.x, start.y);
        let region = state.generator.generate_region_from_world_tile(
            &start_tile,
            sizes.region_width,
            sizes.region_height,
            &mut region_rng,
        )?;

        let chunk = GridPos::new(
            ((sizes.region_width - sizes.chunk_width) / 2) as i32,
            ((sizes.region_height - sizes.chunk_height) / 2) as i32,
        );
        let request = LocalRequest {
            chunk,
            chunk_width: sizes.chunk_width,
            chunk_height: sizes.chunk_height,
            width: sizes.local_width,
            height: sizes.local_height,
        };
        let mut local_rng = state.generator.tier_rng(local_salt(start), chunk.x, chunk.y);
        let local = state.generator.generate_local_map(&region, request, &mut local_rng)?;

        state.cameras = Cameras {
            world: start.to_vec2(),
            region: chunk.to_vec2(),
            local: local.center().to_vec2(),
        };
        state.world_map = Some(world);
        state.region_map = Some(region);
        state.local_map = Some(local);
        state.world_cell = Some(start);
        state.region_chunk = Some(chunk);

        state.found_settlement();
        Ok(state)
    }

    /// Wagon at the centre, citizens around it, starting stock
    fn found_settlement(&mut self) {
        let Some(center) = self.local_map.as_ref().map(|m| m.center()) else {
            return;
        };

        let wagon_id = self.next_building_id();
        let wagon = Building::prebuilt(wagon_id, BuildingType::Wagon, center);
        self.claim_footprint(&wagon);
        self.buildings.push(wagon);

        for _ in 0..self.config.settlement.starting_citizens {
            let x = center.x + self.rng.gen_range(-SPAWN_SPREAD..=SPAWN_SPREAD);
            let y = center.y + self.rng.gen_range(-SPAWN_SPREAD..=SPAWN_SPREAD);
            self.spawn_citizen(GridPos::new(x, y).to_vec2());
        }

        for (kind, amount) in self.config.settlement.starting_resources.entries() {
            if amount > 0 && !self.stockpile.deposit(kind, amount) {
                warn!(?kind, amount, "Starting resources exceed storage");
            }
        }

        info!(
            citizens = self.citizens.len(),
            center_x = center.x,
            center_y = center.y,
            "Settlement founded"
        );
    }

    /// Recruit a citizen with random name and skills
    pub fn spawn_citizen(&mut self, position: Vec2) -> CitizenId {
        let id = CitizenId(self.next_citizen_id);
        self.next_citizen_id += 1;
        let mut citizen = Citizen::recruit(id, position, &mut self.rng);
        citizen.move_speed = self.config.jobs.move_speed;
        debug!(citizen = id.0, name = %citizen.name, "Citizen spawned");
        self.citizens.push(citizen);
        id
    }

    fn next_building_id(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building_id);
        self.next_building_id += 1;
        id
    }

    fn claim_footprint(&mut self, building: &Building) {
        if let Some(map) = self.local_map.as_mut() {
            for pos in building.footprint() {
                if let Some(tile) = map.tiles.at_mut(pos) {
                    tile.building = Some(building.id);
                }
            }
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    // --- Views -----------------------------------------------------------

    pub fn view(&self) -> ViewTier {
        self.view
    }

    pub fn camera(&self) -> Vec2 {
        self.cameras.get(self.view)
    }

    pub fn set_camera(&mut self, position: Vec2) {
        self.cameras.set(self.view, position);
    }

    /// Switch tier, keeping each tier's camera; false if that tier is not generated
    pub fn switch_view(&mut self, tier: ViewTier) -> bool {
        let available = match tier {
            ViewTier::World => self.world_map.is_some(),
            ViewTier::Region => self.region_map.is_some(),
            ViewTier::Local => self.local_map.is_some(),
        };
        if !available {
            return false;
        }
        debug!(from = ?self.view, to = ?tier, "Switching view");
        self.view = tier;
        true
    }

    // --- Buildings -------------------------------------------------------

    /// Plan a building with its top-left corner at `position`
    pub fn place_building(
        &mut self,
        building_type: BuildingType,
        position: GridPos,
    ) -> std::result::Result<BuildingId, PlacementError> {
        let checked = match (self.view, self.local_map.as_ref()) {
            (ViewTier::Local, Some(map)) => check_placement(&map.tiles, &self.buildings, building_type, position),
            _ => Err(PlacementError::WrongView),
        };
        if let Err(err) = checked {
            warn!(kind = building_type.name(), x = position.x, y = position.y, %err, "Placement rejected");
            self.events.push(GameEvent::PlacementRejected {
                building_type,
                position,
                reason: err.to_string(),
            });
            return Err(err);
        }

        let id = self.next_building_id();
        let building = Building::new(id, building_type, position);
        self.claim_footprint(&building);
        self.buildings.push(building);
        info!(building = id.0, kind = building_type.name(), x = position.x, y = position.y, "Building placed");
        self.events.push(GameEvent::BuildingPlaced {
            building: id,
            building_type,
            position,
        });
        Ok(id)
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Employ a citizen at an active workplace
    pub fn assign_worker(&mut self, building: BuildingId, citizen: CitizenId) -> bool {
        if !self.citizens.iter().any(|c| c.id == citizen) {
            return false;
        }
        self.buildings
            .iter_mut()
            .find(|b| b.id == building)
            .map(|b| b.is_active && b.assign_worker(citizen))
            .unwrap_or(false)
    }

    pub fn remove_worker(&mut self, building: BuildingId, citizen: CitizenId) {
        if let Some(b) = self.buildings.iter_mut().find(|b| b.id == building) {
            b.remove_worker(citizen);
        }
    }

    // --- Storage ---------------------------------------------------------

    /// Base capacity plus the bonus of every completed warehouse
    pub fn total_storage_capacity(&self) -> u32 {
        let warehouses = self
            .buildings
            .iter()
            .filter(|b| b.building_type == BuildingType::Warehouse && b.is_complete())
            .count() as u32;
        self.config.storage.base_capacity + warehouses * self.config.storage.per_warehouse_bonus
    }

    pub fn storage_used(&self) -> u32 {
        self.stockpile.used()
    }

    pub fn storage_remaining(&self) -> u32 {
        self.total_storage_capacity().saturating_sub(self.storage_used())
    }

    pub fn is_storage_full(&self) -> bool {
        self.storage_used() >= self.total_storage_capacity()
    }

    pub fn can_add_resources(&self, amount: u32) -> bool {
        self.storage_used().saturating_add(amount) <= self.total_storage_capacity()
    }

    // --- Designations ----------------------------------------------------

    /// Mark resources in a rectangle for gathering; returns nodes marked
    pub fn designate_area(&mut self, kind: DesignationKind, corner_a: GridPos, corner_b: GridPos) -> usize {
        let Some(map) = self.local_map.as_mut() else {
            return 0;
        };
        self.designations
            .designate_area(kind, &mut map.nodes, corner_a, corner_b, self.game_time)
    }

    pub fn cancel_designations(&mut self, kind: Option<DesignationKind>) -> usize {
        let Some(map) = self.local_map.as_mut() else {
            return 0;
        };
        self.designations.cancel_all(kind, &mut map.nodes)
    }

    // --- Events ----------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Cargo was lost to a full stockpile since the last drain
    pub fn storage_full_warning(&self) -> bool {
        self.events.storage_full()
    }

    pub fn world_biome_distribution(&self) -> Vec<(Biome, usize)> {
        self.world_map.as_ref().map(biome_distribution).unwrap_or_default()
    }

    // --- Simulation ------------------------------------------------------

    /// Advance the simulation by `delta_time` real seconds
    pub fn update(&mut self, delta_time: f32) {
        if self.paused {
            return;
        }
        let dt = delta_time * self.game_speed;
        if dt <= 0.0 {
            return;
        }

        let previous = self.game_time;
        self.game_time += dt as f64;
        let capacity = self.total_storage_capacity();
        self.stockpile.set_capacity(capacity);

        if let Some(map) = self.local_map.as_mut() {
            self.jobs.update(
                &mut self.citizens,
                &mut self.buildings,
                map,
                &mut self.stockpile,
                dt,
                &mut self.events,
            );
            self.designations.update(&map.nodes);
        }

        let interval = self.config.saves.autosave_interval;
        if (previous / interval).floor() < (self.game_time / interval).floor() {
            self.request_autosave();
        }
    }

    /// Start the background auto-save worker
    pub fn enable_autosave(&mut self) -> Result<()> {
        if self.autosaver.is_none() {
            self.autosaver = Some(AutoSaver::spawn(
                self.save_system.clone(),
                self.config.saves.autosaves_kept,
            )?);
        }
        Ok(())
    }

    fn request_autosave(&mut self) {
        let Some(saver) = self.autosaver.as_ref() else {
            return;
        };
        info!(game_time = self.game_time, "Queueing auto-save");
        if !saver.request(self.to_saved()) {
            warn!("Auto-save worker is gone, disabling auto-save");
            self.autosaver = None;
        }
    }

    // --- Persistence -----------------------------------------------------

    pub fn save_system(&self) -> &SaveSystem {
        &self.save_system
    }

    pub fn to_saved(&self) -> SavedWorld {
        SavedWorld {
            seed: self.generator.seed(),
            world_map: self.world_map.clone(),
            region_map: self.region_map.clone(),
            local_map: self.local_map.clone(),
            world_cell: self.world_cell,
            region_chunk: self.region_chunk,
            view: self.view,
            cameras: self.cameras,
            citizens: self.citizens.clone(),
            buildings: self.buildings.clone(),
            stockpile: self.stockpile.clone(),
            designations: self.designations.clone(),
            game_time: self.game_time,
            next_citizen_id: self.next_citizen_id,
            next_building_id: self.next_building_id,
        }
    }

    /// Rebuild a session from saved data
    ///
    /// Citizen paths are not saved; they are recomputed on the next tick.
    pub fn from_saved(config: GameConfig, saved: SavedWorld) -> Result<Self> {
        config.validate().map_err(KingdomError::Config)?;
        let mut state = Self::empty(config, saved.seed);
        // Fresh stream so post-load recruits differ from the founding ones
        state.rng = ChaCha8Rng::seed_from_u64(saved.seed ^ u64::from(saved.next_citizen_id).rotate_left(32));

        // Ids must stay ahead of everything already in the save
        let max_citizen = saved.citizens.iter().map(|c| c.id.0 + 1).max().unwrap_or(0);
        let max_building = saved.buildings.iter().map(|b| b.id.0 + 1).max().unwrap_or(0);

        state.world_map = saved.world_map;
        state.region_map = saved.region_map;
        state.local_map = saved.local_map;
        state.world_cell = saved.world_cell;
        state.region_chunk = saved.region_chunk;
        state.view = saved.view;
        state.cameras = saved.cameras;
        state.citizens = saved.citizens;
        state.buildings = saved.buildings;
        state.stockpile = saved.stockpile;
        state.designations = saved.designations;
        state.game_time = saved.game_time;
        state.next_citizen_id = saved.next_citizen_id.max(max_citizen);
        state.next_building_id = saved.next_building_id.max(max_building);

        let capacity = state.total_storage_capacity();
        state.stockpile.set_capacity(capacity);
        Ok(state)
    }

    pub fn save(&mut self, save_name: &str) -> Result<PathBuf> {
        if self.local_map.is_none() {
            return Err(KingdomError::NoActiveGame);
        }
        let path = self.save_system.save(save_name, &self.to_saved())?;
        self.events.push(GameEvent::GameSaved {
            save_name: save_name.to_string(),
        });
        Ok(path)
    }

    pub fn load(config: GameConfig, save_name: &str) -> Result<Self> {
        let saved = SaveSystem::new(config.saves.save_dir.clone()).load(save_name)?;
        Self::from_saved(config, saved)
    }
}

/// Local stream salt that also depends on the chosen world cell
fn local_salt(world_cell: GridPos) -> u64 {
    LOCAL_SALT ^ (((world_cell.x as u32 as u64) << 32) | world_cell.y as u32 as u64)
}
