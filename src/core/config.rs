//! Game configuration with documented defaults
//!
//! Every tunable of the generator and the job simulation lives here. The
//! config is an owned value handed to `GameState` at construction; there is
//! no process-wide instance.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{KingdomError, Result};
use crate::core::types::ResourceKind;

/// Top-level configuration for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generation: GenerationConfig,
    pub settlement: SettlementConfig,
    pub storage: StorageConfig,
    pub jobs: JobConfig,
    pub saves: SaveConfig,
}

/// Tier sizes for the world generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// World tier size (each cell is a whole region)
    pub world_width: usize,
    pub world_height: usize,
    /// Region tier size (generated from one world cell)
    pub region_width: usize,
    pub region_height: usize,
    /// Number of region cells averaged into one local map
    pub chunk_width: usize,
    pub chunk_height: usize,
    /// Playable local map size
    pub local_width: usize,
    pub local_height: usize,
}

/// Starting settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    pub starting_citizens: u32,
    pub starting_resources: StartingResources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingResources {
    pub wood: u32,
    pub stone: u32,
    pub food: u32,
    pub iron: u32,
}

impl StartingResources {
    pub fn entries(&self) -> [(ResourceKind, u32); 4] {
        [
            (ResourceKind::Wood, self.wood),
            (ResourceKind::Stone, self.stone),
            (ResourceKind::Food, self.food),
            (ResourceKind::Iron, self.iron),
        ]
    }

    pub fn total(&self) -> u32 {
        self.wood
            .saturating_add(self.stone)
            .saturating_add(self.food)
            .saturating_add(self.iron)
    }
}

/// Stockpile capacity rule: `base + complete_warehouses * per_warehouse`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_capacity: u32,
    pub per_warehouse_bonus: u32,
}

/// Citizen work pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// A* expansion budget per path request
    pub pathfinding_max_iterations: usize,
    /// Tiles per second
    pub move_speed: f32,
    /// Seconds at a node before one harvest completes
    pub gather_time: f32,
    /// Maximum units carried per hauling trip
    pub haul_batch: u32,
    /// Construction work per second at skill 0
    pub construction_rate: f32,
}

/// Persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub save_dir: PathBuf,
    /// In-game seconds between auto-saves
    pub autosave_interval: f64,
    pub autosaves_kept: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            settlement: SettlementConfig::default(),
            storage: StorageConfig::default(),
            jobs: JobConfig::default(),
            saves: SaveConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            world_width: 150,
            world_height: 150,
            region_width: 80,
            region_height: 80,
            chunk_width: 3,
            chunk_height: 3,
            local_width: 100,
            local_height: 100,
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            starting_citizens: 5,
            starting_resources: StartingResources::default(),
        }
    }
}

impl Default for StartingResources {
    fn default() -> Self {
        Self {
            wood: 100,
            stone: 50,
            food: 100,
            iron: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_capacity: 500,
            per_warehouse_bonus: 2000,
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            pathfinding_max_iterations: 1000,
            move_speed: 5.0,
            gather_time: 5.0,
            haul_batch: 5,
            construction_rate: 10.0,
        }
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            autosave_interval: 300.0,
            autosaves_kept: 5,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GameConfig =
            toml::from_str(content).map_err(|e| KingdomError::Config(e.to_string()))?;
        config.validate().map_err(KingdomError::Config)?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        let g = &self.generation;
        if g.world_width == 0 || g.world_height == 0 {
            return Err("world size must be non-zero".into());
        }
        if g.region_width == 0 || g.region_height == 0 {
            return Err("region size must be non-zero".into());
        }
        if g.local_width == 0 || g.local_height == 0 {
            return Err("local size must be non-zero".into());
        }
        if g.chunk_width == 0 || g.chunk_height == 0 {
            return Err("chunk size must be non-zero".into());
        }
        if g.chunk_width > g.region_width || g.chunk_height > g.region_height {
            return Err(format!(
                "chunk ({}x{}) must fit inside region ({}x{})",
                g.chunk_width, g.chunk_height, g.region_width, g.region_height
            ));
        }

        let j = &self.jobs;
        if j.move_speed <= 0.0 || j.gather_time <= 0.0 || j.construction_rate <= 0.0 {
            return Err("job rates must be positive".into());
        }
        if j.haul_batch == 0 {
            return Err("haul_batch must be at least 1".into());
        }

        if self.settlement.starting_resources.total() > self.storage.base_capacity {
            return Err(format!(
                "starting resources ({}) exceed base storage ({})",
                self.settlement.starting_resources.total(),
                self.storage.base_capacity
            ));
        }

        if self.saves.autosave_interval <= 0.0 {
            return Err("autosave_interval must be positive".into());
        }

        Ok(())
    }
}
