//! Procedural world - noise, biomes, terrain and the three generation tiers

pub mod biome;
pub mod generator;
pub mod local;
pub mod noise;
pub mod terrain;
pub mod tiles;

pub use biome::{classify_biome, Biome, BiomeProperties};
pub use generator::{biome_distribution, TieredWorldGenerator, LOCAL_SALT, REGION_SALT};
pub use local::{LocalRequest, SPAWN_RADIUS};
pub use noise::{NoiseChannel, NoiseField};
pub use terrain::{classify_terrain, TerrainType};
pub use tiles::{LocalMap, LocalTile, RegionMap, RegionTile, WorldMap, WorldTile};
