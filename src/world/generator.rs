//! Tiered world generation: world and region tiers
//!
//! Each tier is generated from the tier above it as context rather than
//! independently: a region resembles the world cell it was cut from, and a
//! local map (see `local.rs`) resembles the region cells it zooms into.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::core::error::{KingdomError, Result};
use crate::core::types::GridPos;
use crate::spatial::grid::TileGrid;
use crate::world::biome::{classify_biome, Biome};
use crate::world::noise::{NoiseChannel, NoiseField};
use crate::world::terrain::{classify_terrain, TerrainType};
use crate::world::tiles::{RegionMap, RegionTile, WorldMap, WorldTile};

const ELEVATION_FREQUENCY: f64 = 0.02;
const ELEVATION_OCTAVES: [f64; 4] = [0.5, 0.25, 0.15, 0.1];
const TEMPERATURE_FREQUENCY: f64 = 0.02;
const RAINFALL_FREQUENCY: f64 = 0.03;
const RAINFALL_OCTAVES: [f64; 2] = [0.6, 0.4];

/// Fraction of Grass/Dirt below which a region gets the playability pass
const MIN_BUILDABLE_FRACTION: f64 = 0.3;

/// Salts for `tier_rng` so each tier draws from its own stream
pub const REGION_SALT: u64 = 0x5245_4749_4f4e;
pub const LOCAL_SALT: u64 = 0x4c4f_4341_4c00;

/// Multi-scale world generator
#[derive(Debug, Clone)]
pub struct TieredWorldGenerator {
    seed: u64,
    noise: NoiseField,
}

/// Noise seeds are 32-bit; both halves of the world seed feed them
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

impl TieredWorldGenerator {
    pub fn new(seed: u64) -> Self {
        info!(seed, "World generator initialized");
        Self {
            seed,
            noise: NoiseField::new(fold_seed(seed)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Reproducible RNG stream for one tier selection
    pub fn tier_rng(&self, salt: u64, x: i32, y: i32) -> ChaCha8Rng {
        let mut h = self.seed ^ salt.rotate_left(17);
        h = h.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (x as u32 as u64);
        h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9) ^ ((y as u32 as u64) << 32);
        h ^= h >> 31;
        ChaCha8Rng::seed_from_u64(h)
    }

    /// World tier: elevation, climate and biome per cell
    ///
    /// Pure function of the seed and coordinates.
    pub fn generate_world_map(&self, width: usize, height: usize) -> Result<WorldMap> {
        if width == 0 || height == 0 {
            return Err(KingdomError::InvalidRequest(format!(
                "world map must be non-empty, got {width}x{height}"
            )));
        }
        info!(width, height, "Generating world map");

        let map = TileGrid::from_fn(width, height, |x, y| self.world_tile(x, y, height));

        let distribution = biome_distribution(&map);
        let total = map.len() as f64;
        for (biome, count) in &distribution {
            info!(
                biome = %biome,
                tiles = count,
                percent = (*count as f64 / total * 1000.0).round() / 10.0,
                "Biome distribution"
            );
        }
        Ok(map)
    }

    fn world_tile(&self, x: usize, y: usize, height: usize) -> WorldTile {
        let (fx, fy) = (x as f64, y as f64);

        let elevation = NoiseField::normalize(self.noise.octaves(
            NoiseChannel::Elevation,
            fx,
            fy,
            ELEVATION_FREQUENCY,
            &ELEVATION_OCTAVES,
        ));

        // 0 at the equator row, 1 at the poles
        let latitude = ((fy / height as f64) - 0.5).abs() * 2.0;
        let base_temperature = 1.0 - latitude;
        let temperature_noise = self.noise.sample(
            NoiseChannel::Temperature,
            fx * TEMPERATURE_FREQUENCY,
            fy * TEMPERATURE_FREQUENCY,
        );
        let temperature = ((base_temperature * 0.7 + temperature_noise * 0.3) * 2.0 - 1.0
            - elevation * 0.5)
            .clamp(-1.0, 1.0);

        let mut rainfall = NoiseField::normalize(self.noise.octaves(
            NoiseChannel::Rainfall,
            fx,
            fy,
            RAINFALL_FREQUENCY,
            &RAINFALL_OCTAVES,
        ));
        if elevation > 0.7 {
            rainfall *= 1.2;
        }
        let rainfall = rainfall.clamp(0.0, 1.0);

        WorldTile {
            position: GridPos::new(x as i32, y as i32),
            elevation,
            temperature,
            rainfall,
            biome: classify_biome(temperature, rainfall),
        }
    }

    /// Region tier constrained by one world cell
    pub fn generate_region_from_world_tile<R: Rng + ?Sized>(
        &self,
        world_tile: &WorldTile,
        width: usize,
        height: usize,
        rng: &mut R,
    ) -> Result<RegionMap> {
        if width == 0 || height == 0 {
            return Err(KingdomError::InvalidRequest(format!(
                "region map must be non-empty, got {width}x{height}"
            )));
        }
        info!(
            x = world_tile.position.x,
            y = world_tile.position.y,
            biome = %world_tile.biome,
            elevation = world_tile.elevation,
            "Generating region from world tile"
        );

        let props = world_tile.biome.properties();
        let offset_x = (world_tile.position.x as i64 * width as i64) as f64;
        let offset_y = (world_tile.position.y as i64 * height as i64) as f64;

        let mut region = TileGrid::from_fn(width, height, |x, y| {
            let nx = x as f64 + offset_x;
            let ny = y as f64 + offset_y;

            let base = NoiseField::normalize(self.noise.sample(NoiseChannel::Detail, nx * 0.1, ny * 0.1));
            let detail = self.noise.sample(NoiseChannel::Detail, nx * 0.5, ny * 0.5) * 0.1;
            let elevation = (world_tile.elevation * 0.7 + base * 0.3 + detail).clamp(0.0, 1.0);

            let moisture_noise =
                NoiseField::normalize(self.noise.sample(NoiseChannel::Rainfall, nx * 0.12, ny * 0.12));
            let moisture = (world_tile.rainfall * 0.6 + moisture_noise * 0.4).clamp(0.0, 1.0);

            RegionTile {
                position: GridPos::new(x as i32, y as i32),
                elevation,
                moisture,
                biome: world_tile.biome,
                terrain: classify_terrain(&props, elevation, moisture, &mut *rng),
            }
        });

        ensure_region_playability(&mut region, rng);
        Ok(region)
    }

    /// Pick a hospitable world cell for a new settlement
    ///
    /// Prefers `preferred` (or any hospitable biome) at moderate elevation,
    /// falling back to the map centre.
    pub fn find_starting_location<R: Rng + ?Sized>(
        world: &WorldMap,
        preferred: Option<Biome>,
        rng: &mut R,
    ) -> GridPos {
        let mut candidates: Vec<GridPos> = Vec::new();
        if let Some(biome) = preferred {
            candidates = world
                .iter()
                .filter(|t| t.biome == biome && is_moderate_elevation(t))
                .map(|t| t.position)
                .collect();
            if candidates.is_empty() {
                debug!(biome = %biome, "Preferred biome unavailable, widening search");
            }
        }
        if candidates.is_empty() {
            candidates = world
                .iter()
                .filter(|t| t.biome.is_hospitable() && is_moderate_elevation(t))
                .map(|t| t.position)
                .collect();
        }

        if candidates.is_empty() {
            warn!("No hospitable starting tile, using map centre");
            return GridPos::new((world.width() / 2) as i32, (world.height() / 2) as i32);
        }
        candidates[rng.gen_range(0..candidates.len())]
    }
}

fn is_moderate_elevation(tile: &WorldTile) -> bool {
    (0.3..=0.6).contains(&tile.elevation)
}

/// Lift a region with too little buildable land
fn ensure_region_playability<R: Rng + ?Sized>(region: &mut RegionMap, rng: &mut R) {
    let buildable = region.iter().filter(|t| t.terrain.is_buildable()).count();
    if (buildable as f64) >= region.len() as f64 * MIN_BUILDABLE_FRACTION {
        return;
    }

    warn!(
        buildable,
        total = region.len(),
        "Region has too little buildable land, adjusting"
    );
    for tile in region.iter_mut() {
        if tile.terrain == TerrainType::Stone {
            if rng.gen::<f64>() < 0.5 {
                tile.terrain = TerrainType::Dirt;
            }
        } else if tile.terrain == TerrainType::Water && tile.elevation > 0.22 && rng.gen::<f64>() < 0.3
        {
            tile.terrain = TerrainType::Grass;
        }
    }
}

/// Biome counts, most common first (ties in biome order)
pub fn biome_distribution(world: &WorldMap) -> Vec<(Biome, usize)> {
    let mut counts: Vec<(Biome, usize)> = Biome::ALL
        .iter()
        .map(|&b| (b, world.iter().filter(|t| t.biome == b).count()))
        .filter(|&(_, n)| n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}
