//! Local tier: the playable map zoomed in from a chunk of region cells
//!
//! After the base terrain is classified, a fixed sequence of passes runs:
//! open borders, a clear spawn block, forest clusters, pond smoothing and
//! finally resource node placement.

use rand::Rng;
use tracing::{debug, info};

use crate::core::error::{KingdomError, Result};
use crate::core::types::GridPos;
use crate::entity::resource_node::{ResourceNode, ResourceNodeType};
use crate::spatial::grid::TileGrid;
use crate::world::biome::Biome;
use crate::world::generator::TieredWorldGenerator;
use crate::world::noise::{NoiseChannel, NoiseField};
use crate::world::terrain::{classify_terrain, TerrainType};
use crate::world::tiles::{LocalMap, LocalTile, RegionMap};

/// Half-width of the guaranteed-buildable block around the map centre
pub const SPAWN_RADIUS: i32 = 5;

const CHUNK_NOISE_OFFSET: f64 = 1000.0;
const ELEVATION_OCTAVES: [f64; 3] = [0.5, 0.3, 0.2];
const STONE_CHANCE: f64 = 0.03;
const BERRY_CHANCE: f64 = 0.08;

/// Which region cells to zoom into and how big the result is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRequest {
    /// Top-left region cell of the chunk
    pub chunk: GridPos,
    pub chunk_width: usize,
    pub chunk_height: usize,
    pub width: usize,
    pub height: usize,
}

/// Averages of the region cells a local map is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSummary {
    pub avg_elevation: f64,
    pub avg_moisture: f64,
    pub biome: Biome,
}

/// Average and majority biome of a chunk
///
/// Chunk cells outside the region are clamped to its edge.
pub fn summarize_chunk(region: &RegionMap, request: &LocalRequest) -> Option<ChunkSummary> {
    if region.is_empty() {
        return None;
    }
    let max_x = region.width() as i32 - 1;
    let max_y = region.height() as i32 - 1;

    let mut elevation = 0.0;
    let mut moisture = 0.0;
    let mut counts = [0usize; Biome::ALL.len()];
    let mut n = 0usize;
    for cy in 0..request.chunk_height as i32 {
        for cx in 0..request.chunk_width as i32 {
            let rx = (request.chunk.x + cx).clamp(0, max_x) as usize;
            let ry = (request.chunk.y + cy).clamp(0, max_y) as usize;
            if let Some(tile) = region.get(rx, ry) {
                elevation += tile.elevation;
                moisture += tile.moisture;
                if let Some(i) = Biome::ALL.iter().position(|&b| b == tile.biome) {
                    counts[i] += 1;
                }
                n += 1;
            }
        }
    }
    if n == 0 {
        return None;
    }

    // Majority biome; ties keep the earlier biome
    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }

    Some(ChunkSummary {
        avg_elevation: elevation / n as f64,
        avg_moisture: moisture / n as f64,
        biome: Biome::ALL[best],
    })
}

impl TieredWorldGenerator {
    /// Local tier from a chunk of region cells
    pub fn generate_local_map<R: Rng + ?Sized>(
        &self,
        region: &RegionMap,
        request: LocalRequest,
        rng: &mut R,
    ) -> Result<LocalMap> {
        if request.width == 0 || request.height == 0 {
            return Err(KingdomError::InvalidRequest(format!(
                "local map must be non-empty, got {}x{}",
                request.width, request.height
            )));
        }
        if request.chunk_width == 0 || request.chunk_height == 0 {
            return Err(KingdomError::InvalidRequest("chunk must be non-empty".into()));
        }
        let summary = summarize_chunk(region, &request).ok_or_else(|| {
            KingdomError::InvalidRequest("region map is empty".into())
        })?;
        let props = summary.biome.properties();

        info!(
            chunk_x = request.chunk.x,
            chunk_y = request.chunk.y,
            biome = %summary.biome,
            avg_elevation = summary.avg_elevation,
            "Generating local map"
        );

        let noise = self.noise();
        let offset_x = request.chunk.x as f64 * CHUNK_NOISE_OFFSET;
        let offset_y = request.chunk.y as f64 * CHUNK_NOISE_OFFSET;

        let tiles = TileGrid::from_fn(request.width, request.height, |x, y| {
            let nx = x as f64 + offset_x;
            let ny = y as f64 + offset_y;

            let elevation_noise =
                NoiseField::normalize(noise.octaves(NoiseChannel::Detail, nx, ny, 0.15, &ELEVATION_OCTAVES));
            let elevation = (summary.avg_elevation * 0.5 + elevation_noise * 0.5).clamp(0.0, 1.0);

            let moisture_noise =
                NoiseField::normalize(noise.sample(NoiseChannel::Rainfall, nx * 0.2, ny * 0.2));
            let moisture = (summary.avg_moisture * 0.4 + moisture_noise * 0.6).clamp(0.0, 1.0);

            LocalTile::new(classify_terrain(&props, elevation, moisture, &mut *rng))
        });

        let mut map = LocalMap::new(tiles);
        open_borders(&mut map.tiles);
        clear_spawn_block(&mut map.tiles);
        add_forest_clusters(&mut map.tiles, props.tree_density, rng);
        smooth_ponds(&mut map.tiles);
        place_resource_nodes(&mut map, rng);

        info!(
            width = request.width,
            height = request.height,
            nodes = map.nodes.len(),
            "Local map generated"
        );
        Ok(map)
    }
}

/// True inside the block guaranteed buildable at spawn
pub fn in_spawn_block(width: usize, height: usize, x: i32, y: i32) -> bool {
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32;
    (x - cx).abs() <= SPAWN_RADIUS && (y - cy).abs() <= SPAWN_RADIUS
}

/// Water on the outer ring becomes Grass so the map is never sealed
fn open_borders(tiles: &mut TileGrid<LocalTile>) {
    let (w, h) = (tiles.width(), tiles.height());
    for y in 0..h {
        for x in 0..w {
            if x != 0 && y != 0 && x != w - 1 && y != h - 1 {
                continue;
            }
            if let Some(tile) = tiles.get_mut(x, y) {
                if tile.terrain == TerrainType::Water {
                    tile.terrain = TerrainType::Grass;
                }
            }
        }
    }
}

fn clear_spawn_block(tiles: &mut TileGrid<LocalTile>) {
    let cx = (tiles.width() / 2) as i32;
    let cy = (tiles.height() / 2) as i32;
    for dy in -SPAWN_RADIUS..=SPAWN_RADIUS {
        for dx in -SPAWN_RADIUS..=SPAWN_RADIUS {
            if let Some(tile) = tiles.at_mut(GridPos::new(cx + dx, cy + dy)) {
                if !tile.terrain.is_buildable() {
                    tile.terrain = TerrainType::Grass;
                }
            }
        }
    }
}

/// Grow circular forest splotches from random Grass seeds
///
/// The spawn block is left untouched.
fn add_forest_clusters<R: Rng + ?Sized>(tiles: &mut TileGrid<LocalTile>, tree_density: f64, rng: &mut R) {
    if tree_density < 0.05 {
        return;
    }
    let (w, h) = (tiles.width(), tiles.height());
    let clusters = (20.0 * tree_density) as usize;
    let max_radius = ((8.0 * tree_density) as i32).max(3);

    let mut grown = 0;
    for _ in 0..clusters {
        let cx = rng.gen_range(0..w) as i32;
        let cy = rng.gen_range(0..h) as i32;
        let is_grass = tiles
            .at(GridPos::new(cx, cy))
            .map(|t| t.terrain == TerrainType::Grass)
            .unwrap_or(false);
        if !is_grass {
            continue;
        }

        let radius = rng.gen_range(3..=max_radius);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let pos = GridPos::new(cx + dx, cy + dy);
                if !tiles.in_bounds(pos) {
                    continue;
                }
                let distance = ((dx * dx + dy * dy) as f64).sqrt();
                if distance > radius as f64 || rng.gen::<f64>() <= 0.3 {
                    continue;
                }
                if in_spawn_block(w, h, pos.x, pos.y) {
                    continue;
                }
                if let Some(tile) = tiles.at_mut(pos) {
                    if tile.terrain == TerrainType::Grass {
                        tile.terrain = TerrainType::Forest;
                    }
                }
            }
        }
        grown += 1;
    }
    debug!(clusters, grown, "Forest clusters placed");
}

/// Interior single-tile ponds become Grass
///
/// Neighbours are read from a snapshot taken before the pass.
fn smooth_ponds(tiles: &mut TileGrid<LocalTile>) {
    let (w, h) = (tiles.width(), tiles.height());
    if w < 3 || h < 3 {
        return;
    }
    let snapshot: TileGrid<TerrainType> = TileGrid::from_fn(w, h, |x, y| {
        tiles.get(x, y).map(|t| t.terrain).unwrap_or_default()
    });
    let is_water = |x: usize, y: usize| snapshot.get(x, y) == Some(&TerrainType::Water);

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if !is_water(x, y) {
                continue;
            }
            let isolated =
                !is_water(x, y - 1) && !is_water(x, y + 1) && !is_water(x - 1, y) && !is_water(x + 1, y);
            if isolated {
                if let Some(tile) = tiles.get_mut(x, y) {
                    tile.terrain = TerrainType::Grass;
                }
            }
        }
    }
}

/// Trees on every Forest tile; stones and berry bushes scattered on open land
fn place_resource_nodes<R: Rng + ?Sized>(map: &mut LocalMap, rng: &mut R) {
    let (w, h) = (map.width(), map.height());
    for y in 0..h {
        for x in 0..w {
            let Some(terrain) = map.tiles.get(x, y).map(|t| t.terrain) else {
                continue;
            };
            let pos = GridPos::new(x as i32, y as i32);
            let node_type = match terrain {
                TerrainType::Forest => Some(ResourceNodeType::Tree),
                TerrainType::Grass | TerrainType::Dirt => {
                    let roll = rng.gen::<f64>();
                    if roll < STONE_CHANCE {
                        Some(ResourceNodeType::Stone)
                    } else if roll < BERRY_CHANCE {
                        Some(ResourceNodeType::BerryBush)
                    } else {
                        None
                    }
                }
                _ => None,
            };
            if let Some(node_type) = node_type {
                map.add_node(ResourceNode::new(node_type, pos));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tiles::RegionTile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat_region(biome: Biome, elevation: f64, moisture: f64) -> RegionMap {
        TileGrid::from_fn(10, 10, |x, y| RegionTile {
            position: GridPos::new(x as i32, y as i32),
            elevation,
            moisture,
            biome,
            terrain: TerrainType::Grass,
        })
    }

    fn request(width: usize, height: usize) -> LocalRequest {
        LocalRequest {
            chunk: GridPos::new(2, 2),
            chunk_width: 3,
            chunk_height: 3,
            width,
            height,
        }
    }

    #[test]
    fn test_chunk_summary_clamps_to_region() {
        let region = flat_region(Biome::Wetland, 0.4, 0.7);
        let req = LocalRequest {
            chunk: GridPos::new(50, -3),
            ..request(10, 10)
        };
        let summary = summarize_chunk(&region, &req).unwrap();
        assert_eq!(summary.biome, Biome::Wetland);
        assert!((summary.avg_elevation - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_majority_biome() {
        let mut region = flat_region(Biome::Grassland, 0.5, 0.5);
        for (x, y) in [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1)] {
            if let Some(t) = region.get_mut(x, y) {
                t.biome = Biome::Desert;
            }
        }
        let req = LocalRequest {
            chunk: GridPos::new(0, 0),
            ..request(10, 10)
        };
        assert_eq!(summarize_chunk(&region, &req).unwrap().biome, Biome::Desert);
    }

    #[test]
    fn test_low_chunk_still_playable() {
        let gen = TieredWorldGenerator::new(17);
        let region = flat_region(Biome::Wetland, 0.0, 0.9);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let map = gen.generate_local_map(&region, request(40, 30), &mut rng).unwrap();

        for (x, y, tile) in map.tiles.cells() {
            let border = x == 0 || y == 0 || x == 39 || y == 29;
            if border {
                assert_ne!(tile.terrain, TerrainType::Water, "water on border at ({x}, {y})");
            }
            if in_spawn_block(40, 30, x as i32, y as i32) {
                assert!(tile.terrain.is_buildable(), "spawn block tile {:?}", tile.terrain);
            }
        }
    }

    #[test]
    fn test_every_forest_tile_has_tree() {
        let gen = TieredWorldGenerator::new(3);
        let region = flat_region(Biome::TropicalRainforest, 0.5, 0.9);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let map = gen.generate_local_map(&region, request(50, 50), &mut rng).unwrap();

        let mut forests = 0;
        for tile in map.tiles.iter() {
            if tile.terrain == TerrainType::Forest {
                forests += 1;
                let node = tile.resource.and_then(|id| map.node(id)).unwrap();
                assert_eq!(node.node_type, ResourceNodeType::Tree);
            }
        }
        assert!(forests > 0);
        for node in &map.nodes {
            let terrain = map.terrain_at(node.position).unwrap();
            match node.node_type {
                ResourceNodeType::Tree => assert_eq!(terrain, TerrainType::Forest),
                _ => assert!(terrain.is_buildable()),
            }
        }
    }

    #[test]
    fn test_smooth_ponds_removes_single_tiles() {
        let mut tiles: TileGrid<LocalTile> = TileGrid::new(5, 5);
        tiles.set(2, 2, LocalTile::new(TerrainType::Water));
        tiles.set(1, 1, LocalTile::new(TerrainType::Water));
        tiles.set(1, 2, LocalTile::new(TerrainType::Water));
        smooth_ponds(&mut tiles);

        // (2,2) touches (1,2) so both survive; (1,1) touches (1,2)
        assert_eq!(tiles.get(2, 2).unwrap().terrain, TerrainType::Water);
        assert_eq!(tiles.get(1, 1).unwrap().terrain, TerrainType::Water);

        let mut lone: TileGrid<LocalTile> = TileGrid::new(5, 5);
        lone.set(3, 3, LocalTile::new(TerrainType::Water));
        smooth_ponds(&mut lone);
        assert_eq!(lone.get(3, 3).unwrap().terrain, TerrainType::Grass);
    }

    #[test]
    fn test_rejects_zero_sized_local_map() {
        let gen = TieredWorldGenerator::new(1);
        let region = flat_region(Biome::Grassland, 0.5, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(gen.generate_local_map(&region, request(0, 10), &mut rng).is_err());
    }
}
