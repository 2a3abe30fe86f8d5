//! Building placement rules on the local map

use thiserror::Error;

use crate::city::building::{Building, BuildingType};
use crate::core::types::{BuildingId, GridPos};
use crate::spatial::grid::TileGrid;
use crate::world::terrain::TerrainType;
use crate::world::tiles::LocalTile;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("buildings can only be placed in the local view")]
    WrongView,
    #[error("footprint at ({x}, {y}) leaves the map")]
    OutOfBounds { x: i32, y: i32 },
    #[error("footprint overlaps building {0}")]
    Overlap(u32),
    #[error("cannot build on {terrain:?} at ({x}, {y})")]
    UnbuildableTerrain { x: i32, y: i32, terrain: TerrainType },
}

/// Check that a footprint fits, sits on buildable terrain and overlaps nothing
pub fn check_placement<'a>(
    tiles: &TileGrid<LocalTile>,
    buildings: impl IntoIterator<Item = &'a Building>,
    building_type: BuildingType,
    position: GridPos,
) -> Result<(), PlacementError> {
    let (w, h) = building_type.size();
    // Widened so far-off positions cannot overflow
    let right = i64::from(position.x) + i64::from(w);
    let bottom = i64::from(position.y) + i64::from(h);
    if position.x < 0 || position.y < 0 || right > tiles.width() as i64 || bottom > tiles.height() as i64 {
        return Err(PlacementError::OutOfBounds {
            x: position.x,
            y: position.y,
        });
    }

    for dy in 0..h {
        for dx in 0..w {
            let pos = GridPos::new(position.x + dx, position.y + dy);
            let terrain = tiles
                .at(pos)
                .map(|t| t.terrain)
                .ok_or(PlacementError::OutOfBounds { x: pos.x, y: pos.y })?;
            if !terrain.accepts_building() {
                return Err(PlacementError::UnbuildableTerrain {
                    x: pos.x,
                    y: pos.y,
                    terrain,
                });
            }
        }
    }

    let candidate = Building::new(BuildingId(u32::MAX), building_type, position);
    for existing in buildings {
        if existing.overlaps(&candidate) {
            return Err(PlacementError::Overlap(existing.id.0));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grass(w: usize, h: usize) -> TileGrid<LocalTile> {
        TileGrid::new(w, h)
    }

    #[test]
    fn test_valid_placement() {
        let tiles = grass(10, 10);
        assert!(check_placement(&tiles, &[], BuildingType::House, GridPos::new(2, 2)).is_ok());
    }

    #[test]
    fn test_out_of_bounds() {
        let tiles = grass(10, 10);
        assert!(matches!(
            check_placement(&tiles, &[], BuildingType::House, GridPos::new(8, 0)),
            Err(PlacementError::OutOfBounds { .. })
        ));
        assert!(matches!(
            check_placement(&tiles, &[], BuildingType::Well, GridPos::new(-1, 0)),
            Err(PlacementError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_far_positions_rejected_without_overflow() {
        let tiles = grass(10, 10);
        for pos in [
            GridPos::new(i32::MAX - 1, 0),
            GridPos::new(0, i32::MAX),
            GridPos::new(i32::MIN, i32::MIN),
        ] {
            assert!(matches!(
                check_placement(&tiles, &[], BuildingType::House, pos),
                Err(PlacementError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn test_terrain_rules() {
        let mut tiles = grass(10, 10);
        tiles.set(3, 3, LocalTile::new(TerrainType::Water));
        tiles.set(6, 6, LocalTile::new(TerrainType::Sand));

        assert!(matches!(
            check_placement(&tiles, &[], BuildingType::House, GridPos::new(2, 2)),
            Err(PlacementError::UnbuildableTerrain {
                terrain: TerrainType::Water,
                ..
            })
        ));
        assert!(check_placement(&tiles, &[], BuildingType::Well, GridPos::new(6, 6)).is_ok());
    }

    #[test]
    fn test_overlap_rejected() {
        let tiles = grass(10, 10);
        let existing = vec![Building::new(BuildingId(7), BuildingType::House, GridPos::new(0, 0))];
        assert_eq!(
            check_placement(&tiles, &existing, BuildingType::Well, GridPos::new(2, 2)),
            Err(PlacementError::Overlap(7))
        );
        assert!(check_placement(&tiles, &existing, BuildingType::Well, GridPos::new(3, 0)).is_ok());
    }
}
