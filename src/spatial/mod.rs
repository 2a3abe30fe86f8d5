//! Spatial primitives - tile grids and pathfinding

pub mod grid;
pub mod pathfinding;

pub use grid::TileGrid;
pub use pathfinding::{find_path, NavGrid, DEFAULT_MAX_ITERATIONS};
