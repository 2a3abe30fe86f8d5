//! A* pathfinding over the local tile grid
//!
//! Eight-way movement, diagonal steps cost √2, Euclidean heuristic.
//! Building footprints are passed in as an obstacle set; the goal tile is
//! always exempt from it so citizens can step onto the building they serve.

use ahash::AHashSet;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::core::types::GridPos;

/// Expansion budget used when the caller has no opinion
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Terrain view the pathfinder searches over
pub trait NavGrid {
    fn nav_width(&self) -> usize;
    fn nav_height(&self) -> usize;
    /// Terrain-only walkability (buildings are handled separately)
    fn is_passable(&self, pos: GridPos) -> bool;

    fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.nav_width()
            && (pos.y as usize) < self.nav_height()
    }
}

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    pos: GridPos,
    f_cost: OrderedFloat<f32>,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.pos == other.pos
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| (other.pos.y, other.pos.x).cmp(&(self.pos.y, self.pos.x)))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(a: GridPos, b: GridPos) -> f32 {
    let dx = (b.x - a.x) as f32;
    let dy = (b.y - a.y) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Find a path from `start` to `goal`, both inclusive
///
/// Returns None if either end is out of bounds, no route exists, or the
/// search expands more than `max_iterations` nodes. Callers treat None as
/// "stand still and retry".
pub fn find_path<G: NavGrid + ?Sized>(
    grid: &G,
    obstacles: &AHashSet<GridPos>,
    start: GridPos,
    goal: GridPos,
    max_iterations: usize,
) -> Option<Vec<GridPos>> {
    if !grid.contains(start) || !grid.contains(goal) {
        return None;
    }

    if start == goal {
        return Some(vec![start]);
    }

    let walkable =
        |pos: GridPos| grid.is_passable(pos) && (pos == goal || !obstacles.contains(&pos));

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_scores: HashMap<GridPos, f32> = HashMap::new();
    let mut closed: HashSet<GridPos> = HashSet::new();

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        pos: start,
        f_cost: OrderedFloat(heuristic(start, goal)),
    });

    let mut iterations = 0;
    while let Some(current) = open_set.pop() {
        if iterations >= max_iterations {
            return None;
        }
        iterations += 1;

        if current.pos == goal {
            return Some(reconstruct_path(&came_from, current.pos));
        }

        if !closed.insert(current.pos) {
            continue;
        }

        let current_g = *g_scores.get(&current.pos).unwrap_or(&f32::INFINITY);

        for (dx, dy) in NEIGHBORS {
            let neighbor = GridPos::new(current.pos.x + dx, current.pos.y + dy);
            if !grid.contains(neighbor) || closed.contains(&neighbor) || !walkable(neighbor) {
                continue;
            }

            let step = if dx != 0 && dy != 0 {
                std::f32::consts::SQRT_2
            } else {
                1.0
            };
            let tentative_g = current_g + step;
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);
                open_set.push(PathNode {
                    pos: neighbor,
                    f_cost: OrderedFloat(tentative_g + heuristic(neighbor, goal)),
                });
            }
        }
    }

    None
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &HashMap<GridPos, GridPos>, mut current: GridPos) -> Vec<GridPos> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Sum of step costs along a path
pub fn path_cost(path: &[GridPos]) -> f32 {
    path.windows(2)
        .map(|w| {
            if w[0].x != w[1].x && w[0].y != w[1].y {
                std::f32::consts::SQRT_2
            } else {
                1.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::grid::TileGrid;

    /// `true` marks an impassable (water) cell
    impl NavGrid for TileGrid<bool> {
        fn nav_width(&self) -> usize {
            self.width()
        }
        fn nav_height(&self) -> usize {
            self.height()
        }
        fn is_passable(&self, pos: GridPos) -> bool {
            self.at(pos).map(|blocked| !blocked).unwrap_or(false)
        }
    }

    fn open_grid(w: usize, h: usize) -> TileGrid<bool> {
        TileGrid::new(w, h)
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = open_grid(5, 5);
        let p = GridPos::new(2, 2);
        let path = find_path(&grid, &AHashSet::new(), p, p, DEFAULT_MAX_ITERATIONS);
        assert_eq!(path, Some(vec![p]));
    }

    #[test]
    fn test_diagonal_is_optimal() {
        let grid = open_grid(10, 10);
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(5, 5);
        let path = find_path(&grid, &AHashSet::new(), start, goal, DEFAULT_MAX_ITERATIONS)
            .unwrap();

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path.len(), 6);
        assert!((path_cost(&path) - 5.0 * std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn test_routes_around_water() {
        let mut grid = open_grid(10, 10);
        for y in 0..8 {
            grid.set(5, y, true);
        }
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(9, 0);
        let path = find_path(&grid, &AHashSet::new(), start, goal, DEFAULT_MAX_ITERATIONS)
            .unwrap();

        assert!(path.iter().all(|p| grid.is_passable(*p)));
        assert!(path.iter().any(|p| p.y >= 8));
    }

    #[test]
    fn test_no_path_through_wall() {
        let mut grid = open_grid(10, 10);
        for y in 0..10 {
            grid.set(5, y, true);
        }
        let path = find_path(
            &grid,
            &AHashSet::new(),
            GridPos::new(0, 0),
            GridPos::new(9, 9),
            DEFAULT_MAX_ITERATIONS,
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_goal_exempt_from_obstacles() {
        let grid = open_grid(10, 10);
        let mut obstacles = AHashSet::new();
        for y in 3..6 {
            for x in 3..6 {
                obstacles.insert(GridPos::new(x, y));
            }
        }
        let goal = GridPos::new(3, 3);
        let path = find_path(&grid, &obstacles, GridPos::new(0, 0), goal, DEFAULT_MAX_ITERATIONS)
            .unwrap();

        assert_eq!(path.last(), Some(&goal));
        for p in &path[..path.len() - 1] {
            assert!(!obstacles.contains(p));
        }

        // Interior tiles are not reachable through the footprint
        let interior = find_path(
            &grid,
            &obstacles,
            GridPos::new(0, 0),
            GridPos::new(4, 4),
            DEFAULT_MAX_ITERATIONS,
        );
        assert!(interior.is_none());
    }

    #[test]
    fn test_out_of_bounds_returns_none() {
        let grid = open_grid(5, 5);
        let none = AHashSet::new();
        assert!(find_path(&grid, &none, GridPos::new(-1, 0), GridPos::new(2, 2), 100).is_none());
        assert!(find_path(&grid, &none, GridPos::new(0, 0), GridPos::new(5, 2), 100).is_none());
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let grid = open_grid(100, 100);
        let path = find_path(
            &grid,
            &AHashSet::new(),
            GridPos::new(0, 0),
            GridPos::new(99, 99),
            5,
        );
        assert!(path.is_none());
    }
}
