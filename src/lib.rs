//! # grid_motion_planning
//!
//! A grid-based motion planner for flight at a fixed altitude. Rectangular
//! 3-D obstacle records are flattened into a binary
//! [occupancy grid](https://en.wikipedia.org/wiki/Occupancy_grid_mapping)
//! inflated by a safety margin, the grid is searched with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) over an
//! 8-connected move set, and the resulting cell path is compressed into
//! turn-only waypoints by collinearity pruning. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! over free cells to avoid flood-filling behaviour if no path exists.
pub mod action;
mod astar;
pub mod colliders;
pub mod error;
pub mod prune;

use grid_util::grid::{BoolGrid, Grid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;

use core::fmt;

pub use crate::action::{valid_actions, Action};
pub use crate::astar::{a_star, euclidean, Cost, GOAL_TOLERANCE};
pub use crate::colliders::{load_colliders, parse_colliders, ColliderMap, HomePosition};
pub use crate::error::PlanningError;
pub use crate::prune::{prune_path, DEFAULT_COLLINEARITY_TOLERANCE};

/// A rectangular prism obstacle centered at `(north, east, alt)` with the
/// given half-sizes along each axis, in local metric coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObstacleRecord {
    pub north: f64,
    pub east: f64,
    pub alt: f64,
    pub half_north: f64,
    pub half_east: f64,
    pub half_alt: f64,
}

impl ObstacleRecord {
    pub fn new(
        north: f64,
        east: f64,
        alt: f64,
        half_north: f64,
        half_east: f64,
        half_alt: f64,
    ) -> ObstacleRecord {
        ObstacleRecord {
            north,
            east,
            alt,
            half_north,
            half_east,
            half_alt,
        }
    }

    /// All coordinates finite and half-sizes non-negative.
    pub fn is_valid(&self) -> bool {
        let fields = [
            self.north,
            self.east,
            self.alt,
            self.half_north,
            self.half_east,
            self.half_alt,
        ];
        fields.iter().all(|v| v.is_finite())
            && self.half_north >= 0.0
            && self.half_east >= 0.0
            && self.half_alt >= 0.0
    }

    /// Whether the obstacle stays below the flight altitude with margin to
    /// spare, in which case it leaves no mark on the grid.
    fn below(&self, target_altitude: f64, safety_distance: f64) -> bool {
        self.alt + self.half_alt + safety_distance <= target_altitude
    }
}

/// A grid coordinate pair. Integer-valued at start and goal, but fractional
/// in general: diagonal moves advance by ±1/√2 per axis. Occupancy lookups
/// round to the nearest integer cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub north: f64,
    pub east: f64,
}

impl Cell {
    pub fn new(north: f64, east: f64) -> Cell {
        Cell { north, east }
    }

    pub fn from_point(p: Point) -> Cell {
        Cell::new(f64::from(p.x), f64::from(p.y))
    }

    /// Nearest integer grid cell.
    pub fn rounded(&self) -> Point {
        Point::new(self.north.round() as i32, self.east.round() as i32)
    }

    /// Euclidean distance to another cell.
    pub fn distance(&self, other: &Cell) -> f64 {
        let dn = self.north - other.north;
        let de = self.east - other.east;
        (dn * dn + de * de).sqrt()
    }

    /// Destination cell after applying an action.
    pub fn apply(&self, action: Action) -> Cell {
        let (dn, de) = action.delta();
        Cell::new(self.north + dn, self.east + de)
    }

    /// Visited-state identity used by the search: the cell scaled by 2 and
    /// rounded, so destinations within half a grid unit of each other
    /// collapse into one state.
    pub fn visit_key(&self) -> (i64, i64) {
        (
            (self.north * 2.0).round() as i64,
            (self.east * 2.0).round() as i64,
        )
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.north, self.east)
    }
}

/// A commanded target pose in the offset-corrected metric frame, rounded to
/// integers as the vehicle-command layer expects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub north: i64,
    pub east: i64,
    pub altitude: f64,
    pub heading: f64,
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.north, self.east, self.altitude, self.heading
        )
    }
}

/// [PlanningGrid] is a binary occupancy map of the airspace at one target
/// altitude, indexed `[north][east]`, together with the integer offsets that
/// map local metric coordinates to grid indices
/// (`grid_index = floor(metric) - offset`). It also maintains a [UnionFind]
/// over free cells so that queries between separated regions can be ruled
/// out without running a search. Dimensions and occupancy are fixed at
/// construction.
#[derive(Clone, Debug)]
pub struct PlanningGrid {
    grid: BoolGrid,
    north_offset: i64,
    east_offset: i64,
    target_altitude: f64,
    components: UnionFind<usize>,
}

impl PlanningGrid {
    /// Builds the occupancy grid for a flight altitude and safety margin.
    ///
    /// Grid bounds are the floor/ceil of the extreme obstacle footprint
    /// coordinates, independent of altitude. An obstacle marks cells only if
    /// its vertical extent plus the safety margin exceeds `target_altitude`;
    /// the marked footprint is inflated by `safety_distance` in north and
    /// east and clamped to the grid. Cells never marked are guaranteed
    /// traversable at that altitude under the stated margin.
    ///
    /// Records with non-finite coordinates or negative half-sizes are
    /// rejected here rather than propagated into the grid bounds.
    pub fn from_obstacles(
        obstacles: &[ObstacleRecord],
        target_altitude: f64,
        safety_distance: f64,
    ) -> Result<PlanningGrid, PlanningError> {
        if obstacles.is_empty() {
            return Err(PlanningError::EmptyObstacleData);
        }
        for (index, record) in obstacles.iter().enumerate() {
            if !record.is_valid() {
                return Err(PlanningError::InvalidObstacle { index });
            }
        }

        let mut north_min = f64::INFINITY;
        let mut north_max = f64::NEG_INFINITY;
        let mut east_min = f64::INFINITY;
        let mut east_max = f64::NEG_INFINITY;
        for record in obstacles {
            north_min = north_min.min(record.north - record.half_north);
            north_max = north_max.max(record.north + record.half_north);
            east_min = east_min.min(record.east - record.half_east);
            east_max = east_max.max(record.east + record.half_east);
        }
        let north_min = north_min.floor();
        let east_min = east_min.floor();
        let north_size = (north_max.ceil() - north_min) as usize;
        let east_size = (east_max.ceil() - east_min) as usize;
        if north_size == 0 || east_size == 0 {
            return Err(PlanningError::EmptyGrid);
        }

        let mut grid = BoolGrid::new(north_size, east_size, false);
        for record in obstacles {
            if record.below(target_altitude, safety_distance) {
                continue;
            }
            let inflate_north = record.half_north + safety_distance;
            let inflate_east = record.half_east + safety_distance;
            let n0 = clamp_index(record.north - inflate_north - north_min, north_size);
            let n1 = clamp_index(record.north + inflate_north - north_min, north_size);
            let e0 = clamp_index(record.east - inflate_east - east_min, east_size);
            let e1 = clamp_index(record.east + inflate_east - east_min, east_size);
            for n in n0..=n1 {
                for e in e0..=e1 {
                    grid.set(n, e, true);
                }
            }
        }
        info!(
            "built {}x{} grid, offset ({}, {})",
            north_size, east_size, north_min, east_min
        );
        Ok(PlanningGrid::from_parts(
            grid,
            north_min as i64,
            east_min as i64,
            target_altitude,
        ))
    }

    /// Assembles a planning grid from an existing occupancy grid and offsets,
    /// generating the free-cell components.
    pub fn from_parts(
        grid: BoolGrid,
        north_offset: i64,
        east_offset: i64,
        target_altitude: f64,
    ) -> PlanningGrid {
        let mut planning_grid = PlanningGrid {
            grid,
            north_offset,
            east_offset,
            target_altitude,
            components: UnionFind::new(0),
        };
        planning_grid.generate_components();
        planning_grid
    }

    pub fn grid(&self) -> &BoolGrid {
        &self.grid
    }

    pub fn north_offset(&self) -> i64 {
        self.north_offset
    }

    pub fn east_offset(&self) -> i64 {
        self.east_offset
    }

    pub fn target_altitude(&self) -> f64 {
        self.target_altitude
    }

    /// Grid extent along the north axis.
    pub fn north_size(&self) -> usize {
        self.grid.width
    }

    /// Grid extent along the east axis.
    pub fn east_size(&self) -> usize {
        self.grid.height
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && self.grid.index_in_bounds(p.x as usize, p.y as usize)
    }

    /// Occupancy at fractional grid coordinates: rounds to the nearest cell
    /// first. Anything outside the grid counts as blocked.
    pub fn occupied_at(&self, north: f64, east: f64) -> bool {
        let p = Point::new(north.round() as i32, east.round() as i32);
        !self.in_bounds(p) || self.grid.get_point(p)
    }

    /// First unoccupied column in a grid row; a cheap way to pick a goal on
    /// the map edge.
    pub fn first_open_in_row(&self, row: i32) -> Option<Point> {
        (0..self.grid.height as i32)
            .map(|col| Point::new(row, col))
            .find(|p| self.in_bounds(*p) && !self.grid.get_point(*p))
    }

    /// Conservative reachability test: [true] only when neither the goal nor
    /// any of its neighbours shares a component with the start, in which case
    /// no search (including its near-goal tolerance) can succeed. A start
    /// inside an obstacle is left to the search.
    pub fn goal_unreachable(&self, start: &Point, goal: &Point) -> bool {
        if !self.in_bounds(*start) || !self.in_bounds(*goal) {
            return true;
        }
        if self.grid.get_point(*start) {
            return false;
        }
        let start_ix = self.grid.get_ix(start.x as usize, start.y as usize);
        let mut candidates = goal.moore_neighborhood();
        candidates.push(*goal);
        !candidates.iter().any(|p| {
            self.in_bounds(*p)
                && !self.grid.get_point(*p)
                && self
                    .components
                    .equiv(start_ix, self.grid.get_ix(p.x as usize, p.y as usize))
        })
    }

    /// Generates a new [UnionFind] structure and links every free cell to its
    /// free neighbours. Unions cover the full 8-neighbourhood (both diagonals)
    /// so that any chain of search moves stays within one component.
    fn generate_components(&mut self) {
        let w = self.grid.width;
        let h = self.grid.height;
        self.components = UnionFind::new(w * h);
        for x in 0..w {
            for y in 0..h {
                if !self.grid.get(x, y) {
                    let parent_ix = self.grid.get_ix(x, y);
                    let point = Point::new(x as i32, y as i32);
                    let neighbours = vec![
                        Point::new(point.x, point.y + 1),
                        Point::new(point.x + 1, point.y),
                        Point::new(point.x + 1, point.y + 1),
                        Point::new(point.x + 1, point.y - 1),
                    ]
                    .into_iter()
                    .filter(|p| self.in_bounds(*p) && !self.grid.get_point(*p))
                    .map(|p| self.grid.get_ix(p.x as usize, p.y as usize))
                    .collect::<Vec<usize>>();
                    for ix in neighbours {
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }

    /// Searches for a minimum-cost cell path from `start` to `goal` with the
    /// [euclidean] heuristic. Out-of-bounds endpoints are rejected up front;
    /// an exhausted search yields an empty path with zero cost, which callers
    /// must check for.
    pub fn find_path(&self, start: Point, goal: Point) -> Result<(Vec<Cell>, f64), PlanningError> {
        for endpoint in [start, goal] {
            if !self.in_bounds(endpoint) {
                return Err(PlanningError::OutOfBounds {
                    north: endpoint.x,
                    east: endpoint.y,
                    north_size: self.grid.width,
                    east_size: self.grid.height,
                });
            }
        }
        if self.goal_unreachable(&start, &goal) {
            info!("{} and {} are on different components", start, goal);
            return Ok((Vec::new(), 0.0));
        }
        Ok(a_star(self, euclidean, start, goal))
    }

    /// Converts a cell path into offset-corrected integer waypoints at the
    /// grid's target altitude, heading zero.
    pub fn to_waypoints(&self, path: &[Cell]) -> Vec<Waypoint> {
        path.iter()
            .map(|cell| Waypoint {
                north: (cell.north + self.north_offset as f64).round() as i64,
                east: (cell.east + self.east_offset as f64).round() as i64,
                altitude: self.target_altitude,
                heading: 0.0,
            })
            .collect()
    }

    /// Full planning pass: search, prune collinear runs at the given
    /// tolerance, convert to waypoints. An unreachable goal yields an empty
    /// waypoint list.
    pub fn plan(
        &self,
        start: Point,
        goal: Point,
        prune_tolerance: f64,
    ) -> Result<Vec<Waypoint>, PlanningError> {
        let (path, _cost) = self.find_path(start, goal)?;
        if path.is_empty() {
            return Ok(Vec::new());
        }
        let pruned = prune_path(&path, prune_tolerance);
        info!("pruned path of {} cells down to {}", path.len(), pruned.len());
        Ok(self.to_waypoints(&pruned))
    }
}

fn clamp_index(value: f64, size: usize) -> usize {
    value.clamp(0.0, (size - 1) as f64) as usize
}

impl fmt::Display for PlanningGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Grid {}x{}, offset ({}, {}):",
            self.grid.width, self.grid.height, self.north_offset, self.east_offset
        )?;
        for x in 0..self.grid.width {
            let values = (0..self.grid.height)
                .map(|y| self.grid.get(x, y) as i32)
                .collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tall(north: f64, east: f64, half_north: f64, half_east: f64) -> ObstacleRecord {
        ObstacleRecord::new(north, east, 50.0, half_north, half_east, 50.0)
    }

    fn low(north: f64, east: f64, half_north: f64, half_east: f64) -> ObstacleRecord {
        ObstacleRecord::new(north, east, 1.0, half_north, half_east, 1.0)
    }

    #[test]
    fn bounds_and_offsets_from_footprints() {
        let grid =
            PlanningGrid::from_obstacles(&[tall(10.0, 20.0, 5.0, 5.0)], 10.0, 0.0).unwrap();
        assert_eq!(grid.north_size(), 10);
        assert_eq!(grid.east_size(), 10);
        assert_eq!(grid.north_offset(), 5);
        assert_eq!(grid.east_offset(), 15);
        // A single obstacle spanning the whole grid occupies every cell.
        for n in 0..10 {
            for e in 0..10 {
                assert!(grid.grid().get(n, e));
            }
        }
    }

    #[test]
    fn obstacle_below_altitude_leaves_no_mark() {
        let grid =
            PlanningGrid::from_obstacles(&[low(10.0, 10.0, 10.0, 10.0)], 50.0, 5.0).unwrap();
        assert_eq!(grid.north_size(), 20);
        assert_eq!(grid.east_size(), 20);
        for n in 0..20 {
            for e in 0..20 {
                assert!(!grid.grid().get(n, e));
            }
        }
    }

    #[test]
    fn safety_distance_inflates_footprint() {
        // A low, wide base fixes the bounds at 0..10 on both axes; the thin
        // tower at the center marks its inflated footprint only.
        let records = [low(5.0, 5.0, 5.0, 5.0), tall(5.0, 5.0, 0.5, 0.5)];
        let grid = PlanningGrid::from_obstacles(&records, 5.0, 1.0).unwrap();
        for (n, e) in [(3, 3), (4, 4), (5, 5), (6, 6), (3, 6)] {
            assert!(grid.grid().get(n, e), "({}, {}) should be inflated", n, e);
        }
        for (n, e) in [(2, 2), (7, 7), (0, 5), (5, 8)] {
            assert!(!grid.grid().get(n, e), "({}, {}) should stay free", n, e);
        }
    }

    #[test]
    fn degenerate_records_are_rejected() {
        let mut bad = tall(0.0, 0.0, 1.0, 1.0);
        bad.half_east = -1.0;
        assert!(matches!(
            PlanningGrid::from_obstacles(&[bad], 5.0, 0.0),
            Err(PlanningError::InvalidObstacle { index: 0 })
        ));
        let mut nan = tall(0.0, 0.0, 1.0, 1.0);
        nan.north = f64::NAN;
        assert!(matches!(
            PlanningGrid::from_obstacles(&[tall(0.0, 0.0, 1.0, 1.0), nan], 5.0, 0.0),
            Err(PlanningError::InvalidObstacle { index: 1 })
        ));
        assert!(matches!(
            PlanningGrid::from_obstacles(&[], 5.0, 0.0),
            Err(PlanningError::EmptyObstacleData)
        ));
    }

    #[test]
    fn waypoints_are_offset_corrected_and_rounded() {
        let grid =
            PlanningGrid::from_obstacles(&[low(10.0, 20.0, 5.0, 5.0)], 30.0, 0.0).unwrap();
        assert_eq!(grid.north_offset(), 5);
        assert_eq!(grid.east_offset(), 15);
        let path = [Cell::new(0.0, 0.0), Cell::new(0.707, 3.0)];
        let waypoints = grid.to_waypoints(&path);
        assert_eq!(waypoints.len(), 2);
        assert_eq!((waypoints[0].north, waypoints[0].east), (5, 15));
        assert_eq!((waypoints[1].north, waypoints[1].east), (6, 18));
        for waypoint in &waypoints {
            assert_eq!(waypoint.altitude, 30.0);
            assert_eq!(waypoint.heading, 0.0);
        }
    }

    #[test]
    fn first_open_in_row_skips_occupied_columns() {
        let mut grid = BoolGrid::new(3, 4, false);
        grid.set(0, 0, true);
        grid.set(0, 1, true);
        let grid = PlanningGrid::from_parts(grid, 0, 0, 5.0);
        assert_eq!(grid.first_open_in_row(0), Some(Point::new(0, 2)));
        assert_eq!(grid.first_open_in_row(1), Some(Point::new(1, 0)));
    }

    #[test]
    fn component_filter_detects_split_grid() {
        // A full wall across the middle row separates the two halves.
        let mut grid = BoolGrid::new(9, 9, false);
        for e in 0..9 {
            grid.set(4, e, true);
        }
        let grid = PlanningGrid::from_parts(grid, 0, 0, 5.0);
        assert!(grid.goal_unreachable(&Point::new(0, 0), &Point::new(8, 8)));
        assert!(!grid.goal_unreachable(&Point::new(0, 0), &Point::new(0, 8)));
        let (path, cost) = grid.find_path(Point::new(0, 0), Point::new(8, 8)).unwrap();
        assert!(path.is_empty());
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn out_of_bounds_endpoints_are_rejected() {
        let grid =
            PlanningGrid::from_obstacles(&[low(5.0, 5.0, 5.0, 5.0)], 50.0, 0.0).unwrap();
        assert!(matches!(
            grid.find_path(Point::new(0, 0), Point::new(10, 0)),
            Err(PlanningError::OutOfBounds { .. })
        ));
        assert!(matches!(
            grid.find_path(Point::new(-1, 0), Point::new(0, 0)),
            Err(PlanningError::OutOfBounds { .. })
        ));
    }
}
