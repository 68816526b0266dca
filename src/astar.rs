use fxhash::FxBuildHasher;
/// This module implements a variant of
/// [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html)
/// in which visited states are identified by a caller-supplied quantization
/// key rather than by the node itself, as the fractional-cell search
/// requires.
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

use log::{info, warn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;
use std::ops::Add;

use grid_util::point::Point;

use crate::action::valid_actions;
use crate::{Cell, PlanningGrid};

/// The search declares success once a popped node is within this Euclidean
/// distance of the goal: the goal counts as reached within one grid cell.
pub const GOAL_TOLERANCE: f64 = 1.0;

/// A path cost. Wraps [f64] with the total order non-NaN costs admit so the
/// frontier can be a [BinaryHeap].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cost(pub f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, other: Cost) -> Cost {
        Cost(self.0 + other.0)
    }
}

impl Zero for Cost {
    fn zero() -> Cost {
        Cost(0.0)
    }

    fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

struct SmallestCostHolder<K> {
    estimated_cost: K,
    cost: K,
    index: usize,
}

impl<K: PartialEq> Eq for SmallestCostHolder<K> {}

impl<K: PartialEq> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.cost.eq(&other.cost)
    }
}

impl<K: Ord> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // First orders per estimated cost, then creates subordering
        // based on cost, favoring exploration of smallest cost nodes first
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => self.cost.cmp(&other.cost),
            s => s,
        }
    }
}

fn reverse_path<N, K, C>(parents: &FxIndexMap<K, (usize, N, C)>, start: usize) -> Vec<N>
where
    N: Clone,
    K: Eq + Hash,
{
    let mut path: Vec<N> = itertools::unfold(start, |i| {
        parents.get_index(*i).map(|(_, value)| {
            *i = value.0;
            value.1.clone()
        })
    })
    .collect();
    path.reverse();
    path
}

/// Best-first search whose visited set is keyed by `quantize(node)` instead
/// of the node itself: two nodes mapping to the same key are one state, the
/// first one enqueued wins, and later routes into that state are dropped
/// even when they are cheaper. With [Cell::visit_key] (scale by 2, round)
/// diagonal chains accumulate irrational offsets that almost never collide
/// in the key, so the dedup degrades to a coarse filter there; this affects
/// node-expansion counts, not which goals are reachable.
pub(crate) fn astar_quantized<N, K, C, FN, IN, FH, FS, FK>(
    start: &N,
    mut successors: FN,
    mut heuristic: FH,
    mut success: FS,
    mut quantize: FK,
) -> Option<(Vec<N>, C)>
where
    N: Clone,
    K: Eq + Hash,
    C: Zero + Ord + Copy,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = (N, C)>,
    FH: FnMut(&N) -> C,
    FS: FnMut(&N) -> bool,
    FK: FnMut(&N) -> K,
{
    let mut to_see = BinaryHeap::new();
    to_see.push(SmallestCostHolder {
        estimated_cost: Zero::zero(),
        cost: Zero::zero(),
        index: 0,
    });
    let mut parents: FxIndexMap<K, (usize, N, C)> = FxIndexMap::default();
    parents.insert(quantize(start), (usize::MAX, start.clone(), Zero::zero()));
    while let Some(SmallestCostHolder { cost, index, .. }) = to_see.pop() {
        let node = {
            let (_, value) = parents.get_index(index).unwrap();
            value.1.clone()
        };
        if success(&node) {
            let path = reverse_path(&parents, index);
            return Some((path, cost));
        }
        for (successor, move_cost) in successors(&node) {
            let new_cost = cost + move_cost;
            let h;
            let n;
            match parents.entry(quantize(&successor)) {
                Vacant(e) => {
                    h = heuristic(&successor);
                    n = e.index();
                    e.insert((index, successor, new_cost));
                }
                Occupied(_) => {
                    continue;
                }
            }

            to_see.push(SmallestCostHolder {
                estimated_cost: new_cost + h,
                cost: new_cost,
                index: n,
            });
        }
    }
    None
}

/// Euclidean distance between two cells; admissible and consistent for the
/// move set, so the search is optimal over the states it explores.
pub fn euclidean(a: &Cell, b: &Cell) -> f64 {
    a.distance(b)
}

/// Runs A* over the grid from `start` to `goal` and returns the cell path
/// (start and near-goal node inclusive) with its cumulative action cost.
///
/// The goal counts as reached within [GOAL_TOLERANCE] of its center. If the
/// frontier empties first, the result is an empty path with zero cost;
/// callers check for the empty path rather than an error.
pub fn a_star<H>(grid: &PlanningGrid, heuristic: H, start: Point, goal: Point) -> (Vec<Cell>, f64)
where
    H: Fn(&Cell, &Cell) -> f64,
{
    let start_cell = Cell::from_point(start);
    let goal_cell = Cell::from_point(goal);
    let result = astar_quantized(
        &start_cell,
        |cell| {
            valid_actions(grid, cell)
                .into_iter()
                .map(|action| (cell.apply(action), Cost(action.cost())))
                .collect::<Vec<_>>()
        },
        |cell| Cost(heuristic(cell, &goal_cell)),
        |cell| cell.distance(&goal_cell) < GOAL_TOLERANCE,
        Cell::visit_key,
    );
    match result {
        Some((path, cost)) => {
            info!("found a path of {} cells, cost {}", path.len(), cost.0);
            (path, cost.0)
        }
        None => {
            warn!("failed to find a path from {} to {}", start, goal);
            (Vec::new(), 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_util::grid::{BoolGrid, Grid};

    fn open_grid(size: usize) -> PlanningGrid {
        PlanningGrid::from_parts(BoolGrid::new(size, size, false), 0, 0, 5.0)
    }

    #[test]
    fn straight_line_is_optimal() {
        let grid = open_grid(10);
        let (path, cost) = a_star(&grid, euclidean, Point::new(0, 0), Point::new(0, 5));
        assert_eq!(path.len(), 6);
        assert!((cost - 5.0).abs() < 1e-9);
        for (i, cell) in path.iter().enumerate() {
            assert_eq!(cell.rounded(), Point::new(0, i as i32));
        }
    }

    #[test]
    fn start_within_tolerance_of_goal() {
        let grid = open_grid(3);
        let (path, cost) = a_star(&grid, euclidean, Point::new(1, 1), Point::new(1, 1));
        assert_eq!(path.len(), 1);
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn enclosed_goal_exhausts_frontier() {
        let mut grid = BoolGrid::new(7, 7, false);
        for (n, e) in [
            (2, 2),
            (2, 3),
            (2, 4),
            (3, 2),
            (3, 4),
            (4, 2),
            (4, 3),
            (4, 4),
        ] {
            grid.set(n, e, true);
        }
        let grid = PlanningGrid::from_parts(grid, 0, 0, 5.0);
        let (path, cost) = a_star(&grid, euclidean, Point::new(0, 0), Point::new(3, 3));
        assert!(path.is_empty());
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let mut grid = BoolGrid::new(12, 12, false);
        for e in 2..10 {
            grid.set(5, e, true);
        }
        let grid = PlanningGrid::from_parts(grid, 0, 0, 5.0);
        let (first, first_cost) = a_star(&grid, euclidean, Point::new(0, 5), Point::new(11, 5));
        let (second, second_cost) = a_star(&grid, euclidean, Point::new(0, 5), Point::new(11, 5));
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(first_cost, second_cost);
    }

    #[test]
    fn path_endpoints_and_occupancy() {
        let mut grid = BoolGrid::new(10, 10, false);
        for e in 0..7 {
            grid.set(4, e, true);
        }
        let grid = PlanningGrid::from_parts(grid, 0, 0, 5.0);
        let start = Point::new(0, 0);
        let goal = Point::new(9, 0);
        let (path, cost) = a_star(&grid, euclidean, start, goal);
        assert!(!path.is_empty());
        assert!(cost > 0.0);
        assert_eq!(path[0], Cell::from_point(start));
        let last = path.last().unwrap();
        assert!(last.distance(&Cell::from_point(goal)) < GOAL_TOLERANCE);
        for cell in &path {
            assert!(
                !grid.occupied_at(cell.north, cell.east),
                "path visits blocked cell {}",
                cell
            );
        }
    }
}
