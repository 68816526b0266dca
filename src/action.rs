//! The discrete move set: four axis-aligned moves of unit length and four
//! diagonal moves advancing ±1/√2 per axis, with costs 1 and √2.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use crate::{Cell, PlanningGrid};

/// One of the 8 symbolic moves. Each carries a fixed `(delta_north,
/// delta_east)` and a scalar cost; the set is closed, there is no way to
/// extend it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    West,
    East,
    North,
    South,
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::West,
        Action::East,
        Action::North,
        Action::South,
        Action::NorthWest,
        Action::NorthEast,
        Action::SouthWest,
        Action::SouthEast,
    ];

    /// `(delta_north, delta_east)` applied to the current cell. North is the
    /// decreasing grid index.
    pub fn delta(self) -> (f64, f64) {
        match self {
            Action::West => (0.0, -1.0),
            Action::East => (0.0, 1.0),
            Action::North => (-1.0, 0.0),
            Action::South => (1.0, 0.0),
            Action::NorthWest => (-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            Action::NorthEast => (-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            Action::SouthWest => (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
            Action::SouthEast => (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        }
    }

    pub fn cost(self) -> f64 {
        if self.diagonal() {
            SQRT_2
        } else {
            1.0
        }
    }

    pub fn diagonal(self) -> bool {
        matches!(
            self,
            Action::NorthWest | Action::NorthEast | Action::SouthWest | Action::SouthEast
        )
    }
}

/// The actions legal at `cell`: starts from all 8 and removes every move
/// whose destination is off-grid or occupied. A diagonal is also removed
/// whenever either of its two adjacent axis moves is removed, which keeps
/// the path from cutting corners between two orthogonally blocked cells.
///
/// Coordinates are rounded to the nearest integer before indexing; the
/// search hands in fractional cells, so the rounding here and in the grid
/// lookup must agree.
pub fn valid_actions(grid: &PlanningGrid, cell: &Cell) -> Vec<Action> {
    let n = cell.north;
    let e = cell.east;
    let north_limit = (grid.north_size() - 1) as f64;
    let east_limit = (grid.east_size() - 1) as f64;

    let north_blocked = n - 1.0 < 0.0 || grid.occupied_at(n - 1.0, e);
    let south_blocked = n + 1.0 > north_limit || grid.occupied_at(n + 1.0, e);
    let west_blocked = e - 1.0 < 0.0 || grid.occupied_at(n, e - 1.0);
    let east_blocked = e + 1.0 > east_limit || grid.occupied_at(n, e + 1.0);

    Action::ALL
        .iter()
        .copied()
        .filter(|action| match action {
            Action::West => !west_blocked,
            Action::East => !east_blocked,
            Action::North => !north_blocked,
            Action::South => !south_blocked,
            Action::NorthWest => !north_blocked && !west_blocked && open(grid, cell, *action),
            Action::NorthEast => !north_blocked && !east_blocked && open(grid, cell, *action),
            Action::SouthWest => !south_blocked && !west_blocked && open(grid, cell, *action),
            Action::SouthEast => !south_blocked && !east_blocked && open(grid, cell, *action),
        })
        .collect()
}

/// Destination-cell check for diagonals.
fn open(grid: &PlanningGrid, cell: &Cell, action: Action) -> bool {
    let destination = cell.apply(action);
    !grid.occupied_at(destination.north, destination.east)
}
