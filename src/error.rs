//! Planner error taxonomy. Everything here is recoverable by the caller;
//! an unreachable goal is deliberately not an error (it is reported as an
//! empty path instead).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanningError {
    /// No obstacle records: grid bounds cannot be derived.
    #[error("no obstacle records to derive grid bounds from")]
    EmptyObstacleData,
    /// A record with non-finite coordinates or negative half-sizes, rejected
    /// before it can poison the grid bounds.
    #[error("obstacle record {index} has non-finite coordinates or negative half-sizes")]
    InvalidObstacle { index: usize },
    /// All obstacle footprints collapse to a zero-area grid.
    #[error("obstacle footprints collapse to an empty grid")]
    EmptyGrid,
    /// Start or goal outside the grid; the search does not defend against
    /// this, so it is rejected up front.
    #[error("cell ({north}, {east}) lies outside the {north_size}x{east_size} grid")]
    OutOfBounds {
        north: i32,
        east: i32,
        north_size: usize,
        east_size: usize,
    },
}
