use grid_motion_planning::{load_colliders, PlanningGrid, DEFAULT_COLLINEARITY_TOLERANCE};
use grid_util::point::Point;

// Loads a colliders file given as the first argument, builds the occupancy
// grid at 5m with a 5m safety margin, picks the first open cell of the top
// row as the goal and plans from the grid center.

fn main() {
    let path = std::env::args().nth(1).expect("usage: colliders_route <colliders.csv>");
    let map = load_colliders(&path).expect("readable colliders file");
    println!("home reference: lat {}, lon {}", map.home.lat, map.home.lon);

    let grid = PlanningGrid::from_obstacles(&map.obstacles, 5.0, 5.0).expect("valid obstacles");
    println!(
        "{}x{} grid, offset ({}, {})",
        grid.north_size(),
        grid.east_size(),
        grid.north_offset(),
        grid.east_offset()
    );

    let start = Point::new(
        grid.north_size() as i32 / 2,
        grid.east_size() as i32 / 2,
    );
    let goal = grid.first_open_in_row(0).expect("an open cell on the top row");
    let waypoints = grid
        .plan(start, goal, DEFAULT_COLLINEARITY_TOLERANCE)
        .expect("start and goal in bounds");
    if waypoints.is_empty() {
        println!("no route from {} to {}", start, goal);
        return;
    }
    println!("Waypoints:");
    for waypoint in waypoints {
        println!("{}", waypoint);
    }
}
