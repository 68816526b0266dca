use grid_motion_planning::{ObstacleRecord, PlanningGrid, DEFAULT_COLLINEARITY_TOLERANCE};
use grid_util::point::Point;

// In this demo a route is planned across a 10x10 field with shape
//  ____
// |S   |
// | ## |
// | ## |
// |   G|
//  ____
// where
// - # marks cells blocked by a tower at flight altitude
// - S marks the start
// - G marks the goal
//
// The flat slab fixes the field bounds; the tower in the middle is the only
// thing tall enough to matter at 5m.

fn main() {
    let records = [
        ObstacleRecord::new(5.0, 5.0, 1.0, 5.0, 5.0, 1.0),
        ObstacleRecord::new(4.5, 4.5, 20.0, 0.5, 0.5, 20.0),
    ];
    let grid = PlanningGrid::from_obstacles(&records, 5.0, 0.0).unwrap();
    println!("{}", grid);

    let start = Point::new(0, 0);
    let goal = Point::new(9, 9);
    let waypoints = grid
        .plan(start, goal, DEFAULT_COLLINEARITY_TOLERANCE)
        .unwrap();
    println!("Waypoints:");
    for waypoint in waypoints {
        println!("{}", waypoint);
    }
}
