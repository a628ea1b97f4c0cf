// skysim_sim/src/catalog.rs

use skysim_core::algorithms::hover::HoverController;
use skysim_core::algorithms::{
    Algorithm, ObstacleAvoidance, PathFollowingController, WaypointFollower,
};
use skysim_core::planning::GridPlanner;
use skysim_core::simulator::Simulator;
use skysim_core::types::Vec3;
use tracing::info;

use crate::scenario::AlgorithmConfig;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("waypoint mission has no waypoints")]
    EmptyWaypointList,
    #[error(transparent)]
    Planning(#[from] skysim_core::planning::PlanningError),
    /// Unreachability is a normal planner outcome; at the CLI boundary the
    /// chosen recovery is to abort the mission before takeoff.
    #[error("no path from {from:?} to {goal:?} at the configured resolution")]
    NoPathFound { from: Vec3, goal: Vec3 },
}

/// Instantiates the algorithm a scenario selects. Path-following plans its
/// route here, once, against the simulator's environment.
pub fn build_algorithm(
    config: &AlgorithmConfig,
    simulator: &Simulator,
) -> Result<Box<dyn Algorithm>, CatalogError> {
    match config {
        AlgorithmConfig::Hover {
            target_position,
            gains,
        } => Ok(Box::new(HoverController::new(*target_position, *gains))),

        AlgorithmConfig::Waypoint {
            waypoints,
            waypoint_threshold,
            gains,
        } => {
            if waypoints.is_empty() {
                return Err(CatalogError::EmptyWaypointList);
            }
            let waypoints = waypoints
                .iter()
                .map(|w| Vec3::new(w[0], w[1], w[2]))
                .collect();
            Ok(Box::new(WaypointFollower::new(
                waypoints,
                *waypoint_threshold,
                *gains,
            )))
        }

        AlgorithmConfig::PathFollow {
            goal,
            lookahead_distance,
            path_threshold,
            max_speed,
            grid_resolution,
            safety_radius,
            gains,
        } => {
            let start = simulator.state().position;
            let planner =
                GridPlanner::new(simulator.environment(), *grid_resolution, *safety_radius)?;
            let path = planner
                .find_path(&start, goal)
                .ok_or(CatalogError::NoPathFound { from: start, goal: *goal })?;
            info!(waypoints = path.len(), "planned route to goal");
            Ok(Box::new(PathFollowingController::new(
                path,
                *lookahead_distance,
                *path_threshold,
                *max_speed,
                *gains,
            )))
        }

        AlgorithmConfig::ObstacleAvoidance {
            target_position,
            avoidance_distance,
            avoidance_strength,
            max_avoidance_force,
            gains,
        } => {
            let base = HoverController::new(*target_position, *gains);
            Ok(Box::new(ObstacleAvoidance::new(
                Box::new(base),
                *avoidance_distance,
                *avoidance_strength,
                *max_avoidance_force,
            )))
        }
    }
}

/// The strategy the algorithm steers toward, when it has one. Used by the
/// front end to stop the run once the goal is reached.
pub fn goal_of(config: &AlgorithmConfig) -> Option<(Vec3, f64)> {
    match config {
        AlgorithmConfig::Hover { .. } => None,
        AlgorithmConfig::Waypoint {
            waypoints,
            waypoint_threshold,
            ..
        } => waypoints
            .last()
            .map(|w| (Vec3::new(w[0], w[1], w[2]), *waypoint_threshold)),
        AlgorithmConfig::PathFollow {
            goal,
            path_threshold,
            ..
        } => Some((*goal, *path_threshold)),
        AlgorithmConfig::ObstacleAvoidance {
            target_position, ..
        } => Some((*target_position, 3.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use skysim_core::config::ObstacleConfig;

    fn simulator() -> Simulator {
        let scenario: Scenario = toml::from_str("").unwrap();
        Simulator::new(scenario.simulator_config()).unwrap()
    }

    #[test]
    fn builds_every_registered_kind() {
        let sim = simulator();
        let configs = [
            toml::from_str::<AlgorithmConfig>(
                "kind = \"hover\"\ntarget_position = [0.0, 0.0, 5.0]",
            )
            .unwrap(),
            toml::from_str::<AlgorithmConfig>(
                "kind = \"waypoint\"\nwaypoints = [[0.0, 0.0, 5.0]]",
            )
            .unwrap(),
            toml::from_str::<AlgorithmConfig>(
                "kind = \"path_follow\"\ngoal = [10.0, 10.0, 5.0]",
            )
            .unwrap(),
            toml::from_str::<AlgorithmConfig>(
                "kind = \"obstacle_avoidance\"\ntarget_position = [10.0, 0.0, 5.0]",
            )
            .unwrap(),
        ];
        for config in &configs {
            let algorithm = build_algorithm(config, &sim).unwrap();
            assert_eq!(algorithm.name(), config.kind());
        }
    }

    #[test]
    fn empty_waypoint_list_is_rejected() {
        let sim = simulator();
        let config =
            toml::from_str::<AlgorithmConfig>("kind = \"waypoint\"\nwaypoints = []").unwrap();
        assert!(matches!(
            build_algorithm(&config, &sim),
            Err(CatalogError::EmptyWaypointList)
        ));
    }

    #[test]
    fn unreachable_goal_aborts_before_takeoff() {
        let scenario: Scenario = toml::from_str("").unwrap();
        let mut config = scenario.simulator_config();
        // Wall off the entire volume along x.
        config.obstacles.push(ObstacleConfig::Box {
            position: Vec3::new(10.0, 0.0, 10.0),
            dimensions: Vec3::new(4.0, 100.0, 40.0),
        });
        let sim = Simulator::new(config).unwrap();
        let algorithm = toml::from_str::<AlgorithmConfig>(
            "kind = \"path_follow\"\ngoal = [30.0, 0.0, 5.0]",
        )
        .unwrap();
        assert!(matches!(
            build_algorithm(&algorithm, &sim),
            Err(CatalogError::NoPathFound { .. })
        ));
    }
}
