// skysim_core/src/algorithms/waypoint.rs

use super::hover::{HoverController, HoverGains};
use super::Algorithm;
use crate::types::{ControlInput, PhysicsState, SensorData, Vec3};

/// Flies an ordered waypoint list by aiming an internal hover controller at
/// the current waypoint and advancing once the vehicle is within
/// `waypoint_threshold` of it.
///
/// `mission_complete` latches true when the final waypoint has been reached
/// and is never retracted, even if the vehicle later drifts away.
#[derive(Debug, Clone)]
pub struct WaypointFollower {
    waypoints: Vec<Vec3>,
    waypoint_threshold: f64,
    hover: HoverController,
    current_index: usize,
    mission_complete: bool,
    outputs: Vec<ControlInput>,
}

impl WaypointFollower {
    pub fn new(waypoints: Vec<Vec3>, waypoint_threshold: f64, gains: HoverGains) -> Self {
        let initial_target = waypoints.first().copied().unwrap_or_else(Vec3::zeros);
        Self {
            mission_complete: waypoints.is_empty(),
            waypoints,
            waypoint_threshold,
            hover: HoverController::new(initial_target, gains),
            current_index: 0,
            outputs: Vec::new(),
        }
    }

    pub fn mission_complete(&self) -> bool {
        self.mission_complete
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Mission progress for logging/CLI layers.
    pub fn mission_status(&self) -> serde_json::Value {
        serde_json::json!({
            "mission_complete": self.mission_complete,
            "current_waypoint": self.current_index,
            "total_waypoints": self.waypoints.len(),
        })
    }

    /// Station-keeping target once the list is exhausted: the final
    /// waypoint, or wherever the vehicle is for an empty mission.
    fn terminal_target(&self, state: &PhysicsState) -> Vec3 {
        self.waypoints.last().copied().unwrap_or(state.position)
    }
}

impl Algorithm for WaypointFollower {
    fn name(&self) -> &str {
        "waypoint"
    }

    fn compute_control(
        &mut self,
        state: &PhysicsState,
        _sensors: &SensorData,
        _timestamp: f64,
    ) -> ControlInput {
        let target = if self.mission_complete {
            self.terminal_target(state)
        } else {
            let waypoint = self.waypoints[self.current_index];
            if (waypoint - state.position).norm() < self.waypoint_threshold {
                if self.current_index + 1 < self.waypoints.len() {
                    self.current_index += 1;
                } else {
                    // Final waypoint reached: latch, never retract.
                    self.mission_complete = true;
                }
            }
            self.waypoints[self.current_index]
        };

        let control = self.hover.control_toward(&target, state);
        self.outputs.push(control);
        control
    }

    fn reset(&mut self) {
        self.current_index = 0;
        self.mission_complete = self.waypoints.is_empty();
        self.outputs.clear();
        self.hover.reset();
    }

    fn status(&self) -> serde_json::Value {
        let mut status = self.mission_status();
        status["waypoint_threshold"] = self.waypoint_threshold.into();
        status
    }

    fn outputs(&self) -> &[ControlInput] {
        &self.outputs
    }
}
