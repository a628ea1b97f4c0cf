// skysim_core/src/algorithms/path_follow.rs

use super::hover::{HoverController, HoverGains};
use super::Algorithm;
use crate::types::{ControlInput, Path, PhysicsState, SensorData, Vec3};

/// Tracks a precomputed path with pure-pursuit lookahead.
///
/// Each tick the vehicle's projection onto the path is advanced, the first
/// point at or beyond `lookahead_distance` becomes the instantaneous
/// target, and the internal hover controller is aimed at it. The virtual
/// target is pulled in so the implied closing speed never exceeds
/// `max_speed`. Completion latches once the vehicle is within
/// `path_threshold` of the final waypoint.
#[derive(Debug, Clone)]
pub struct PathFollowingController {
    path: Path,
    lookahead_distance: f64,
    path_threshold: f64,
    max_speed: f64,
    hover: HoverController,
    current_index: usize,
    path_complete: bool,
    outputs: Vec<ControlInput>,
}

impl PathFollowingController {
    pub fn new(
        path: Path,
        lookahead_distance: f64,
        path_threshold: f64,
        max_speed: f64,
        gains: HoverGains,
    ) -> Self {
        let initial_target = path.first().copied().unwrap_or_else(Vec3::zeros);
        Self {
            path_complete: path.is_empty(),
            path,
            lookahead_distance,
            path_threshold,
            max_speed,
            hover: HoverController::new(initial_target, gains),
            current_index: 0,
            outputs: Vec::new(),
        }
    }

    /// Installs a freshly planned path and restarts traversal.
    pub fn set_path(&mut self, path: Path) {
        self.path_complete = path.is_empty();
        self.path = path;
        self.current_index = 0;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_complete(&self) -> bool {
        self.path_complete
    }

    /// Traversal progress for logging/CLI layers.
    pub fn path_status(&self) -> serde_json::Value {
        serde_json::json!({
            "path_complete": self.path_complete,
            "current_index": self.current_index,
            "path_length": self.path.len(),
        })
    }

    /// Moves the projection index forward while the next path point is
    /// closer to the vehicle than the current one.
    fn advance_projection(&mut self, position: &Vec3) {
        while self.current_index + 1 < self.path.len() {
            let here = (self.path[self.current_index] - position).norm();
            let next = (self.path[self.current_index + 1] - position).norm();
            if next < here {
                self.current_index += 1;
            } else {
                break;
            }
        }
    }

    /// First path point at or beyond the lookahead distance, measured from
    /// the vehicle; the final point when the remaining path is shorter.
    fn lookahead_target(&self, position: &Vec3) -> Vec3 {
        for point in &self.path[self.current_index..] {
            if (point - position).norm() >= self.lookahead_distance {
                return *point;
            }
        }
        *self.path.last().expect("non-empty path")
    }
}

impl Algorithm for PathFollowingController {
    fn name(&self) -> &str {
        "path_follow"
    }

    fn compute_control(
        &mut self,
        state: &PhysicsState,
        _sensors: &SensorData,
        _timestamp: f64,
    ) -> ControlInput {
        let target = if self.path.is_empty() {
            state.position
        } else {
            let goal = *self.path.last().expect("non-empty path");
            if (goal - state.position).norm() < self.path_threshold {
                self.path_complete = true;
            }
            if self.path_complete {
                goal
            } else {
                self.advance_projection(&state.position);
                let carrot = self.lookahead_target(&state.position);
                // Pull the target in so the commanded closing speed stays
                // below max_speed.
                let offset = carrot - state.position;
                let distance = offset.norm();
                if distance > self.max_speed && distance > 0.0 {
                    state.position + offset * (self.max_speed / distance)
                } else {
                    carrot
                }
            }
        };

        let control = self.hover.control_toward(&target, state);
        self.outputs.push(control);
        control
    }

    fn reset(&mut self) {
        self.current_index = 0;
        self.path_complete = self.path.is_empty();
        self.outputs.clear();
        self.hover.reset();
    }

    fn status(&self) -> serde_json::Value {
        let mut status = self.path_status();
        status["lookahead_distance"] = self.lookahead_distance.into();
        status["max_speed"] = self.max_speed.into();
        status
    }

    fn outputs(&self) -> &[ControlInput] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_path() -> Path {
        (0..=10).map(|i| Vec3::new(i as f64, 0.0, 5.0)).collect()
    }

    fn controller() -> PathFollowingController {
        PathFollowingController::new(straight_path(), 3.0, 1.0, 2.0, HoverGains::default())
    }

    fn state_at(position: Vec3) -> PhysicsState {
        PhysicsState::at_rest(position, Vec3::zeros(), 0.0)
    }

    #[test]
    fn pursues_a_point_ahead_on_the_path() {
        let mut pf = controller();
        let control = pf.compute_control(
            &state_at(Vec3::new(0.0, 0.0, 5.0)),
            &SensorData::default(),
            0.0,
        );
        // The carrot is ahead in +x, so the vehicle pitches forward.
        assert!(control.pitch > 0.0);
        assert!(!pf.path_complete());
    }

    #[test]
    fn projection_advances_with_the_vehicle() {
        let mut pf = controller();
        pf.compute_control(&state_at(Vec3::new(4.2, 0.0, 5.0)), &SensorData::default(), 0.0);
        assert_eq!(pf.path_status()["current_index"], serde_json::json!(4));
    }

    #[test]
    fn completion_latches_near_the_goal() {
        let mut pf = controller();
        pf.compute_control(&state_at(Vec3::new(9.8, 0.0, 5.0)), &SensorData::default(), 0.0);
        assert!(pf.path_complete());
        // Drift away: the latch holds.
        pf.compute_control(&state_at(Vec3::new(0.0, 0.0, 5.0)), &SensorData::default(), 0.1);
        assert!(pf.path_complete());
    }

    #[test]
    fn replanning_restarts_traversal() {
        let mut pf = controller();
        pf.compute_control(&state_at(Vec3::new(9.8, 0.0, 5.0)), &SensorData::default(), 0.0);
        assert!(pf.path_complete());
        pf.set_path(vec![Vec3::new(0.0, 5.0, 5.0), Vec3::new(0.0, 10.0, 5.0)]);
        assert!(!pf.path_complete());
        assert_eq!(pf.path_status()["current_index"], serde_json::json!(0));
    }
}
