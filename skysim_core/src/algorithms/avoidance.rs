// skysim_core/src/algorithms/avoidance.rs

use super::Algorithm;
use crate::types::{ControlInput, PhysicsState, SensorData, Vec3};

/// Reactive LiDAR-based obstacle avoidance layered over a goal-seeking
/// base controller.
///
/// Every beam shorter than `avoidance_distance` contributes a repulsion
/// `avoidance_strength * (avoidance_distance - range)` directed opposite
/// the beam. The summed repulsion is capped at `max_avoidance_force`,
/// mapped into attitude deltas, and added to the base output. In open
/// space the output equals the base controller's.
#[derive(Debug)]
pub struct ObstacleAvoidance {
    base: Box<dyn Algorithm>,
    avoidance_distance: f64,
    avoidance_strength: f64,
    max_avoidance_force: f64,
    outputs: Vec<ControlInput>,
}

impl ObstacleAvoidance {
    pub fn new(
        base: Box<dyn Algorithm>,
        avoidance_distance: f64,
        avoidance_strength: f64,
        max_avoidance_force: f64,
    ) -> Self {
        Self {
            base,
            avoidance_distance,
            avoidance_strength,
            max_avoidance_force,
            outputs: Vec::new(),
        }
    }

    pub fn base(&self) -> &dyn Algorithm {
        self.base.as_ref()
    }

    /// Summed world-frame repulsion from all beams inside the avoidance
    /// radius, capped at `max_avoidance_force`.
    fn repulsion(&self, sensors: &SensorData) -> Vec3 {
        let Some(scan) = &sensors.lidar else {
            return Vec3::zeros();
        };
        let mut total = Vec3::zeros();
        for (index, &range) in scan.ranges.iter().enumerate() {
            if range < self.avoidance_distance {
                let push = self.avoidance_strength * (self.avoidance_distance - range);
                total -= scan.beam_direction(index) * push;
            }
        }
        let magnitude = total.norm();
        if magnitude > self.max_avoidance_force {
            total * (self.max_avoidance_force / magnitude)
        } else {
            total
        }
    }
}

impl Algorithm for ObstacleAvoidance {
    fn name(&self) -> &str {
        "obstacle_avoidance"
    }

    fn compute_control(
        &mut self,
        state: &PhysicsState,
        sensors: &SensorData,
        timestamp: f64,
    ) -> ControlInput {
        let base = self.base.compute_control(state, sensors, timestamp);
        let repulsion = self.repulsion(sensors);

        // Same sign convention as the hover PD: +x maps to pitch, +y to
        // negative roll.
        let control = ControlInput::new(
            base.roll - repulsion.y,
            base.pitch + repulsion.x,
            base.yaw,
            base.thrust + repulsion.z,
        )
        .clamp();

        self.outputs.push(control);
        control
    }

    fn reset(&mut self) {
        self.base.reset();
        self.outputs.clear();
    }

    fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "avoidance_distance": self.avoidance_distance,
            "avoidance_strength": self.avoidance_strength,
            "max_avoidance_force": self.max_avoidance_force,
            "base": self.base.status(),
        })
    }

    fn outputs(&self) -> &[ControlInput] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::hover::{HoverController, HoverGains};
    use crate::types::LidarScan;
    use approx::assert_abs_diff_eq;

    fn avoidance() -> ObstacleAvoidance {
        let base = HoverController::new(Vec3::new(20.0, 0.0, 5.0), HoverGains::default());
        ObstacleAvoidance::new(Box::new(base), 4.0, 3.0, 0.8)
    }

    fn scan_with_forward_hit(range: f64) -> SensorData {
        // Four beams: +x, +y, -x, -y. The obstacle sits dead ahead.
        let mut ranges = vec![10.0; 4];
        ranges[0] = range;
        SensorData {
            lidar: Some(LidarScan {
                ranges,
                max_range: 10.0,
                field_of_view: std::f64::consts::TAU,
                yaw: 0.0,
            }),
            ..SensorData::default()
        }
    }

    fn state() -> PhysicsState {
        PhysicsState::at_rest(Vec3::new(0.0, 0.0, 5.0), Vec3::zeros(), 0.0)
    }

    #[test]
    fn pushes_away_from_a_close_obstacle() {
        let mut combined = avoidance();
        let mut bare = HoverController::new(Vec3::new(20.0, 0.0, 5.0), HoverGains::default());

        let with_obstacle = combined.compute_control(&state(), &scan_with_forward_hit(2.0), 0.0);
        let baseline = bare.compute_control(&state(), &SensorData::default(), 0.0);

        // Obstacle ahead on +x: the repulsion points along -x, reducing
        // the forward pitch command.
        assert!(with_obstacle.pitch < baseline.pitch);
    }

    #[test]
    fn passthrough_in_open_space() {
        let mut combined = avoidance();
        let mut bare = HoverController::new(Vec3::new(20.0, 0.0, 5.0), HoverGains::default());

        let open = combined.compute_control(&state(), &scan_with_forward_hit(9.0), 0.0);
        let baseline = bare.compute_control(&state(), &SensorData::default(), 0.0);
        assert_eq!(open, baseline);

        // No LiDAR at all behaves the same way.
        let absent = combined.compute_control(&state(), &SensorData::default(), 0.1);
        assert_eq!(absent, baseline);
    }

    #[test]
    fn repulsion_magnitude_is_capped() {
        let combined = avoidance();
        // Point-blank hit: uncapped repulsion would be 3 * 4 = 12.
        let repulsion = combined.repulsion(&scan_with_forward_hit(0.0));
        assert_abs_diff_eq!(repulsion.norm(), 0.8, epsilon = 1e-12);
        assert!(repulsion.x < 0.0);
    }

    #[test]
    fn opposing_beams_cancel() {
        let combined = avoidance();
        let mut ranges = vec![10.0; 4];
        ranges[0] = 2.0; // +x
        ranges[2] = 2.0; // -x
        let sensors = SensorData {
            lidar: Some(LidarScan {
                ranges,
                max_range: 10.0,
                field_of_view: std::f64::consts::TAU,
                yaw: 0.0,
            }),
            ..SensorData::default()
        };
        let repulsion = combined.repulsion(&sensors);
        assert_abs_diff_eq!(repulsion.norm(), 0.0, epsilon = 1e-12);
    }
}
