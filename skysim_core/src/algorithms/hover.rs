// skysim_core/src/algorithms/hover.rs

use serde::Deserialize;

use super::{Algorithm, PdGains};
use crate::types::{ControlInput, PhysicsState, SensorData, Vec3};

/// Gains and baseline for the hover PD stack. The same block configures the
/// internal controller of the waypoint and path followers.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HoverGains {
    /// Lateral (XY) position loop.
    #[serde(default = "default_position_gains")]
    pub position_gains: PdGains,
    /// Altitude loop; its output is added to `hover_thrust`.
    #[serde(default = "default_altitude_gains")]
    pub altitude_gains: PdGains,
    /// Heading hold loop.
    #[serde(default = "default_yaw_gains")]
    pub yaw_gains: PdGains,
    /// Throttle fraction that roughly balances gravity.
    #[serde(default = "default_hover_thrust")]
    pub hover_thrust: f64,
}

impl Default for HoverGains {
    fn default() -> Self {
        Self {
            position_gains: default_position_gains(),
            altitude_gains: default_altitude_gains(),
            yaw_gains: default_yaw_gains(),
            hover_thrust: default_hover_thrust(),
        }
    }
}

fn default_position_gains() -> PdGains {
    PdGains::new(1.0, 0.5)
}
fn default_altitude_gains() -> PdGains {
    PdGains::new(2.0, 1.0)
}
fn default_yaw_gains() -> PdGains {
    PdGains::new(1.0, 0.1)
}
fn default_hover_thrust() -> f64 {
    0.6
}

/// PD station-keeping at a fixed target position.
///
/// Lateral commands come from the position error and its derivative,
/// thrust from the altitude pair plus the hover baseline, and a third PD
/// pair holds the heading.
#[derive(Debug, Clone)]
pub struct HoverController {
    target: Vec3,
    target_yaw: f64,
    gains: HoverGains,
    outputs: Vec<ControlInput>,
}

impl HoverController {
    pub fn new(target: Vec3, gains: HoverGains) -> Self {
        Self {
            target,
            target_yaw: 0.0,
            gains,
            outputs: Vec::new(),
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// The raw PD law toward an arbitrary point, without touching the
    /// output history. Wrapping controllers aim this at their own targets.
    pub fn control_toward(&self, target: &Vec3, state: &PhysicsState) -> ControlInput {
        let error = target - state.position;
        // The error derivative is the negated velocity: the target is fixed.
        let pitch = self
            .gains
            .position_gains
            .apply(error.x, -state.velocity.x);
        let roll = -self
            .gains
            .position_gains
            .apply(error.y, -state.velocity.y);
        let thrust = self.gains.hover_thrust
            + self
                .gains
                .altitude_gains
                .apply(error.z, -state.velocity.z);

        let yaw_error = wrap_angle(self.target_yaw - state.yaw());
        let yaw = self
            .gains
            .yaw_gains
            .apply(yaw_error, -state.angular_velocity.z);

        ControlInput::new(roll, pitch, yaw, thrust).clamp()
    }
}

/// Normalizes an angle difference into `[-PI, PI]`.
pub(crate) fn wrap_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

impl Algorithm for HoverController {
    fn name(&self) -> &str {
        "hover"
    }

    fn compute_control(
        &mut self,
        state: &PhysicsState,
        _sensors: &SensorData,
        _timestamp: f64,
    ) -> ControlInput {
        let control = self.control_toward(&self.target, state);
        self.outputs.push(control);
        control
    }

    fn reset(&mut self) {
        self.outputs.clear();
    }

    fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "target": [self.target.x, self.target.y, self.target.z],
            "outputs": self.outputs.len(),
        })
    }

    fn outputs(&self) -> &[ControlInput] {
        &self.outputs
    }
}
