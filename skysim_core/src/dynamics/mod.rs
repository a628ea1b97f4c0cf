// skysim_core/src/dynamics/mod.rs

pub mod integrators;

use crate::spec::DroneSpec;
use crate::types::{ControlInput, PhysicsState, Vec3};

/// Yaw authority relative to roll/pitch: rotor drag torque is far weaker
/// than differential thrust at the arm.
const YAW_TORQUE_RATIO: f64 = 0.1;

/// Converts normalized control inputs plus a `DroneSpec` into body forces
/// and torques.
///
/// Torque coefficients are derived once from the spec at construction; a
/// changed spec requires a new instance (see `Simulator::reinitialize`).
#[derive(Debug, Clone)]
pub struct QuadrotorDynamics {
    spec: DroneSpec,
    gravity: f64,
    /// Peak roll/pitch torque from differential thrust at the arm, N·m.
    max_torque_rp: f64,
    max_torque_yaw: f64,
    /// Per-axis rate damping, sized so the steady-state rate under full
    /// command equals `max_angular_velocity`.
    rate_damping: Vec3,
}

impl QuadrotorDynamics {
    pub fn new(spec: DroneSpec, gravity: f64) -> Self {
        let max_torque_rp = spec.max_thrust * spec.arm_length / 2.0;
        let max_torque_yaw = max_torque_rp * YAW_TORQUE_RATIO;
        let rate_damping = Vec3::new(
            max_torque_rp / spec.max_angular_velocity,
            max_torque_rp / spec.max_angular_velocity,
            max_torque_yaw / spec.max_angular_velocity,
        );
        Self {
            spec,
            gravity,
            max_torque_rp,
            max_torque_yaw,
            rate_damping,
        }
    }

    pub fn spec(&self) -> &DroneSpec {
        &self.spec
    }

    /// World-frame linear acceleration: thrust along the body-up axis scaled
    /// by `max_thrust`, velocity-proportional drag, and gravity.
    pub fn linear_acceleration(&self, state: &PhysicsState, input: &ControlInput) -> Vec3 {
        let thrust_body = Vec3::new(0.0, 0.0, input.thrust * self.spec.max_thrust);
        let thrust_world = state.orientation * thrust_body;
        let drag = -self.spec.drag_coefficient * state.velocity;
        (thrust_world + drag) / self.spec.mass + Vec3::new(0.0, 0.0, -self.gravity)
    }

    /// Body-frame angular acceleration from commanded torque minus rate
    /// damping, divided by the principal moments of inertia.
    pub fn angular_acceleration(&self, state: &PhysicsState, input: &ControlInput) -> Vec3 {
        let torque = Vec3::new(
            input.roll * self.max_torque_rp,
            input.pitch * self.max_torque_rp,
            input.yaw * self.max_torque_yaw,
        );
        let inertia = &self.spec.moment_of_inertia;
        let omega = &state.angular_velocity;
        Vec3::new(
            (torque.x - self.rate_damping.x * omega.x) / inertia.x,
            (torque.y - self.rate_damping.y * omega.y) / inertia.y,
            (torque.z - self.rate_damping.z * omega.z) / inertia.z,
        )
    }

    /// Per-axis clamp to the spec's angular rate limit.
    pub fn clamp_rates(&self, rates: Vec3) -> Vec3 {
        let limit = self.spec.max_angular_velocity;
        Vec3::new(
            rates.x.clamp(-limit, limit),
            rates.y.clamp(-limit, limit),
            rates.z.clamp(-limit, limit),
        )
    }
}
