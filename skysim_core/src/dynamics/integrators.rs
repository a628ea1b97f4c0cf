// skysim_core/src/dynamics/integrators.rs

use nalgebra::{Quaternion, UnitQuaternion};
use serde::Deserialize;

use super::QuadrotorDynamics;
use crate::types::{ControlInput, PhysicsState, Vec3};

/// Advances the rigid-body state by one fixed timestep under a constant
/// control input.
pub trait Integrator: std::fmt::Debug + Send + Sync {
    fn step(
        &self,
        dynamics: &QuadrotorDynamics,
        state: &PhysicsState,
        input: &ControlInput,
        dt: f64,
    ) -> PhysicsState;
}

/// Which integration scheme the simulator runs. Scenario files select this
/// by name; the default is the scheme the rest of the system is tuned for.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Velocity from current forces, then position from the new velocity.
    /// Stable at small fixed timesteps without the cost of higher-order
    /// schemes.
    #[default]
    SemiImplicitEuler,
    Rk4,
}

impl IntegratorKind {
    pub fn build(self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::SemiImplicitEuler => Box::new(SemiImplicitEuler),
            IntegratorKind::Rk4 => Box::new(Rk4),
        }
    }
}

#[derive(Debug, Default)]
pub struct SemiImplicitEuler;

impl Integrator for SemiImplicitEuler {
    fn step(
        &self,
        dynamics: &QuadrotorDynamics,
        state: &PhysicsState,
        input: &ControlInput,
        dt: f64,
    ) -> PhysicsState {
        let acceleration = dynamics.linear_acceleration(state, input);
        let velocity = state.velocity + acceleration * dt;
        let position = state.position + velocity * dt;

        let angular_acceleration = dynamics.angular_acceleration(state, input);
        let angular_velocity =
            dynamics.clamp_rates(state.angular_velocity + angular_acceleration * dt);
        // Body-frame rates rotate the attitude from the right.
        let orientation = state.orientation
            * UnitQuaternion::from_scaled_axis(angular_velocity * dt);

        PhysicsState {
            position,
            velocity,
            orientation,
            angular_velocity,
            timestamp: state.timestamp + dt,
        }
    }
}

#[derive(Debug, Default)]
pub struct Rk4;

/// Time derivative of the full state. The attitude derivative is kept as a
/// raw quaternion so stage results can be combined linearly; the final
/// attitude is re-normalized.
struct Derivative {
    velocity: Vec3,
    acceleration: Vec3,
    orientation_dot: Quaternion<f64>,
    angular_acceleration: Vec3,
}

impl Integrator for Rk4 {
    fn step(
        &self,
        dynamics: &QuadrotorDynamics,
        state: &PhysicsState,
        input: &ControlInput,
        dt: f64,
    ) -> PhysicsState {
        let eval = |s: &PhysicsState| -> Derivative {
            let omega = s.angular_velocity;
            let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
            Derivative {
                velocity: s.velocity,
                acceleration: dynamics.linear_acceleration(s, input),
                orientation_dot: s.orientation.into_inner() * omega_quat * 0.5,
                angular_acceleration: dynamics.angular_acceleration(s, input),
            }
        };
        let advance = |k: &Derivative, h: f64| -> PhysicsState {
            let q = state.orientation.into_inner() + k.orientation_dot * h;
            PhysicsState {
                position: state.position + k.velocity * h,
                velocity: state.velocity + k.acceleration * h,
                orientation: UnitQuaternion::from_quaternion(q),
                angular_velocity: state.angular_velocity + k.angular_acceleration * h,
                timestamp: state.timestamp + h,
            }
        };

        let k1 = eval(state);
        let k2 = eval(&advance(&k1, dt / 2.0));
        let k3 = eval(&advance(&k2, dt / 2.0));
        let k4 = eval(&advance(&k3, dt));

        let sixth = dt / 6.0;
        let combine = |a: Vec3, b: Vec3, c: Vec3, d: Vec3| (a + 2.0 * b + 2.0 * c + d) * sixth;

        let orientation_dot =
            (k1.orientation_dot + k2.orientation_dot * 2.0 + k3.orientation_dot * 2.0
                + k4.orientation_dot)
                * sixth;
        let orientation = UnitQuaternion::from_quaternion(
            state.orientation.into_inner() + orientation_dot,
        );

        PhysicsState {
            position: state.position
                + combine(k1.velocity, k2.velocity, k3.velocity, k4.velocity),
            velocity: state.velocity
                + combine(
                    k1.acceleration,
                    k2.acceleration,
                    k3.acceleration,
                    k4.acceleration,
                ),
            orientation,
            angular_velocity: dynamics.clamp_rates(
                state.angular_velocity
                    + combine(
                        k1.angular_acceleration,
                        k2.angular_acceleration,
                        k3.angular_acceleration,
                        k4.angular_acceleration,
                    ),
            ),
            timestamp: state.timestamp + dt,
        }
    }
}
