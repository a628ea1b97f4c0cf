// skysim_core/src/algorithms/mod.rs

pub mod avoidance;
pub mod hover;
pub mod path_follow;
pub mod waypoint;

use serde::Deserialize;

use crate::types::{ControlInput, PhysicsState, SensorData};

pub use avoidance::ObstacleAvoidance;
pub use hover::HoverController;
pub use path_follow::PathFollowingController;
pub use waypoint::WaypointFollower;

/// The control-algorithm capability contract.
///
/// `compute_control` must be a pure function of its inputs plus the
/// algorithm's own progress state; it must not read global mutable state.
/// Implementations append every produced input to their own history, which
/// only `reset()` clears.
pub trait Algorithm: std::fmt::Debug + Send {
    fn name(&self) -> &str;

    /// Produces the actuation for this tick. The returned input is already
    /// clamped.
    fn compute_control(
        &mut self,
        state: &PhysicsState,
        sensors: &SensorData,
        timestamp: f64,
    ) -> ControlInput;

    /// Clears internal progress and the output history.
    fn reset(&mut self);

    /// Implementation-chosen diagnostic fields for observers and logging.
    fn status(&self) -> serde_json::Value;

    /// Append-only history of every control produced since the last reset.
    fn outputs(&self) -> &[ControlInput];
}

/// One proportional-derivative gain pair.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PdGains {
    pub kp: f64,
    pub kd: f64,
}

impl PdGains {
    pub fn new(kp: f64, kd: f64) -> Self {
        Self { kp, kd }
    }

    /// PD law on an error and its derivative.
    pub fn apply(&self, error: f64, error_dot: f64) -> f64 {
        self.kp * error + self.kd * error_dot
    }
}
