// skysim_core/src/types.rs

use nalgebra::{UnitQuaternion, Vector3};

// --- Core Type Aliases ---
pub type Vec3 = Vector3<f64>;

/// An ordered waypoint sequence from start to goal, as produced by the
/// planner. Traversal progress (current index, completion) is owned by the
/// consuming follower, not the path itself.
pub type Path = Vec<Vec3>;

// --- Actuation limits ---
pub const ATTITUDE_CMD_MIN: f64 = -1.0;
pub const ATTITUDE_CMD_MAX: f64 = 1.0;
pub const THRUST_CMD_MIN: f64 = 0.0;
pub const THRUST_CMD_MAX: f64 = 1.0;

/// Ground-truth rigid-body state of the vehicle.
///
/// Owned exclusively by the `Simulator`; step observers receive a read-only
/// snapshot each tick.
#[derive(Debug, Clone)]
pub struct PhysicsState {
    /// World-frame position in meters.
    pub position: Vec3,
    /// World-frame velocity in m/s.
    pub velocity: Vec3,
    /// Body-to-world rotation.
    pub orientation: UnitQuaternion<f64>,
    /// Body-frame angular velocity in rad/s.
    pub angular_velocity: Vec3,
    /// Simulation time in seconds since the run started.
    pub timestamp: f64,
}

impl PhysicsState {
    pub fn at_rest(position: Vec3, velocity: Vec3, yaw: f64) -> Self {
        Self {
            position,
            velocity,
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
            angular_velocity: Vec3::zeros(),
            timestamp: 0.0,
        }
    }

    /// Roll, pitch, yaw in radians.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.orientation.euler_angles()
    }

    pub fn yaw(&self) -> f64 {
        self.euler_angles().2
    }
}

/// Normalized actuation command produced by an `Algorithm` each tick.
///
/// Roll/pitch/yaw are normalized to `[-1, 1]`, thrust to `[0, 1]`. The
/// dynamics model scales these into physical torques and thrust force.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInput {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub thrust: f64,
}

impl ControlInput {
    pub fn new(roll: f64, pitch: f64, yaw: f64, thrust: f64) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            thrust,
        }
    }

    /// Maps every field onto its actuation range. Idempotent: clamping a
    /// clamped input returns it unchanged.
    #[must_use]
    pub fn clamp(self) -> Self {
        Self {
            roll: self.roll.clamp(ATTITUDE_CMD_MIN, ATTITUDE_CMD_MAX),
            pitch: self.pitch.clamp(ATTITUDE_CMD_MIN, ATTITUDE_CMD_MAX),
            yaw: self.yaw.clamp(ATTITUDE_CMD_MIN, ATTITUDE_CMD_MAX),
            thrust: self.thrust.clamp(THRUST_CMD_MIN, THRUST_CMD_MAX),
        }
    }
}

// =========================================================================
// == Sensor Readings ==
// =========================================================================

/// A GPS position fix in the world frame, noise already applied.
#[derive(Debug, Clone)]
pub struct GpsFix {
    pub position: Vec3,
}

/// An attitude + angular-rate estimate from the IMU, noise already applied.
#[derive(Debug, Clone)]
pub struct ImuSample {
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vec3,
}

/// One LiDAR sweep. `ranges[i]` is the distance for beam `i`, in
/// `[0, max_range]`; beams that hit nothing report `max_range`. The sweep
/// geometry is carried along so consumers can reconstruct beam directions.
#[derive(Debug, Clone)]
pub struct LidarScan {
    pub ranges: Vec<f64>,
    pub max_range: f64,
    /// Field of view covered by the sweep, radians.
    pub field_of_view: f64,
    /// Vehicle yaw at sample time; beam 0 points along this heading.
    pub yaw: f64,
}

impl LidarScan {
    /// World-frame direction of beam `index`. Beam 0 points along the
    /// vehicle's heading; beams proceed counter-clockwise.
    pub fn beam_direction(&self, index: usize) -> Vec3 {
        let step = self.field_of_view / self.ranges.len() as f64;
        let angle = self.yaw + index as f64 * step;
        Vec3::new(angle.cos(), angle.sin(), 0.0)
    }
}

/// The full synthetic sensor packet handed to the algorithm each tick.
///
/// A disabled sensor is `None`, never a sentinel reading.
#[derive(Debug, Clone, Default)]
pub struct SensorData {
    pub gps: Option<GpsFix>,
    pub imu: Option<ImuSample>,
    pub lidar: Option<LidarScan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_all_fields() {
        let wild = ControlInput::new(42.0, -42.0, 1.5, -3.0);
        let clamped = wild.clamp();
        assert_eq!(clamped.roll, ATTITUDE_CMD_MAX);
        assert_eq!(clamped.pitch, ATTITUDE_CMD_MIN);
        assert_eq!(clamped.yaw, ATTITUDE_CMD_MAX);
        assert_eq!(clamped.thrust, THRUST_CMD_MIN);
    }

    #[test]
    fn clamp_is_idempotent() {
        for input in [
            ControlInput::new(1e12, -1e12, f64::MAX, f64::MIN),
            ControlInput::new(-0.3, 0.9, 0.0, 0.5),
            ControlInput::default(),
        ] {
            let once = input.clamp();
            assert_eq!(once.clamp(), once);
        }
    }

    #[test]
    fn clamp_leaves_in_range_values_untouched() {
        let nominal = ControlInput::new(0.25, -0.5, 0.0, 0.6);
        assert_eq!(nominal.clamp(), nominal);
    }

    #[test]
    fn beam_directions_sweep_counter_clockwise() {
        let scan = LidarScan {
            ranges: vec![1.0; 4],
            max_range: 1.0,
            field_of_view: std::f64::consts::TAU,
            yaw: 0.0,
        };
        assert!((scan.beam_direction(0) - Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((scan.beam_direction(1) - Vec3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }
}
