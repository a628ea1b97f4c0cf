// skysim_core/src/config.rs

use serde::Deserialize;

use crate::dynamics::integrators::IntegratorKind;
use crate::environment::{Boundaries, Obstacle};
use crate::spec::DroneSpec;
use crate::types::Vec3;

/// # SimulatorConfig
/// The root of the data parsed from a scenario file. All fields carry
/// documented defaults; `validate()` runs eagerly at simulator construction
/// so misconfiguration surfaces before the stepping loop starts.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub simulation: SimulationSettings,

    #[serde(default)]
    pub drone: DroneSettings,

    #[serde(default)]
    pub environment: EnvironmentSettings,

    // The scenario file has `[[obstacles]]`, one table per obstacle.
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,

    #[serde(default)]
    pub sensors: SensorSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// Fixed physics timestep in seconds.
    #[serde(default = "default_timestep")]
    pub timestep: f64,
    /// Simulated duration cap in seconds.
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Sleep between ticks to match wall clock. Never changes simulated
    /// results, only throughput.
    #[serde(default)]
    pub real_time: bool,
    /// Seed for the simulation RNG. Random when absent.
    pub seed: Option<u64>,
    #[serde(default)]
    pub integrator: IntegratorKind,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            duration: default_duration(),
            real_time: false,
            seed: None,
            integrator: IntegratorKind::default(),
        }
    }
}

fn default_timestep() -> f64 {
    0.01
}
fn default_duration() -> f64 {
    120.0
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DroneSettings {
    /// Name of a built-in airframe preset.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(with = "serde_helpers::vec3_from_array", default = "default_initial_position")]
    pub initial_position: Vec3,
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub initial_velocity: Vec3,
    /// Initial heading in radians.
    #[serde(default)]
    pub initial_yaw: f64,
    /// Optional spec overrides applied on top of the preset.
    #[serde(default)]
    pub mass: Option<f64>,
    #[serde(default)]
    pub max_thrust: Option<f64>,
    #[serde(default)]
    pub drag_coefficient: Option<f64>,
    #[serde(default)]
    pub max_angular_velocity: Option<f64>,
}

impl Default for DroneSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            initial_position: default_initial_position(),
            initial_velocity: Vec3::zeros(),
            initial_yaw: 0.0,
            mass: None,
            max_thrust: None,
            drag_coefficient: None,
            max_angular_velocity: None,
        }
    }
}

fn default_model() -> String {
    "quad_x".to_string()
}
fn default_initial_position() -> Vec3 {
    Vec3::new(0.0, 0.0, 1.0)
}

impl DroneSettings {
    /// Resolves the preset and applies any per-field overrides.
    pub fn resolve_spec(&self) -> Result<DroneSpec, ConfigError> {
        let mut spec = DroneSpec::preset(&self.model)
            .ok_or_else(|| ConfigError::UnknownDroneModel(self.model.clone()))?;
        if let Some(mass) = self.mass {
            spec.mass = mass;
        }
        if let Some(max_thrust) = self.max_thrust {
            spec.max_thrust = max_thrust;
        }
        if let Some(drag) = self.drag_coefficient {
            spec.drag_coefficient = drag;
        }
        if let Some(rate) = self.max_angular_velocity {
            spec.max_angular_velocity = rate;
        }
        Ok(spec)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentSettings {
    /// Gravitational acceleration magnitude, m/s².
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default)]
    pub wind: WindSettings,
    #[serde(default)]
    pub boundaries: Boundaries,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            wind: WindSettings::default(),
            boundaries: Boundaries::default(),
        }
    }
}

fn default_gravity() -> f64 {
    9.81
}

/// Wind is accepted and validated for scenario compatibility but applies no
/// force term yet.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct WindSettings {
    #[serde(default)]
    pub enabled: bool,
}

impl Default for Boundaries {
    fn default() -> Self {
        Self {
            x_min: -50.0,
            x_max: 50.0,
            y_min: -50.0,
            y_max: 50.0,
            z_min: 0.0,
            z_max: 20.0,
        }
    }
}

// Boundaries is the runtime type; scenario files deserialize it directly.
impl<'de> Deserialize<'de> for Boundaries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            x_min: f64,
            x_max: f64,
            y_min: f64,
            y_max: f64,
            z_min: f64,
            z_max: f64,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Boundaries {
            x_min: raw.x_min,
            x_max: raw.x_max,
            y_min: raw.y_min,
            y_max: raw.y_max,
            z_min: raw.z_min,
            z_max: raw.z_max,
        })
    }
}

/// One obstacle table from the scenario file. The `type` field selects the
/// variant; unknown types fail at parse time.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ObstacleConfig {
    Sphere {
        #[serde(with = "serde_helpers::vec3_from_array")]
        position: Vec3,
        radius: f64,
    },
    Box {
        #[serde(with = "serde_helpers::vec3_from_array")]
        position: Vec3,
        /// Full extents; halved on load.
        #[serde(with = "serde_helpers::vec3_from_array")]
        dimensions: Vec3,
    },
    Cylinder {
        /// Base center; the body extends `height` along +Z.
        #[serde(with = "serde_helpers::vec3_from_array")]
        position: Vec3,
        radius: f64,
        height: f64,
    },
}

impl ObstacleConfig {
    pub fn to_obstacle(&self) -> Obstacle {
        match self {
            ObstacleConfig::Sphere { position, radius } => Obstacle::Sphere {
                center: *position,
                radius: *radius,
            },
            ObstacleConfig::Box {
                position,
                dimensions,
            } => Obstacle::Box {
                center: *position,
                half_extents: dimensions / 2.0,
            },
            ObstacleConfig::Cylinder {
                position,
                radius,
                height,
            } => Obstacle::Cylinder {
                center: *position,
                radius: *radius,
                height: *height,
            },
        }
    }

    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let ok = match self {
            ObstacleConfig::Sphere { radius, .. } => *radius > 0.0,
            ObstacleConfig::Box { dimensions, .. } => {
                dimensions.x > 0.0 && dimensions.y > 0.0 && dimensions.z > 0.0
            }
            ObstacleConfig::Cylinder { radius, height, .. } => *radius > 0.0 && *height > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(ConfigError::BadObstacle { index })
        }
    }
}

// =========================================================================
// == Sensors ==
// =========================================================================

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SensorSettings {
    #[serde(default)]
    pub gps: GpsSettings,
    #[serde(default)]
    pub imu: ImuSettings,
    #[serde(default)]
    pub lidar: LidarSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct GpsSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Standard deviation of the position noise, meters.
    #[serde(default = "default_gps_noise")]
    pub noise_std: f64,
    /// Measurement rate in Hz.
    #[serde(default = "default_gps_rate")]
    pub update_rate: f64,
}

impl Default for GpsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_std: default_gps_noise(),
            update_rate: default_gps_rate(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_gps_noise() -> f64 {
    0.5
}
fn default_gps_rate() -> f64 {
    10.0
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ImuSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Standard deviation of the attitude/rate noise, radians.
    #[serde(default = "default_imu_noise")]
    pub noise_std: f64,
    #[serde(default = "default_imu_rate")]
    pub update_rate: f64,
}

impl Default for ImuSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_std: default_imu_noise(),
            update_rate: default_imu_rate(),
        }
    }
}

fn default_imu_noise() -> f64 {
    0.01
}
fn default_imu_rate() -> f64 {
    100.0
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LidarSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum beam range, meters.
    #[serde(default = "default_lidar_range")]
    pub range: f64,
    /// Beam count over the field of view.
    #[serde(default = "default_lidar_resolution")]
    pub resolution: u32,
    /// Field of view in radians. Full horizontal sweep by default.
    #[serde(default = "default_lidar_fov")]
    pub field_of_view: f64,
    #[serde(default = "default_lidar_rate")]
    pub update_rate: f64,
}

impl Default for LidarSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            range: default_lidar_range(),
            resolution: default_lidar_resolution(),
            field_of_view: default_lidar_fov(),
            update_rate: default_lidar_rate(),
        }
    }
}

fn default_lidar_range() -> f64 {
    10.0
}
fn default_lidar_resolution() -> u32 {
    360
}
fn default_lidar_fov() -> f64 {
    std::f64::consts::TAU
}
fn default_lidar_rate() -> f64 {
    20.0
}

// =========================================================================
// == Validation ==
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("simulation.timestep must be positive, got {0}")]
    BadTimestep(f64),
    #[error("simulation.duration must be positive, got {0}")]
    BadDuration(f64),
    #[error("environment.gravity must be positive, got {0}")]
    BadGravity(f64),
    #[error("environment.boundaries: {axis}_min must be below {axis}_max")]
    InvertedBoundaries { axis: char },
    #[error("unknown drone model '{0}'")]
    UnknownDroneModel(String),
    #[error("drone spec field out of range: {0}")]
    BadDroneSpec(&'static str),
    #[error("obstacles[{index}] has non-positive dimensions")]
    BadObstacle { index: usize },
    #[error("sensors.{sensor}.{field} out of range")]
    BadSensor {
        sensor: &'static str,
        field: &'static str,
    },
}

impl SimulatorConfig {
    /// Checks every field against its documented range. Called by
    /// `Simulator::new` before any state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.simulation.timestep > 0.0) {
            return Err(ConfigError::BadTimestep(self.simulation.timestep));
        }
        if !(self.simulation.duration > 0.0) {
            return Err(ConfigError::BadDuration(self.simulation.duration));
        }
        if !(self.environment.gravity > 0.0) {
            return Err(ConfigError::BadGravity(self.environment.gravity));
        }

        let b = &self.environment.boundaries;
        for (axis, lo, hi) in [
            ('x', b.x_min, b.x_max),
            ('y', b.y_min, b.y_max),
            ('z', b.z_min, b.z_max),
        ] {
            if lo >= hi {
                return Err(ConfigError::InvertedBoundaries { axis });
            }
        }

        let spec = self.drone.resolve_spec()?;
        if !(spec.mass > 0.0) {
            return Err(ConfigError::BadDroneSpec("mass"));
        }
        if !(spec.max_thrust > 0.0) {
            return Err(ConfigError::BadDroneSpec("max_thrust"));
        }
        if spec.drag_coefficient < 0.0 {
            return Err(ConfigError::BadDroneSpec("drag_coefficient"));
        }
        if !(spec.max_angular_velocity > 0.0) {
            return Err(ConfigError::BadDroneSpec("max_angular_velocity"));
        }

        for (index, obstacle) in self.obstacles.iter().enumerate() {
            obstacle.validate(index)?;
        }

        let sensors = &self.sensors;
        if sensors.gps.noise_std < 0.0 {
            return Err(ConfigError::BadSensor {
                sensor: "gps",
                field: "noise_std",
            });
        }
        if !(sensors.gps.update_rate > 0.0) {
            return Err(ConfigError::BadSensor {
                sensor: "gps",
                field: "update_rate",
            });
        }
        if sensors.imu.noise_std < 0.0 {
            return Err(ConfigError::BadSensor {
                sensor: "imu",
                field: "noise_std",
            });
        }
        if !(sensors.imu.update_rate > 0.0) {
            return Err(ConfigError::BadSensor {
                sensor: "imu",
                field: "update_rate",
            });
        }
        if sensors.lidar.enabled && sensors.lidar.resolution == 0 {
            return Err(ConfigError::BadSensor {
                sensor: "lidar",
                field: "resolution",
            });
        }
        if !(sensors.lidar.range > 0.0) {
            return Err(ConfigError::BadSensor {
                sensor: "lidar",
                field: "range",
            });
        }
        if !(sensors.lidar.field_of_view > 0.0) {
            return Err(ConfigError::BadSensor {
                sensor: "lidar",
                field: "field_of_view",
            });
        }
        if !(sensors.lidar.update_rate > 0.0) {
            return Err(ConfigError::BadSensor {
                sensor: "lidar",
                field: "update_rate",
            });
        }

        Ok(())
    }
}

// =========================================================================
// == Serde helpers ==
// =========================================================================

pub mod serde_helpers {
    pub mod vec3_from_array {
        use nalgebra::Vector3;
        use serde::{self, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(vec: &Vector3<f64>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_seq([vec.x, vec.y, vec.z].iter())
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Vector3<f64>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let arr: [f64; 3] = Deserialize::deserialize(deserializer)?;
            Ok(Vector3::new(arr[0], arr[1], arr[2]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimulatorConfig::default().validate().expect("defaults should be valid");
    }

    #[test]
    fn bad_timestep_is_rejected() {
        let mut config = SimulatorConfig::default();
        config.simulation.timestep = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadTimestep(_))
        ));
    }

    #[test]
    fn inverted_boundaries_are_rejected() {
        let mut config = SimulatorConfig::default();
        config.environment.boundaries.z_min = 30.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBoundaries { axis: 'z' })
        ));
    }

    #[test]
    fn unknown_model_is_rejected() {
        let mut config = SimulatorConfig::default();
        config.drone.model = "zeppelin".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownDroneModel(_))
        ));
    }

    #[test]
    fn box_dimensions_are_halved() {
        let obstacle = ObstacleConfig::Box {
            position: Vec3::new(1.0, 2.0, 3.0),
            dimensions: Vec3::new(4.0, 6.0, 8.0),
        };
        match obstacle.to_obstacle() {
            Obstacle::Box { half_extents, .. } => {
                assert_eq!(half_extents, Vec3::new(2.0, 3.0, 4.0));
            }
            other => panic!("expected box, got {other:?}"),
        }
    }

    #[test]
    fn zero_lidar_resolution_is_rejected_only_when_enabled() {
        let mut config = SimulatorConfig::default();
        config.sensors.lidar.resolution = 0;
        assert!(config.validate().is_err());
        config.sensors.lidar.enabled = false;
        config.validate().expect("disabled lidar may skip resolution");
    }
}
