// skysim_sim/src/scenario.rs

use std::path::Path;

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;

use skysim_core::algorithms::hover::HoverGains;
use skysim_core::config::{
    serde_helpers, DroneSettings, EnvironmentSettings, ObstacleConfig, SensorSettings,
    SimulationSettings, SimulatorConfig,
};
use skysim_core::types::Vec3;

/// A scenario file: the full simulator configuration plus the algorithm
/// block and the logging toggles the front end consumes.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub drone: DroneSettings,
    #[serde(default)]
    pub environment: EnvironmentSettings,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
    #[serde(default)]
    pub sensors: SensorSettings,
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub visualization: VisualizationSettings,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Toml::file(path)).extract()
    }

    /// The core-facing part of the scenario.
    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            simulation: self.simulation.clone(),
            drone: self.drone.clone(),
            environment: self.environment.clone(),
            obstacles: self.obstacles.clone(),
            sensors: self.sensors.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
        }
    }
}

fn default_logging_enabled() -> bool {
    true
}

/// Accepted for scenario compatibility; rendering is handled by external
/// front ends, not this binary.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct VisualizationSettings {
    #[serde(default)]
    pub enabled: bool,
}

/// The algorithm block of a scenario. The `kind` field selects the
/// strategy; each variant carries its own tuning. This enum is the
/// compile-time registry of available algorithms.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind")]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmConfig {
    Hover {
        #[serde(with = "serde_helpers::vec3_from_array")]
        target_position: Vec3,
        #[serde(default)]
        gains: HoverGains,
    },
    Waypoint {
        waypoints: Vec<[f64; 3]>,
        #[serde(default = "default_waypoint_threshold")]
        waypoint_threshold: f64,
        #[serde(default)]
        gains: HoverGains,
    },
    PathFollow {
        #[serde(with = "serde_helpers::vec3_from_array")]
        goal: Vec3,
        #[serde(default = "default_lookahead")]
        lookahead_distance: f64,
        #[serde(default = "default_path_threshold")]
        path_threshold: f64,
        #[serde(default = "default_max_speed")]
        max_speed: f64,
        #[serde(default = "default_grid_resolution")]
        grid_resolution: f64,
        #[serde(default = "default_safety_radius")]
        safety_radius: f64,
        #[serde(default)]
        gains: HoverGains,
    },
    ObstacleAvoidance {
        #[serde(with = "serde_helpers::vec3_from_array")]
        target_position: Vec3,
        #[serde(default = "default_avoidance_distance")]
        avoidance_distance: f64,
        #[serde(default = "default_avoidance_strength")]
        avoidance_strength: f64,
        #[serde(default = "default_max_avoidance_force")]
        max_avoidance_force: f64,
        #[serde(default)]
        gains: HoverGains,
    },
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig::Hover {
            target_position: Vec3::new(0.0, 0.0, 5.0),
            gains: HoverGains::default(),
        }
    }
}

impl AlgorithmConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            AlgorithmConfig::Hover { .. } => "hover",
            AlgorithmConfig::Waypoint { .. } => "waypoint",
            AlgorithmConfig::PathFollow { .. } => "path_follow",
            AlgorithmConfig::ObstacleAvoidance { .. } => "obstacle_avoidance",
        }
    }
}

fn default_waypoint_threshold() -> f64 {
    2.0
}
fn default_lookahead() -> f64 {
    4.0
}
fn default_path_threshold() -> f64 {
    1.5
}
fn default_max_speed() -> f64 {
    3.0
}
fn default_grid_resolution() -> f64 {
    1.0
}
fn default_safety_radius() -> f64 {
    1.0
}
fn default_avoidance_distance() -> f64 {
    4.0
}
fn default_avoidance_strength() -> f64 {
    3.0
}
fn default_max_avoidance_force() -> f64 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_scenario() {
        let text = r#"
            [simulation]
            timestep = 0.01
            duration = 60.0
            seed = 7

            [drone]
            model = "quad_x"
            initial_position = [0.0, 0.0, 2.0]

            [environment]
            gravity = 9.81

            [environment.boundaries]
            x_min = -20.0
            x_max = 20.0
            y_min = -20.0
            y_max = 20.0
            z_min = 0.0
            z_max = 15.0

            [[obstacles]]
            type = "sphere"
            position = [5.0, 5.0, 5.0]
            radius = 2.0

            [algorithm]
            kind = "waypoint"
            waypoints = [[0.0, 0.0, 5.0], [10.0, 0.0, 5.0]]
            waypoint_threshold = 1.5
        "#;
        let scenario: Scenario = toml::from_str(text).unwrap();
        assert_eq!(scenario.algorithm.kind(), "waypoint");
        assert_eq!(scenario.obstacles.len(), 1);
        let config = scenario.simulator_config();
        config.validate().unwrap();
        assert_eq!(config.simulation.seed, Some(7));
    }

    #[test]
    fn unknown_algorithm_kind_is_rejected() {
        let text = r#"
            [algorithm]
            kind = "teleport"
        "#;
        assert!(toml::from_str::<Scenario>(text).is_err());
    }

    #[test]
    fn unknown_obstacle_type_is_rejected() {
        let text = r#"
            [[obstacles]]
            type = "torus"
            position = [0.0, 0.0, 0.0]
        "#;
        assert!(toml::from_str::<Scenario>(text).is_err());
    }

    #[test]
    fn empty_scenario_uses_documented_defaults() {
        let scenario: Scenario = toml::from_str("").unwrap();
        assert_eq!(scenario.algorithm.kind(), "hover");
        assert!(scenario.logging.enabled);
        scenario.simulator_config().validate().unwrap();
    }
}
