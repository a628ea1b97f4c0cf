// skysim_core/src/spec.rs

use crate::types::Vec3;

/// Physical parameters of a drone airframe.
///
/// Selected once at configuration time. Changing a spec after construction
/// requires `Simulator::reinitialize` so the dynamics coefficients are
/// re-derived.
#[derive(Debug, Clone, PartialEq)]
pub struct DroneSpec {
    pub name: String,
    /// Vehicle mass in kg.
    pub mass: f64,
    /// Total thrust at full throttle, in newtons.
    pub max_thrust: f64,
    /// Motor-to-motor arm length in meters.
    pub arm_length: f64,
    /// Principal moments of inertia, kg·m².
    pub moment_of_inertia: Vec3,
    /// Linear drag coefficient, N·s/m.
    pub drag_coefficient: f64,
    /// Per-axis angular rate limit, rad/s.
    pub max_angular_velocity: f64,
    pub propeller_diameter: f64,
    pub body_dimensions: Vec3,
    pub color: String,
}

impl DroneSpec {
    /// Looks up a built-in airframe by name. Returns `None` for unknown
    /// names; configuration loading turns that into a construction error.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "quad_x" => Some(Self {
                name: "quad_x".into(),
                mass: 1.2,
                max_thrust: 30.0,
                arm_length: 0.22,
                moment_of_inertia: Vec3::new(0.012, 0.012, 0.022),
                drag_coefficient: 0.35,
                max_angular_velocity: 3.5,
                propeller_diameter: 0.24,
                body_dimensions: Vec3::new(0.35, 0.35, 0.12),
                color: "slate".into(),
            }),
            "racer" => Some(Self {
                name: "racer".into(),
                mass: 0.65,
                max_thrust: 28.0,
                arm_length: 0.14,
                moment_of_inertia: Vec3::new(0.004, 0.004, 0.007),
                drag_coefficient: 0.18,
                max_angular_velocity: 8.0,
                propeller_diameter: 0.13,
                body_dimensions: Vec3::new(0.2, 0.2, 0.06),
                color: "crimson".into(),
            }),
            "heavy_lifter" => Some(Self {
                name: "heavy_lifter".into(),
                mass: 4.8,
                max_thrust: 110.0,
                arm_length: 0.45,
                moment_of_inertia: Vec3::new(0.11, 0.11, 0.19),
                drag_coefficient: 0.8,
                max_angular_velocity: 1.8,
                propeller_diameter: 0.46,
                body_dimensions: Vec3::new(0.8, 0.8, 0.25),
                color: "olive".into(),
            }),
            _ => None,
        }
    }

    pub fn preset_names() -> &'static [&'static str] {
        &["quad_x", "racer", "heavy_lifter"]
    }

    /// Throttle fraction that balances gravity for this airframe, clamped to
    /// the actuation range. Useful as a hover-thrust baseline for
    /// controllers.
    pub fn hover_fraction(&self, gravity: f64) -> f64 {
        (self.mass * gravity.abs() / self.max_thrust).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn presets_resolve_by_name() {
        for name in DroneSpec::preset_names() {
            let spec = DroneSpec::preset(name).expect("preset should exist");
            assert_eq!(spec.name, *name);
            assert!(spec.mass > 0.0);
            assert!(spec.max_thrust > 0.0);
        }
        assert!(DroneSpec::preset("ornithopter").is_none());
    }

    #[test]
    fn hover_fraction_balances_weight() {
        let spec = DroneSpec::preset("quad_x").unwrap();
        let fraction = spec.hover_fraction(9.81);
        assert_abs_diff_eq!(fraction * spec.max_thrust, spec.mass * 9.81, epsilon = 1e-9);

        // Even an underpowered airframe must stay inside the throttle range.
        let mut brick = spec;
        brick.mass = 1000.0;
        assert_eq!(brick.hover_fraction(9.81), 1.0);
    }
}
