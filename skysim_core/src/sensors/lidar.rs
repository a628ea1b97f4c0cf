// skysim_core/src/sensors/lidar.rs

use super::RateGate;
use crate::config::LidarSettings;
use crate::environment::Environment;
use crate::types::{LidarScan, PhysicsState, Vec3};

/// Simulated scanning LiDAR: `resolution` beams evenly spaced over the
/// field of view, swept in the horizontal plane at the vehicle's altitude.
///
/// Beam 0 points along the vehicle's yaw heading; beams proceed
/// counter-clockwise. A beam that reaches nothing reports `max_range`.
#[derive(Debug)]
pub struct LidarModel {
    enabled: bool,
    max_range: f64,
    resolution: u32,
    field_of_view: f64,
    gate: RateGate,
    last: Option<LidarScan>,
}

impl LidarModel {
    pub fn new(settings: &LidarSettings) -> Self {
        Self {
            enabled: settings.enabled,
            max_range: settings.range,
            resolution: settings.resolution,
            field_of_view: settings.field_of_view,
            gate: RateGate::new(settings.update_rate),
            last: None,
        }
    }

    pub fn sample(
        &mut self,
        truth: &PhysicsState,
        environment: &Environment,
    ) -> Option<LidarScan> {
        if !self.enabled {
            return None;
        }
        if self.gate.due(truth.timestamp) {
            let yaw = truth.yaw();
            let step = self.field_of_view / self.resolution as f64;
            let ranges = (0..self.resolution)
                .map(|beam| {
                    let angle = yaw + beam as f64 * step;
                    let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
                    environment.distance_to_nearest(&truth.position, &direction, self.max_range)
                })
                .collect();
            self.last = Some(LidarScan {
                ranges,
                max_range: self.max_range,
                field_of_view: self.field_of_view,
                yaw,
            });
        }
        self.last.clone()
    }

    pub fn reset(&mut self) {
        self.gate.reset();
        self.last = None;
    }
}
