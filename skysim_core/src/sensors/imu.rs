// skysim_core/src/sensors/imu.rs

use nalgebra::UnitQuaternion;
use rand_distr::{Distribution, Normal};

use super::{RateGate, SimRng};
use crate::config::ImuSettings;
use crate::types::{ImuSample, PhysicsState, Vec3};

/// Simulated IMU: attitude and body rates with independent Gaussian noise
/// per axis. Noise is applied in Euler space and re-normalized into a
/// quaternion.
#[derive(Debug)]
pub struct ImuModel {
    enabled: bool,
    noise: Normal<f64>,
    gate: RateGate,
    last: Option<ImuSample>,
}

impl ImuModel {
    pub fn new(settings: &ImuSettings) -> Self {
        let noise = Normal::new(0.0, settings.noise_std).expect("validated noise_std");
        Self {
            enabled: settings.enabled,
            noise,
            gate: RateGate::new(settings.update_rate),
            last: None,
        }
    }

    pub fn sample(&mut self, truth: &PhysicsState, rng: &mut SimRng) -> Option<ImuSample> {
        if !self.enabled {
            return None;
        }
        if self.gate.due(truth.timestamp) {
            let (roll, pitch, yaw) = truth.euler_angles();
            let orientation = UnitQuaternion::from_euler_angles(
                roll + self.noise.sample(&mut rng.0),
                pitch + self.noise.sample(&mut rng.0),
                yaw + self.noise.sample(&mut rng.0),
            );
            let angular_velocity = Vec3::new(
                truth.angular_velocity.x + self.noise.sample(&mut rng.0),
                truth.angular_velocity.y + self.noise.sample(&mut rng.0),
                truth.angular_velocity.z + self.noise.sample(&mut rng.0),
            );
            self.last = Some(ImuSample {
                orientation,
                angular_velocity,
            });
        }
        self.last.clone()
    }

    pub fn reset(&mut self) {
        self.gate.reset();
        self.last = None;
    }
}
