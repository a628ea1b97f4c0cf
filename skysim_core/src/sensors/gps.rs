// skysim_core/src/sensors/gps.rs

use rand_distr::{Distribution, Normal};

use super::{RateGate, SimRng};
use crate::config::GpsSettings;
use crate::types::{GpsFix, PhysicsState, Vec3};

/// Simulated GPS receiver: the true position plus independent zero-mean
/// Gaussian noise on each axis.
#[derive(Debug)]
pub struct GpsModel {
    enabled: bool,
    noise: Normal<f64>,
    gate: RateGate,
    last: Option<GpsFix>,
}

impl GpsModel {
    pub fn new(settings: &GpsSettings) -> Self {
        // noise_std is validated non-negative, so the distribution is well
        // formed.
        let noise = Normal::new(0.0, settings.noise_std).expect("validated noise_std");
        Self {
            enabled: settings.enabled,
            noise,
            gate: RateGate::new(settings.update_rate),
            last: None,
        }
    }

    pub fn sample(&mut self, truth: &PhysicsState, rng: &mut SimRng) -> Option<GpsFix> {
        if !self.enabled {
            return None;
        }
        if self.gate.due(truth.timestamp) {
            let position = Vec3::new(
                truth.position.x + self.noise.sample(&mut rng.0),
                truth.position.y + self.noise.sample(&mut rng.0),
                truth.position.z + self.noise.sample(&mut rng.0),
            );
            self.last = Some(GpsFix { position });
        }
        self.last.clone()
    }

    pub fn reset(&mut self) {
        self.gate.reset();
        self.last = None;
    }
}
