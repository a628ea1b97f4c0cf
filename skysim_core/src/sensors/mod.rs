// skysim_core/src/sensors/mod.rs

pub mod gps;
pub mod imu;
pub mod lidar;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SensorSettings;
use crate::environment::Environment;
use crate::types::{PhysicsState, SensorData};

pub use gps::GpsModel;
pub use imu::ImuModel;
pub use lidar::LidarModel;

/// The central, deterministic pseudo-random number generator for the
/// simulation. Seeded from configuration so runs are reproducible.
#[derive(Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn seed_from(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(ChaCha8Rng::seed_from_u64(seed)),
            None => Self(ChaCha8Rng::from_entropy()),
        }
    }
}

/// Owns the per-sensor models and derives a `SensorData` packet from the
/// ground-truth state each tick.
///
/// Sensors slower than the physics rate hold their last reading between
/// updates; disabled sensors contribute `None`.
#[derive(Debug)]
pub struct SensorSuite {
    gps: GpsModel,
    imu: ImuModel,
    lidar: LidarModel,
    rng: SimRng,
}

impl SensorSuite {
    pub fn new(settings: &SensorSettings, rng: SimRng) -> Self {
        Self {
            gps: GpsModel::new(&settings.gps),
            imu: ImuModel::new(&settings.imu),
            lidar: LidarModel::new(&settings.lidar),
            rng,
        }
    }

    pub fn sample(&mut self, truth: &PhysicsState, environment: &Environment) -> SensorData {
        SensorData {
            gps: self.gps.sample(truth, &mut self.rng),
            imu: self.imu.sample(truth, &mut self.rng),
            lidar: self.lidar.sample(truth, environment),
        }
    }

    /// Drops cached readings so a new run starts fresh.
    pub fn reset(&mut self) {
        self.gps.reset();
        self.imu.reset();
        self.lidar.reset();
    }
}

/// Shared rate gate: a sensor with `update_rate` below the physics tick
/// rate re-samples only when its period has elapsed.
#[derive(Debug, Clone)]
pub(crate) struct RateGate {
    period: f64,
    next_due: f64,
}

impl RateGate {
    pub(crate) fn new(update_rate: f64) -> Self {
        Self {
            period: 1.0 / update_rate,
            next_due: 0.0,
        }
    }

    /// True when a new sample is due at `t`. Advances the deadline.
    pub(crate) fn due(&mut self, t: f64) -> bool {
        // Tolerate accumulated floating-point error of the fixed-step clock.
        if t + 1e-9 >= self.next_due {
            self.next_due = t + self.period;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.next_due = 0.0;
    }
}
