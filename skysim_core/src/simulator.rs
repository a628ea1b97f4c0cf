// skysim_core/src/simulator.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::algorithms::Algorithm;
use crate::config::{ConfigError, SimulatorConfig};
use crate::dynamics::integrators::Integrator;
use crate::dynamics::QuadrotorDynamics;
use crate::environment::Environment;
use crate::sensors::{SensorSuite, SimRng};
use crate::types::{PhysicsState, SensorData};

/// Invoked synchronously each tick with `(timestamp, state, sensors)`, in
/// registration order. May request a stop through a `StopHandle`.
pub type StepObserver = Box<dyn FnMut(f64, &PhysicsState, &SensorData)>;

/// Invoked exactly once per run, on the first collision.
pub type CollisionObserver = Box<dyn FnMut(&PhysicsState)>;

/// Lifecycle of the stepping loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
    Completed,
}

/// How a run ended. Collision never terminates a run by itself; it is
/// carried as a flag on whichever outcome the run reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Ran the full `max_steps` ticks.
    Completed { steps: u64, collided: bool },
    /// The configured simulated duration elapsed first.
    MaxDuration { steps: u64, collided: bool },
    /// An observer or external holder requested a stop.
    StopRequested { steps: u64, collided: bool },
    /// The vehicle left the bounding volume. Run-terminating, not a crash.
    BoundaryExit { steps: u64, collided: bool },
}

impl RunOutcome {
    /// True when the run reached its step or duration limit without a
    /// collision.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RunOutcome::Completed { collided: false, .. }
                | RunOutcome::MaxDuration { collided: false, .. }
        )
    }

    pub fn steps(&self) -> u64 {
        match *self {
            RunOutcome::Completed { steps, .. }
            | RunOutcome::MaxDuration { steps, .. }
            | RunOutcome::StopRequested { steps, .. }
            | RunOutcome::BoundaryExit { steps, .. } => steps,
        }
    }

    pub fn collided(&self) -> bool {
        match *self {
            RunOutcome::Completed { collided, .. }
            | RunOutcome::MaxDuration { collided, .. }
            | RunOutcome::StopRequested { collided, .. }
            | RunOutcome::BoundaryExit { collided, .. } => collided,
        }
    }
}

/// A cloneable handle for cooperative cancellation. The flag is checked at
/// the top of each tick; there is no mid-tick preemption.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// The fixed-step simulation driver.
///
/// Owns the ground-truth `PhysicsState` exclusively; each tick it samples
/// sensors, asks the active algorithm for a control, advances the dynamics,
/// checks collisions and notifies observers. Single-threaded and
/// cooperative throughout.
pub struct Simulator {
    config: SimulatorConfig,
    environment: Environment,
    dynamics: QuadrotorDynamics,
    integrator: Box<dyn Integrator>,
    sensors: SensorSuite,
    state: PhysicsState,
    run_state: RunState,
    stop: StopHandle,
    time_scale: f64,
    collision_radius: f64,
    step_observers: Vec<StepObserver>,
    collision_observers: Vec<CollisionObserver>,
}

impl Simulator {
    /// Builds a simulator from a validated configuration. All
    /// misconfiguration surfaces here, before the loop can start.
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let environment = Environment::new(
            config.environment.boundaries,
            config.obstacles.iter().map(|o| o.to_obstacle()).collect(),
        );
        let spec = config.drone.resolve_spec()?;
        let collision_radius = spec.body_dimensions.amax() / 2.0;
        let dynamics = QuadrotorDynamics::new(spec, config.environment.gravity);
        let integrator = config.simulation.integrator.build();
        let sensors = SensorSuite::new(
            &config.sensors,
            SimRng::seed_from(config.simulation.seed),
        );
        let state = PhysicsState::at_rest(
            config.drone.initial_position,
            config.drone.initial_velocity,
            config.drone.initial_yaw,
        );

        Ok(Self {
            config,
            environment,
            dynamics,
            integrator,
            sensors,
            state,
            run_state: RunState::Idle,
            stop: StopHandle::default(),
            time_scale: 1.0,
            collision_radius,
            step_observers: Vec::new(),
            collision_observers: Vec::new(),
        })
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn state(&self) -> &PhysicsState {
        &self.state
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn spec(&self) -> &crate::spec::DroneSpec {
        self.dynamics.spec()
    }

    /// A handle observers (or other threads) can use to request a
    /// cooperative stop.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Wall-clock pacing factor for real-time mode. Never changes
    /// simulated results.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale > 0.0 {
            self.time_scale = scale;
        }
    }

    pub fn add_step_observer(&mut self, observer: StepObserver) {
        self.step_observers.push(observer);
    }

    pub fn add_collision_observer(&mut self, observer: CollisionObserver) {
        self.collision_observers.push(observer);
    }

    /// Rebuilds dynamics, sensors and vehicle state from an updated
    /// configuration. Required after mutating the drone spec or sensor
    /// settings between runs.
    pub fn reinitialize(&mut self, config: SimulatorConfig) -> Result<(), ConfigError> {
        let rebuilt = Simulator::new(config)?;
        self.config = rebuilt.config;
        self.environment = rebuilt.environment;
        self.dynamics = rebuilt.dynamics;
        self.integrator = rebuilt.integrator;
        self.sensors = rebuilt.sensors;
        self.state = rebuilt.state;
        self.collision_radius = rebuilt.collision_radius;
        self.run_state = RunState::Idle;
        Ok(())
    }

    /// Drives the tick loop until `max_steps` ticks have elapsed, the
    /// configured duration runs out, a stop is requested, or the vehicle
    /// leaves the bounding volume.
    pub fn run_autonomous(
        &mut self,
        algorithm: &mut dyn Algorithm,
        max_steps: u64,
    ) -> RunOutcome {
        let dt = self.config.simulation.timestep;
        let duration = self.config.simulation.duration;
        let pace = self.config.simulation.real_time;

        self.stop.clear();
        self.sensors.reset();
        self.run_state = RunState::Running;
        let mut steps: u64 = 0;
        let mut collided = false;

        let outcome = loop {
            if self.stop.is_stopped() {
                break RunOutcome::StopRequested { steps, collided };
            }
            if steps >= max_steps {
                break RunOutcome::Completed { steps, collided };
            }
            if self.state.timestamp >= duration {
                break RunOutcome::MaxDuration { steps, collided };
            }
            let tick_started = pace.then(Instant::now);

            let sensors = self.sensors.sample(&self.state, &self.environment);
            let control = algorithm
                .compute_control(&self.state, &sensors, self.state.timestamp)
                .clamp();
            self.state = self
                .integrator
                .step(&self.dynamics, &self.state, &control, dt);
            steps += 1;

            if !collided && self.in_collision() {
                collided = true;
                for observer in &mut self.collision_observers {
                    observer(&self.state);
                }
            }

            for observer in &mut self.step_observers {
                observer(self.state.timestamp, &self.state, &sensors);
            }

            if !self
                .environment
                .boundaries()
                .contains(&self.state.position)
            {
                break RunOutcome::BoundaryExit { steps, collided };
            }

            if let Some(started) = tick_started {
                let budget = Duration::from_secs_f64(dt / self.time_scale);
                let elapsed = started.elapsed();
                if elapsed < budget {
                    std::thread::sleep(budget - elapsed);
                }
            }
        };

        self.run_state = match outcome {
            RunOutcome::Completed { .. } | RunOutcome::MaxDuration { .. } => RunState::Completed,
            RunOutcome::StopRequested { .. } | RunOutcome::BoundaryExit { .. } => {
                RunState::Stopped
            }
        };
        outcome
    }

    fn in_collision(&self) -> bool {
        self.environment
            .obstacles()
            .iter()
            .any(|obstacle| obstacle.surface_distance(&self.state.position) <= self.collision_radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::hover::{HoverController, HoverGains};
    use crate::config::ObstacleConfig;
    use crate::types::{ControlInput, Vec3};
    use std::cell::Cell;
    use std::rc::Rc;

    /// A do-nothing strategy: zero attitude, zero thrust.
    #[derive(Debug, Default)]
    struct Ballistic {
        outputs: Vec<ControlInput>,
    }

    impl Algorithm for Ballistic {
        fn name(&self) -> &str {
            "ballistic"
        }
        fn compute_control(
            &mut self,
            _state: &PhysicsState,
            _sensors: &SensorData,
            _timestamp: f64,
        ) -> ControlInput {
            let control = ControlInput::default();
            self.outputs.push(control);
            control
        }
        fn reset(&mut self) {
            self.outputs.clear();
        }
        fn status(&self) -> serde_json::Value {
            serde_json::json!({})
        }
        fn outputs(&self) -> &[ControlInput] {
            &self.outputs
        }
    }

    fn base_config() -> SimulatorConfig {
        let mut config = SimulatorConfig::default();
        config.simulation.seed = Some(9);
        config.drone.initial_position = Vec3::new(0.0, 0.0, 10.0);
        config
    }

    fn hover_algorithm(target: Vec3) -> HoverController {
        let gains = HoverGains {
            hover_thrust: 0.39, // quad_x equilibrium
            ..HoverGains::default()
        };
        HoverController::new(target, gains)
    }

    #[test]
    fn observer_fires_once_per_tick_and_run_halts_at_max_steps() {
        let mut sim = Simulator::new(base_config()).unwrap();
        let ticks = Rc::new(Cell::new(0u64));
        let counter = ticks.clone();
        sim.add_step_observer(Box::new(move |_, _, _| counter.set(counter.get() + 1)));

        let mut algorithm = hover_algorithm(Vec3::new(0.0, 0.0, 10.0));
        let outcome = sim.run_autonomous(&mut algorithm, 250);

        assert_eq!(outcome, RunOutcome::Completed { steps: 250, collided: false });
        assert!(outcome.is_success());
        assert_eq!(ticks.get(), 250);
        assert_eq!(algorithm.outputs().len(), 250);
        assert_eq!(sim.run_state(), RunState::Completed);
    }

    #[test]
    fn stop_handle_ends_the_run_at_the_next_tick() {
        let mut sim = Simulator::new(base_config()).unwrap();
        let handle = sim.stop_handle();
        sim.add_step_observer(Box::new(move |t, _, _| {
            if t >= 0.049 {
                handle.stop();
            }
        }));

        let mut algorithm = hover_algorithm(Vec3::new(0.0, 0.0, 10.0));
        let outcome = sim.run_autonomous(&mut algorithm, 10_000);

        assert!(matches!(outcome, RunOutcome::StopRequested { .. }));
        assert!(!outcome.is_success());
        // The flag set during tick 5 is seen at the top of tick 6.
        assert_eq!(outcome.steps(), 5);
        assert_eq!(sim.run_state(), RunState::Stopped);
    }

    #[test]
    fn free_fall_exits_through_the_floor() {
        let mut sim = Simulator::new(base_config()).unwrap();
        let mut algorithm = Ballistic::default();
        let outcome = sim.run_autonomous(&mut algorithm, 100_000);
        assert!(matches!(outcome, RunOutcome::BoundaryExit { .. }));
        assert!(sim.state().position.z < 0.0);
    }

    #[test]
    fn collision_observer_fires_exactly_once() {
        let mut config = base_config();
        config.obstacles.push(ObstacleConfig::Sphere {
            position: Vec3::new(0.0, 0.0, 10.0),
            radius: 2.0,
        });
        let mut sim = Simulator::new(config).unwrap();

        let collisions = Rc::new(Cell::new(0u32));
        let counter = collisions.clone();
        sim.add_collision_observer(Box::new(move |_| counter.set(counter.get() + 1)));

        // Park inside the obstacle: every tick is in collision, the
        // observer still fires only on the first.
        let mut algorithm = hover_algorithm(Vec3::new(0.0, 0.0, 10.0));
        let outcome = sim.run_autonomous(&mut algorithm, 50);

        assert_eq!(collisions.get(), 1);
        assert!(outcome.collided());
        assert!(!outcome.is_success());
        // Collision alone does not end the run.
        assert_eq!(outcome.steps(), 50);
    }

    #[test]
    fn duration_cap_ends_long_runs() {
        let mut config = base_config();
        config.simulation.duration = 0.495;
        let mut sim = Simulator::new(config).unwrap();
        let mut algorithm = hover_algorithm(Vec3::new(0.0, 0.0, 10.0));
        let outcome = sim.run_autonomous(&mut algorithm, 1_000_000);
        assert!(matches!(outcome, RunOutcome::MaxDuration { .. }));
        assert_eq!(outcome.steps(), 50);
    }

    #[test]
    fn observers_run_in_registration_order() {
        let mut sim = Simulator::new(base_config()).unwrap();
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = log.clone();
            sim.add_step_observer(Box::new(move |_, _, _| log.borrow_mut().push(tag)));
        }
        let mut algorithm = hover_algorithm(Vec3::new(0.0, 0.0, 10.0));
        sim.run_autonomous(&mut algorithm, 1);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn reinitialize_rebuilds_state_from_config() {
        let mut sim = Simulator::new(base_config()).unwrap();
        let mut algorithm = Ballistic::default();
        sim.run_autonomous(&mut algorithm, 10);
        assert!(sim.state().timestamp > 0.0);

        let mut config = base_config();
        config.drone.initial_position = Vec3::new(5.0, 5.0, 5.0);
        sim.reinitialize(config).unwrap();
        assert_eq!(sim.state().position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(sim.state().timestamp, 0.0);
        assert_eq!(sim.run_state(), RunState::Idle);
    }
}
