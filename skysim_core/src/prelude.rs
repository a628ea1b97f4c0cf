// skysim_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::algorithms::Algorithm;
pub use crate::dynamics::integrators::{Integrator, IntegratorKind};
pub use crate::simulator::{RunOutcome, RunState, Simulator, StopHandle};

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{ConfigError, SimulatorConfig};
pub use crate::environment::{Boundaries, Environment, Obstacle};
pub use crate::spec::DroneSpec;
pub use crate::types::{ControlInput, Path, PhysicsState, SensorData, Vec3};

// --- Concrete Algorithm Implementations (Export common ones for convenience) ---
pub use crate::algorithms::hover::{HoverController, HoverGains};
pub use crate::algorithms::{ObstacleAvoidance, PathFollowingController, WaypointFollower};
pub use crate::planning::{GridPlanner, PlanningError};
