pub mod body;
pub mod broad_phase;
pub mod c_api;
pub mod config;
pub mod error;
pub mod gravity;
pub mod integrator;
pub mod narrow_phase;
pub mod simulation;
pub mod utils;

pub use body::{Aabb, Body, Kinematics, Shape};
pub use broad_phase::{BroadPhase, Endpoint};
pub use config::{BeltConfig, CentralBodyConfig, SimulationConfig};
pub use error::{ConfigError, Error, Result};
pub use integrator::{Euler, Integrate, IntegratorKind, RungeKutta4};
pub use simulation::{Collision, Simulation, StepReport, World};
pub use ultraviolet;
