//! Simulation configuration.
//!
//! Every field has a default matching the stock asteroid-belt scenario, so a
//! YAML file only needs to list what it changes:
//!
//! ```yaml
//! dt: 0.02
//! integrator: rk4         # or "euler"
//! collisions: true
//! parallel: false         # integrate the belt with rayon
//! seed: 7
//! central:
//!   mass: 15000.0
//!   position: [0.0, 50.0, -50.0]
//!   velocity: [0.0, 0.0, 0.0]
//! belt:
//!   count: 500
//!   orbit_radius: 300.0
//!   orbit_radius_jitter: 80.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use ultraviolet::DVec3;

use crate::error::{ConfigError, Error, Result};
use crate::integrator::IntegratorKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed simulation step per tick.
    pub dt: f64,
    pub integrator: IntegratorKind,
    /// Run broad and narrow phase every tick.
    pub collisions: bool,
    /// Integrate the belt in parallel.
    pub parallel: bool,
    /// Seed of the scenario generator.
    pub seed: u64,
    /// Axial spin of the central body in radians per tick. Cosmetic only.
    pub spin_rate: f64,
    pub central: CentralBodyConfig,
    pub belt: BeltConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            integrator: IntegratorKind::RungeKutta4,
            collisions: true,
            parallel: false,
            seed: 0,
            spin_rate: 0.01,
            central: CentralBodyConfig::default(),
            belt: BeltConfig::default(),
        }
    }
}

/// The fixed central mass every belt body orbits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralBodyConfig {
    pub mass: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    /// Uniform render scale.
    pub scale: f64,
    /// Collision radius. Without one the central body never collides.
    pub radius: Option<f32>,
}

impl Default for CentralBodyConfig {
    fn default() -> Self {
        Self {
            mass: 15000.0,
            position: [0.0, 50.0, -50.0],
            velocity: [0.0; 3],
            scale: 70.0,
            radius: None,
        }
    }
}

impl CentralBodyConfig {
    pub fn position(&self) -> DVec3 {
        to_vec(self.position)
    }

    pub fn velocity(&self) -> DVec3 {
        to_vec(self.velocity)
    }
}

/// Population of small spheres seeded on near-circular orbits.
///
/// Each `*_jitter` is the half-width of a uniform range around its base value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeltConfig {
    pub count: usize,
    pub orbit_radius: f64,
    pub orbit_radius_jitter: f64,
    pub mass: f64,
    pub mass_jitter: f64,
    pub radius: f32,
    pub radius_jitter: f32,
    /// Lower bound of the factor applied to the circular orbital speed.
    pub speed_factor_min: f64,
    pub speed_factor_span: f64,
}

impl Default for BeltConfig {
    fn default() -> Self {
        Self {
            count: 500,
            orbit_radius: 300.0,
            orbit_radius_jitter: 80.0,
            mass: 80.0,
            mass_jitter: 2.0,
            radius: 3.0,
            radius_jitter: 0.8,
            speed_factor_min: 0.8,
            speed_factor_span: 0.5,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SimulationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorKind) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_belt_count(mut self, count: usize) -> Self {
        self.belt.count = count;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::TimeStep(self.dt));
        }
        if !self.spin_rate.is_finite() {
            return Err(ConfigError::SpinRate(self.spin_rate));
        }

        let central = &self.central;
        if !(central.mass.is_finite() && central.mass > 0.0) {
            return Err(ConfigError::CentralMass(central.mass));
        }
        if let Some(radius) = central.radius {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(ConfigError::CentralRadius(radius));
            }
        }
        for (field, v) in [
            ("central.position", central.position),
            ("central.velocity", central.velocity),
        ] {
            if v.iter().any(|c| !c.is_finite()) {
                return Err(ConfigError::NonFinite { field });
            }
        }
        if !central.scale.is_finite() {
            return Err(ConfigError::NonFinite { field: "central.scale" });
        }

        let belt = &self.belt;
        if !(belt.mass_jitter >= 0.0 && belt.mass - belt.mass_jitter > 0.0) {
            return Err(ConfigError::BeltMass { mass: belt.mass, jitter: belt.mass_jitter });
        }
        if !(belt.radius_jitter >= 0.0 && belt.radius - belt.radius_jitter > 0.0) {
            return Err(ConfigError::BeltRadius { radius: belt.radius, jitter: belt.radius_jitter });
        }
        // a belt body placed on the central mass would divide by zero in gravity
        if !(belt.orbit_radius_jitter >= 0.0 && belt.orbit_radius - belt.orbit_radius_jitter > 0.0) {
            return Err(ConfigError::OrbitRadius {
                radius: belt.orbit_radius,
                jitter: belt.orbit_radius_jitter,
            });
        }
        if !(belt.speed_factor_min >= 0.0 && belt.speed_factor_span >= 0.0)
            || !(belt.speed_factor_min + belt.speed_factor_span).is_finite()
        {
            return Err(ConfigError::SpeedFactor {
                min: belt.speed_factor_min,
                span: belt.speed_factor_span,
            });
        }
        Ok(())
    }
}

fn to_vec(v: [f64; 3]) -> DVec3 {
    DVec3::new(v[0], v[1], v[2])
}
