use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a simulation.
///
/// The numerical core itself has no recoverable failures; everything here comes
/// from configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A configuration value outside the range the engine can simulate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("time step must be finite and positive, got {0}")]
    TimeStep(f64),
    #[error("spin rate must be finite, got {0}")]
    SpinRate(f64),
    #[error("central body mass must be finite and positive, got {0}")]
    CentralMass(f64),
    #[error("central body radius must be finite and positive, got {0}")]
    CentralRadius(f32),
    #[error("{field} must have finite components")]
    NonFinite { field: &'static str },
    #[error("belt body mass {mass} +/- {jitter} is not strictly positive")]
    BeltMass { mass: f64, jitter: f64 },
    #[error("belt body radius {radius} +/- {jitter} is not strictly positive")]
    BeltRadius { radius: f32, jitter: f32 },
    #[error("belt orbit radius {radius} +/- {jitter} is not strictly positive")]
    OrbitRadius { radius: f64, jitter: f64 },
    #[error("orbital speed factor range [{min}, {min} + {span}) is invalid")]
    SpeedFactor { min: f64, span: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
