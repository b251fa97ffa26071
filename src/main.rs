use orbit_simulation::{IntegratorKind, Simulation, SimulationConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use std::path::PathBuf;
use std::time::Instant;

/// Runs the asteroid-belt simulation headless and logs its evolution.
#[derive(Parser, Debug)]
struct Args {
    /// YAML configuration file. Defaults apply to anything it leaves out.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Integrator override: `euler` or `rk4`.
    #[arg(short, long)]
    integrator: Option<IntegratorKind>,

    /// Disable collision detection.
    #[arg(long)]
    no_collisions: bool,

    /// Scenario seed override.
    #[arg(long)]
    seed: Option<u64>,

    /// Belt size override.
    #[arg(short = 'n', long)]
    asteroids: Option<usize>,

    /// Log a summary every this many ticks.
    #[arg(long, default_value_t = 100)]
    report_every: u64,
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(integrator) = args.integrator {
        config.integrator = integrator;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(count) = args.asteroids {
        config.belt.count = count;
    }
    if args.no_collisions {
        config.collisions = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let sim = Simulation::new(config).context("invalid simulation configuration")?;

    info!(
        bodies = sim.body_count(),
        integrator = sim.integrator().name(),
        collisions = sim.collisions_enabled(),
        dt = sim.config().dt,
        "starting simulation"
    );

    let start = Instant::now();
    let mut total_collisions = 0usize;
    for tick in 1..=args.ticks {
        let Some(report) = sim.step() else {
            continue;
        };
        total_collisions += report.collisions.len();

        if args.report_every > 0 && tick % args.report_every == 0 {
            let world = sim.lock();
            let energy = world.kinetic_energy();
            let momentum = world.momentum();
            if !energy.is_finite() {
                warn!(tick, "kinetic energy is no longer finite");
            }
            info!(
                tick,
                kinetic_energy = energy,
                momentum = momentum.mag(),
                candidates = report.candidates,
                collisions = total_collisions,
                "progress"
            );
        }
    }

    info!(
        ticks = args.ticks,
        collisions = total_collisions,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "finished"
    );
    Ok(())
}
