use crate::{
    body::Body,
    broad_phase::BroadPhase,
    config::SimulationConfig,
    error::Result,
    integrator::{Integrate, IntegratorKind},
    narrow_phase,
    utils,
};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};
use ultraviolet::{DBivec3, DMat4, DRotor3, DVec3};

use std::f64::consts::TAU;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// A collision resolved during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// Lower body index of the pair.
    pub first: usize,
    pub second: usize,
    /// Time of impact from the start of the tick.
    pub time: f64,
}

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Pairs the broad phase passed to the narrow phase.
    pub candidates: usize,
    pub collisions: Vec<Collision>,
}

/// The mutable simulation state: bodies plus the broad-phase buffers built from them.
///
/// Index 0 of [`World::bodies`] is always the central body; the rest is the belt.
#[derive(Debug)]
pub struct World {
    bodies: Vec<Body>,
    broad_phase: BroadPhase,
    /// Bumped whenever the body set is replaced.
    generation: u64,
    frame: u64,
    integrator: IntegratorKind,
    parallel: bool,
    spin_rate: f64,
    spin_angle: f64,
    /// Axis of the belt's orbit plane.
    up: DVec3,
    rng: fastrand::Rng,
    /// Per-body model matrices, refreshed after every commit.
    transforms: Vec<DMat4>,
}

impl World {
    /// Seeds the configured scenario: the central body and a belt orbiting it.
    pub fn new(config: &SimulationConfig) -> Self {
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let up = DVec3::new(1.0, 1.0, 1.0).normalized();
        let central = utils::central_body(&config.central);
        let belt = utils::asteroid_belt(
            &mut rng,
            &config.belt,
            config.central.position(),
            config.central.mass,
            up,
        );

        let mut world = Self::with_bodies(central, belt, config.integrator);
        world.rng = rng;
        world.up = up;
        world.parallel = config.parallel;
        world.spin_rate = config.spin_rate;
        world
    }

    /// Builds a world from explicit bodies, without spin or parallelism.
    pub fn with_bodies(central: Body, belt: Vec<Body>, integrator: IntegratorKind) -> Self {
        let mut world = Self {
            bodies: Vec::with_capacity(belt.len() + 1),
            broad_phase: BroadPhase::new(),
            generation: 0,
            frame: 0,
            integrator,
            parallel: false,
            spin_rate: 0.0,
            spin_angle: 0.0,
            up: DVec3::unit_y(),
            rng: fastrand::Rng::with_seed(0),
            transforms: Vec::new(),
        };
        world.replace_bodies(central, belt);
        world
    }

    /// Swaps in a new body set and rebuilds the broad-phase endpoints for it.
    pub fn replace_bodies(&mut self, central: Body, belt: Vec<Body>) {
        self.broad_phase.clear();
        self.generation += 1;
        self.bodies.clear();
        self.bodies.push(central);
        self.bodies.extend(belt);
        self.broad_phase.refresh(self.bodies.len(), self.generation);
        self.refresh_transforms();
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn central(&self) -> &Body {
        &self.bodies[0]
    }

    pub fn belt(&self) -> &[Body] {
        &self.bodies[1..]
    }

    pub fn broad_phase(&self) -> &BroadPhase {
        &self.broad_phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of ticks run since construction.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn integrator(&self) -> IntegratorKind {
        self.integrator
    }

    pub fn set_integrator(&mut self, integrator: IntegratorKind) {
        self.integrator = integrator;
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Model matrices of every body as of the last commit.
    pub fn transforms(&self) -> &[DMat4] {
        &self.transforms
    }

    /// Current spin angle of the central body, in `[0, 2π]`.
    pub fn spin_angle(&self) -> f64 {
        self.spin_angle
    }

    /// Advances every body by `dt`.
    /// 1. Stages the next state of the central body under the whole belt, then of
    ///    each belt body under the central body.
    /// 2. Optionally finds colliding pairs on the staged state and rewrites it.
    /// 3. Commits the staged state and refreshes transforms.
    pub fn step(&mut self, dt: f64, collisions: bool) -> StepReport {
        self.integrate(dt);
        let report = if collisions {
            self.collide(dt)
        } else {
            StepReport::default()
        };
        self.commit();

        self.spin_central(self.spin_rate);
        self.refresh_transforms();
        self.frame += 1;
        report
    }

    /// Stages the next state of every body. Gravity is applied in two passes, one
    /// per direction, and each reads only current state.
    pub fn integrate(&mut self, dt: f64) {
        let integrator = self.integrator;
        let Some((central, belt)) = self.bodies.split_first_mut() else {
            return;
        };
        integrator.advance(central, belt, dt);
        integrator.advance_all(belt, std::slice::from_ref(&*central), dt, self.parallel);
    }

    /// Runs the broad phase over staged state and resolves every candidate pair.
    ///
    /// Each pair is resolved from current state, so the order of resolution does not
    /// change which pairs collide; a body hit twice keeps the last response.
    pub fn collide(&mut self, dt: f64) -> StepReport {
        if self.broad_phase.refresh(self.bodies.len(), self.generation) {
            debug!(
                bodies = self.bodies.len(),
                generation = self.generation,
                "rebuilt sweep endpoints"
            );
        }

        let pairs = self.broad_phase.sweep(&self.bodies);
        let mut report = StepReport {
            candidates: pairs.len(),
            collisions: Vec::new(),
        };
        for &(first, second) in pairs {
            let (a, b) = narrow_phase::pair_mut(&mut self.bodies, first, second);
            if let Some(time) = narrow_phase::collide(a, b, dt) {
                trace!(first, second, time, "collision");
                report.collisions.push(Collision { first, second, time });
            }
        }
        report
    }

    /// Copies staged state into current state for every body.
    pub fn commit(&mut self) {
        for body in &mut self.bodies {
            body.commit();
        }
    }

    /// Rotates the central body about Y by `delta` radians.
    /// Non-finite deltas are ignored.
    pub fn spin_central(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.spin_angle += delta;
        if self.spin_angle > TAU {
            self.spin_angle -= TAU;
        } else if self.spin_angle < 0.0 {
            self.spin_angle += TAU;
        }

        let rotation = self.spin_rotation();
        if let Some(central) = self.bodies.first_mut() {
            central.set_rotation(rotation);
        }
    }

    fn spin_rotation(&self) -> DRotor3 {
        let axis = DBivec3::from_normalized_axis(DVec3::unit_y());
        DRotor3::from_angle_plane(self.spin_angle, axis)
    }

    fn refresh_transforms(&mut self) {
        self.transforms.clear();
        self.transforms
            .extend(self.bodies.iter().map(Body::model_transform));
    }

    /// Replaces the belt with a freshly seeded one on a new random orbit plane and
    /// rebuilds the central body from `config`, keeping its current spin.
    pub fn restart(&mut self, config: &SimulationConfig) {
        self.up = utils::random_unit_vector(&mut self.rng);
        let belt = utils::asteroid_belt(
            &mut self.rng,
            &config.belt,
            config.central.position(),
            config.central.mass,
            self.up,
        );

        let mut central = utils::central_body(&config.central);
        central.set_rotation(self.spin_rotation());

        self.replace_bodies(central, belt);
        debug!(
            bodies = self.bodies.len(),
            generation = self.generation,
            "restarted simulation"
        );
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    pub fn momentum(&self) -> DVec3 {
        self.bodies
            .iter()
            .fold(DVec3::zero(), |p, body| p + body.momentum())
    }
}

/// Thread-safe driver around a [`World`].
///
/// Ticks and restarts are serialized by one lock over the world. Pausing and the
/// collision toggle are flags read at the top of each tick.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    paused: AtomicBool,
    collisions: AtomicBool,
    world: Mutex<World>,
}

impl Default for Simulation {
    fn default() -> Self {
        let config = SimulationConfig::default();
        let world = World::new(&config);
        Self::with_world(config, world)
    }
}

impl Simulation {
    /// Validates `config` and seeds its scenario.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let world = World::new(&config);
        debug!(
            bodies = world.bodies().len(),
            integrator = config.integrator.name(),
            seed = config.seed,
            "created simulation"
        );
        Ok(Self::with_world(config, world))
    }

    /// Loads a YAML configuration file and seeds its scenario.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(SimulationConfig::from_path(path)?)
    }

    /// Drives an existing world. `config` supplies the time step, the collision
    /// default, and the scenario used on restart.
    pub fn with_world(config: SimulationConfig, world: World) -> Self {
        Self {
            paused: AtomicBool::new(false),
            collisions: AtomicBool::new(config.collisions),
            world: Mutex::new(world),
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks once with the configured fixed step.
    pub fn step(&self) -> Option<StepReport> {
        self.tick(self.config.dt)
    }

    /// Runs one tick of `dt`, or nothing when paused.
    pub fn tick(&self, dt: f64) -> Option<StepReport> {
        if self.is_paused() {
            return None;
        }
        let collisions = self.collisions_enabled();
        let mut world = self.world.lock();
        let report = world.step(dt, collisions);
        if !report.collisions.is_empty() {
            trace!(
                frame = world.frame(),
                collisions = report.collisions.len(),
                "resolved collisions"
            );
        }
        Some(report)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_collisions_enabled(&self, enabled: bool) {
        self.collisions.store(enabled, Ordering::SeqCst);
    }

    pub fn collisions_enabled(&self) -> bool {
        self.collisions.load(Ordering::SeqCst)
    }

    pub fn integrator(&self) -> IntegratorKind {
        self.world.lock().integrator()
    }

    pub fn set_integrator(&self, integrator: IntegratorKind) {
        self.world.lock().set_integrator(integrator);
    }

    /// Reseeds the scenario under the world lock, then resumes ticking.
    pub fn restart(&self) {
        self.world.lock().restart(&self.config);
        self.resume();
    }

    /// Exclusive access to the world. Ticks and restarts wait while it is held.
    pub fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock()
    }

    pub fn body_count(&self) -> usize {
        self.world.lock().bodies().len()
    }

    pub fn frame(&self) -> u64 {
        self.world.lock().frame()
    }

    /// Snapshot of every body's model matrix.
    pub fn transforms(&self) -> Vec<DMat4> {
        self.world.lock().transforms().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Shape;
    use crate::config::BeltConfig;

    fn far_point(mass: f64) -> Body {
        Body::new(mass, DVec3::new(0.0, 1.0e9, 0.0), DVec3::zero(), Shape::Point)
    }

    fn small_config(count: usize) -> SimulationConfig {
        SimulationConfig {
            belt: BeltConfig { count, ..BeltConfig::default() },
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn world_keeps_central_body_first() {
        let world = World::new(&small_config(10));
        assert_eq!(world.bodies().len(), 11);
        assert_eq!(world.central().mass(), 15000.0);
        assert_eq!(world.belt().len(), 10);
        assert_eq!(world.transforms().len(), 11);
    }

    #[test]
    fn head_on_pair_collides_within_a_tick() {
        let a = Body::sphere(1.0, DVec3::zero(), DVec3::new(1.0, 0.0, 0.0), 1.0);
        let b = Body::sphere(1.0, DVec3::new(3.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0), 1.0);
        let mut world = World::with_bodies(far_point(1e-9), vec![a, b], IntegratorKind::Euler);

        let report = world.step(1.0, true);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(report.collisions[0].first, 1);
        assert_eq!(report.collisions[0].second, 2);
        assert!((report.collisions[0].time - 0.5).abs() < 1e-9);

        let belt = world.belt();
        assert!(belt[0].velocity().x < -0.99);
        assert!(belt[1].velocity().x > 0.99);
        // committed, so the staging buffer is closed again
        assert_eq!(belt[0].current(), belt[0].next());
    }

    #[test]
    fn disabled_collisions_let_spheres_pass() {
        let a = Body::sphere(1.0, DVec3::zero(), DVec3::new(1.0, 0.0, 0.0), 1.0);
        let b = Body::sphere(1.0, DVec3::new(3.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0), 1.0);
        let mut world = World::with_bodies(far_point(1e-9), vec![a, b], IntegratorKind::Euler);

        let report = world.step(1.0, false);
        assert_eq!(report, StepReport::default());
        assert!(world.belt()[0].velocity().x > 0.99);
        assert_eq!(world.broad_phase().endpoint_count(), 2 * world.bodies().len());
    }

    #[test]
    fn single_sphere_never_collides() {
        let ball = Body::sphere(1.0, DVec3::zero(), DVec3::zero(), 1.0);
        let mut world = World::with_bodies(far_point(1e-12), vec![ball], IntegratorKind::RungeKutta4);
        for _ in 0..10 {
            let report = world.step(0.1, true);
            assert_eq!(report.candidates, 0);
            assert!(report.collisions.is_empty());
        }
        assert_eq!(world.broad_phase().endpoint_count(), 4);
    }

    #[test]
    fn rk4_step_stages_from_committed_state() {
        // two passes per tick, each body integrated once, starting from next == current
        let config = small_config(3);
        let mut world = World::new(&config);
        let mut reference = World::new(&config);

        world.integrate(config.dt);
        let staged: Vec<_> = world.bodies().iter().map(|b| *b.next()).collect();
        world.commit();
        world.integrate(config.dt);

        let rk4 = IntegratorKind::RungeKutta4;
        reference.step(config.dt, false);
        let (central, belt) = reference.bodies.split_first_mut().unwrap();
        rk4.advance(central, belt, config.dt);
        rk4.advance_all(belt, std::slice::from_ref(&*central), config.dt, false);

        for ((body, expected), first) in world.bodies().iter().zip(reference.bodies()).zip(&staged) {
            assert_eq!(body.next(), expected.next());
            assert_eq!(body.position(), first.position);
        }
    }

    #[test]
    fn spin_wraps_and_ignores_nan() {
        let mut world = World::new(&small_config(0));
        world.spin_central(3.0);
        world.spin_central(f64::NAN);
        assert_eq!(world.spin_angle(), 3.0);
        world.spin_central(4.0);
        assert!((world.spin_angle() - (7.0 - TAU)).abs() < 1e-12);
        world.spin_central(-2.0);
        assert!(world.spin_angle() >= 0.0);
    }

    #[test]
    fn restart_rebuilds_body_set() {
        let config = small_config(25);
        let mut world = World::new(&config);
        world.step(config.dt, true);
        assert_eq!(world.broad_phase().endpoint_count(), 52);
        let generation = world.generation();
        let before = world.belt()[0].position();

        world.restart(&config);
        assert_eq!(world.generation(), generation + 1);
        assert_eq!(world.broad_phase().endpoint_count(), 52);
        assert_eq!(world.bodies().len(), 26);
        assert_ne!(world.belt()[0].position(), before);
        assert_eq!(world.central().position(), config.central.position());
        assert_eq!(world.central().velocity(), config.central.velocity());

        world.step(config.dt, true);
        assert_eq!(world.broad_phase().endpoint_count(), 52);
    }

    #[test]
    fn restart_without_collisions_keeps_endpoint_list_full() {
        let sim = Simulation::new(SimulationConfig { collisions: false, ..small_config(10) }).unwrap();
        sim.step();
        sim.restart();
        let world = sim.lock();
        assert_eq!(world.bodies().len(), 11);
        assert_eq!(world.broad_phase().endpoint_count(), 2 * world.bodies().len());
    }

    #[test]
    fn restart_rebuilds_central_body_from_config() {
        let config = small_config(4);
        let heavy = Body::sphere(
            1.0e6,
            DVec3::new(5.0, 5.0, 5.0),
            DVec3::new(1.0, 0.0, 0.0),
            40.0,
        );
        let mut world = World::with_bodies(heavy, Vec::new(), IntegratorKind::RungeKutta4);
        world.spin_central(1.5);

        world.restart(&config);
        let central = world.central();
        assert_eq!(central.mass(), config.central.mass);
        assert_eq!(central.shape(), Shape::Point);
        assert_eq!(central.scale(), DVec3::broadcast(config.central.scale));
        assert_eq!(central.position(), config.central.position());
        assert_eq!(central.velocity(), config.central.velocity());
        assert_eq!(world.spin_angle(), 1.5);
        assert_eq!(world.transforms()[0], central.model_transform());
    }

    #[test]
    fn paused_simulation_skips_ticks() {
        let sim = Simulation::new(small_config(5)).unwrap();
        assert!(sim.step().is_some());
        sim.pause();
        assert!(sim.step().is_none());
        assert_eq!(sim.frame(), 1);
        sim.resume();
        assert!(sim.step().is_some());
        assert_eq!(sim.frame(), 2);
    }

    #[test]
    fn restart_resumes() {
        let sim = Simulation::new(small_config(5)).unwrap();
        sim.pause();
        sim.restart();
        assert!(!sim.is_paused());
        assert_eq!(sim.body_count(), 6);
    }

    #[test]
    fn controls_reach_the_world() {
        let sim = Simulation::new(small_config(5)).unwrap();
        assert!(sim.collisions_enabled());
        sim.set_collisions_enabled(false);
        sim.step();
        assert_eq!(sim.lock().broad_phase().endpoint_count(), 12);

        sim.set_integrator(IntegratorKind::Euler);
        assert_eq!(sim.integrator(), IntegratorKind::Euler);
        assert_eq!(sim.transforms().len(), 6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimulationConfig { dt: -1.0, ..SimulationConfig::default() };
        assert!(Simulation::new(config).is_err());
    }
}
