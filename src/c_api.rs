use crate::{
    config::SimulationConfig,
    integrator::IntegratorKind,
    simulation::Simulation,
};

/// Floats per body written by [`Simulation_CopyTransforms`].
pub const TRANSFORM_STRIDE: usize = 16;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Create() -> *mut Simulation {
    Box::into_raw(Box::new(Simulation::default()))
}

/// Returns null if the resulting configuration is invalid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_CreateWithSeed(seed: u64, asteroids: usize) -> *mut Simulation {
    let config = SimulationConfig::default()
        .with_seed(seed)
        .with_belt_count(asteroids);
    match Simulation::new(config) {
        Ok(sim) => Box::into_raw(Box::new(sim)),
        Err(err) => {
            tracing::warn!(%err, "rejected simulation configuration");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Destroy(handle: *mut Simulation) {
    if !handle.is_null() {
        unsafe { drop(Box::from_raw(handle)) };
    }
}

/// Ticks with the configured step. Returns the number of collisions, or -1 when paused.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Step(handle: *const Simulation) -> i64 {
    match unsafe { handle.as_ref() }.and_then(|sim| sim.step()) {
        Some(report) => report.collisions.len() as i64,
        None => -1,
    }
}

/// Ticks with a host-supplied step. Returns the number of collisions, or -1 when paused.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Tick(handle: *const Simulation, dt: f64) -> i64 {
    match unsafe { handle.as_ref() }.and_then(|sim| sim.tick(dt)) {
        Some(report) => report.collisions.len() as i64,
        None => -1,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Restart(handle: *const Simulation) {
    if let Some(sim) = unsafe { handle.as_ref() } {
        sim.restart();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Pause(handle: *const Simulation) {
    if let Some(sim) = unsafe { handle.as_ref() } {
        sim.pause();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Resume(handle: *const Simulation) {
    if let Some(sim) = unsafe { handle.as_ref() } {
        sim.resume();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_SetCollisions(handle: *const Simulation, enabled: bool) {
    if let Some(sim) = unsafe { handle.as_ref() } {
        sim.set_collisions_enabled(enabled);
    }
}

/// 0 selects Runge-Kutta 4, 1 selects Euler. Other values are ignored.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_SetIntegrator(handle: *const Simulation, integrator: u32) {
    let Some(sim) = (unsafe { handle.as_ref() }) else {
        return;
    };
    if let Some(&kind) = IntegratorKind::ALL.get(integrator as usize) {
        sim.set_integrator(kind);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodyCount(handle: *const Simulation) -> usize {
    unsafe { handle.as_ref() }.map_or(0, |sim| sim.body_count())
}

/// Writes up to `capacity` column-major model matrices into `out`, which must hold
/// `capacity * TRANSFORM_STRIDE` doubles. Body 0 is the central body.
/// Returns the number of matrices written.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_CopyTransforms(
    handle: *const Simulation,
    out: *mut f64,
    capacity: usize,
) -> usize {
    let Some(sim) = (unsafe { handle.as_ref() }) else {
        return 0;
    };
    if out.is_null() {
        return 0;
    }

    let world = sim.lock();
    let transforms = world.transforms();
    let count = transforms.len().min(capacity);
    let out = unsafe { std::slice::from_raw_parts_mut(out, count * TRANSFORM_STRIDE) };
    for (dst, m) in out.chunks_exact_mut(TRANSFORM_STRIDE).zip(transforms) {
        for (col, c) in dst.chunks_exact_mut(4).zip(m.cols.iter()) {
            col.copy_from_slice(&[c.x, c.y, c.z, c.w]);
        }
    }
    count
}
