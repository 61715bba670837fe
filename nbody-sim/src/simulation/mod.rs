// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Simulation loop orchestration
//!
//! One step is the fixed cycle: compute forces from the current
//! generation → integrate into the next generation → verify the result is
//! finite → commit (buffer swap). The time step is clamped to
//! [`MAX_TIMESTEP`] so a long wall-clock gap (a pause, a debugger stop)
//! never becomes an unbounded physics step.
//!
//! `dt` is always an explicit parameter of [`Simulation::step`]. Deriving
//! it from wall-clock time is the caller's concern, served by
//! [`StepClock`], which keeps the real-time coupling out of the testable
//! core.

use std::time::Instant;

use glam::Vec3;

use crate::error::SimulationError;
use crate::forces::{DirectGravity, GRAVITATIONAL_CONSTANT};
use crate::integration;
use crate::particles::{Generations, ParticleSet};

/// Upper bound applied to every time step before integration.
///
/// Steps larger than this destabilize the explicit integrator badly
/// enough to scatter the system.
pub const MAX_TIMESTEP: f32 = 2.0;

/// Default scale from elapsed wall-clock milliseconds to simulation time.
pub const TIMESTEP_FACTOR: f32 = 1.0e-4;

/// Tunable simulation parameters, fixed at startup.
///
/// # Example
///
/// ```
/// use nbody_sim::SimulationConfig;
///
/// let config = SimulationConfig { threads: 4, ..SimulationConfig::default() };
/// assert_eq!(config.max_timestep, nbody_sim::MAX_TIMESTEP);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Gravitational constant.
    pub g: f32,
    /// Per-step time-step clamp.
    pub max_timestep: f32,
    /// Worker threads for the force pass. `0` uses Rayon's ambient pool.
    pub threads: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            g: GRAVITATIONAL_CONSTANT,
            max_timestep: MAX_TIMESTEP,
            threads: 0,
        }
    }
}

/// The N-body simulation: particle state plus the step cycle.
///
/// External collaborators get read-only views: the renderer reads
/// [`Simulation::particles`] after each step, a loader builds the
/// [`ParticleSet`] before the first step. Nothing outside the step cycle
/// mutates physical state.
pub struct Simulation {
    generations: Generations,
    accels: Vec<Vec3>,
    gravity: DirectGravity,
    max_timestep: f32,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
    #[cfg(feature = "parallel")]
    sequential_fallback: bool,
    time: f64,
    steps: u64,
}

impl Simulation {
    /// Create a simulation over `set` with the given configuration.
    ///
    /// Builds the worker pool when `config.threads > 0`. If the pool
    /// cannot be built the simulation still constructs, logs a warning,
    /// and runs the force pass single-threaded; degraded parallelism is
    /// reported, never silent.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidMass`] if any particle mass is
    /// not positive and finite.
    ///
    /// # Panics
    ///
    /// Panics if `config.g` is negative/non-finite or
    /// `config.max_timestep` is not positive and finite.
    pub fn new(set: ParticleSet, config: SimulationConfig) -> Result<Self, SimulationError> {
        assert!(
            config.max_timestep > 0.0 && config.max_timestep.is_finite(),
            "Maximum timestep must be positive and finite"
        );
        set.validate_masses()?;

        let gravity = DirectGravity::new(config.g);
        let accels = vec![Vec3::ZERO; set.len()];

        #[cfg(feature = "parallel")]
        let (pool, sequential_fallback) = if config.threads == 0 {
            log::info!("force pass on ambient rayon pool");
            (None, false)
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(config.threads).build() {
                Ok(pool) => {
                    log::info!("force pass on {} worker threads", config.threads);
                    (Some(pool), false)
                }
                Err(e) => {
                    log::warn!("worker pool unavailable ({}), falling back to single-threaded force pass", e);
                    (None, true)
                }
            }
        };

        #[cfg(not(feature = "parallel"))]
        log::info!("parallel feature disabled, force pass is single-threaded");

        log::info!("simulation initialized with {} particles", set.len());

        Ok(Simulation {
            generations: Generations::new(set),
            accels,
            gravity,
            max_timestep: config.max_timestep,
            #[cfg(feature = "parallel")]
            pool,
            #[cfg(feature = "parallel")]
            sequential_fallback,
            time: 0.0,
            steps: 0,
        })
    }

    /// Advance the simulation by one step of (at most) `dt`.
    ///
    /// `dt` is clamped to the configured maximum before integration; the
    /// value actually applied is returned. A `dt` of zero is a valid
    /// no-op step.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NonFiniteState`] if the integrated
    /// state contains a NaN or infinity (a degenerate close encounter
    /// under unsoftened gravity). The step is not committed: the current
    /// generation still holds the last good state.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is negative or non-finite.
    pub fn step(&mut self, dt: f32) -> Result<f32, SimulationError> {
        assert!(dt.is_finite() && dt >= 0.0, "Timestep must be non-negative and finite");
        let dt = dt.min(self.max_timestep);

        self.compute_accelerations();

        let (current, next) = self.generations.split();
        integration::integrate(current, &self.accels, dt, next);

        if let Some(index) = next.first_non_finite() {
            log::error!("particle {} became non-finite at step {}; step dropped", index, self.steps);
            return Err(SimulationError::NonFiniteState { index });
        }

        self.generations.commit();
        self.time += f64::from(dt);
        self.steps += 1;
        Ok(dt)
    }

    /// Run the force pass for the current generation into `self.accels`.
    ///
    /// All particles' accelerations complete before integration starts;
    /// the join is implicit in the parallel iterator.
    fn compute_accelerations(&mut self) {
        let current = self.generations.current();

        #[cfg(feature = "parallel")]
        match (&self.pool, self.sequential_fallback) {
            (Some(pool), _) => pool.install(|| self.gravity.accelerations(current, &mut self.accels)),
            (None, true) => self.gravity.accelerations_sequential(current, &mut self.accels),
            (None, false) => self.gravity.accelerations(current, &mut self.accels),
        }

        #[cfg(not(feature = "parallel"))]
        self.gravity.accelerations_sequential(current, &mut self.accels);
    }

    /// Read-only view of the current particle generation.
    pub fn particles(&self) -> &ParticleSet {
        self.generations.current()
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles().len()
    }

    /// Whether the simulation holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles().is_empty()
    }

    /// Accumulated simulation time across committed steps.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of committed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether the force pass runs on multiple workers.
    pub fn is_parallel(&self) -> bool {
        #[cfg(feature = "parallel")]
        {
            !self.sequential_fallback
        }
        #[cfg(not(feature = "parallel"))]
        {
            false
        }
    }

    /// Replace the particle state, e.g. after an explicit snapshot reload.
    ///
    /// Resets the step counter and accumulated time.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidMass`] if the new set fails mass
    /// validation.
    pub fn reset(&mut self, set: ParticleSet) -> Result<(), SimulationError> {
        set.validate_masses()?;
        self.accels = vec![Vec3::ZERO; set.len()];
        self.generations = Generations::new(set);
        self.time = 0.0;
        self.steps = 0;
        Ok(())
    }

    /// Consume the simulation, returning the current particle state.
    pub fn into_particles(self) -> ParticleSet {
        self.generations.into_current()
    }
}

/// Wall-clock time-step source for interactive callers.
///
/// Reproduces the renderer-loop coupling of physics step size to real
/// elapsed time: each [`StepClock::tick`] yields elapsed milliseconds
/// since the previous tick scaled by a fixed factor. The result is raw
/// ([`Simulation::step`] applies the clamp) and the core never calls
/// this itself.
///
/// # Example
///
/// ```no_run
/// use nbody_sim::StepClock;
///
/// let mut clock = StepClock::new();
/// loop {
///     let dt = clock.tick();
///     // sim.step(dt)?; render();
/// #   break;
/// }
/// ```
#[derive(Debug)]
pub struct StepClock {
    last: Instant,
    factor: f32,
}

impl StepClock {
    /// Create a clock with the default [`TIMESTEP_FACTOR`].
    pub fn new() -> Self {
        StepClock::with_factor(TIMESTEP_FACTOR)
    }

    /// Create a clock scaling elapsed milliseconds by `factor`.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is not positive and finite.
    pub fn with_factor(factor: f32) -> Self {
        assert!(factor > 0.0 && factor.is_finite(), "Timestep factor must be positive and finite");
        StepClock { last: Instant::now(), factor }
    }

    /// Milliseconds since the previous tick, scaled by the factor.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last).as_secs_f32() * 1000.0;
        self.last = now;
        elapsed_ms * self.factor
    }
}

impl Default for StepClock {
    fn default() -> Self {
        StepClock::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Particle;

    fn distant_pair() -> ParticleSet {
        ParticleSet::from_particles(&[
            Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0),
            Particle::new(Vec3::new(1.0e6, 0.0, 0.0), Vec3::ZERO, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_dt_clamped_to_maximum() {
        let mut sim = Simulation::new(distant_pair(), SimulationConfig::default()).unwrap();
        let applied = sim.step(1.0e9).unwrap();
        assert_eq!(applied, MAX_TIMESTEP);
    }

    #[test]
    fn test_dt_below_maximum_passes_through() {
        let mut sim = Simulation::new(distant_pair(), SimulationConfig::default()).unwrap();
        let applied = sim.step(0.25).unwrap();
        assert_eq!(applied, 0.25);
    }

    #[test]
    fn test_zero_dt_identity_step() {
        // Stationary bodies at large separation, dt = 0: state unchanged.
        let set = distant_pair();
        let before: Vec<_> = (0..set.len()).map(|i| set.particle(i)).collect();
        let mut sim = Simulation::new(set, SimulationConfig::default()).unwrap();
        sim.step(0.0).unwrap();

        for (i, p) in before.iter().enumerate() {
            assert!((sim.particles().position(i) - p.position).length() < 1e-6);
            assert!((sim.particles().velocity(i) - p.velocity).length() < 1e-6);
        }
        assert_eq!(sim.steps(), 1);
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    #[should_panic(expected = "Timestep must be non-negative and finite")]
    fn test_negative_dt_panics() {
        let mut sim = Simulation::new(distant_pair(), SimulationConfig::default()).unwrap();
        let _ = sim.step(-1.0);
    }

    #[test]
    #[should_panic(expected = "Maximum timestep must be positive and finite")]
    fn test_invalid_max_timestep_panics() {
        let config = SimulationConfig { max_timestep: 0.0, ..SimulationConfig::default() };
        let _ = Simulation::new(distant_pair(), config);
    }

    #[test]
    fn test_degenerate_encounter_reported_not_committed() {
        // Enormous masses a hair apart: the pair force overflows f32 and
        // integration produces infinities.
        let set = ParticleSet::from_particles(&[
            Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0e30),
            Particle::new(Vec3::new(1.0e-18, 0.0, 0.0), Vec3::ZERO, 1.0e30),
        ])
        .unwrap();
        let mut sim = Simulation::new(set, SimulationConfig::default()).unwrap();

        let err = sim.step(1.0).unwrap_err();
        assert!(matches!(err, SimulationError::NonFiniteState { .. }));

        // Current generation untouched, counters unchanged.
        assert_eq!(sim.particles().position(0), Vec3::ZERO);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.particles().first_non_finite(), None);
    }

    #[test]
    fn test_two_body_attraction_moves_particles_together() {
        let set = ParticleSet::from_particles(&[
            Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0e15),
            Particle::new(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 1.0e15),
        ])
        .unwrap();
        let mut sim = Simulation::new(set, SimulationConfig::default()).unwrap();

        let initial_gap = 100.0;
        for _ in 0..10 {
            sim.step(0.5).unwrap();
        }
        let gap = (sim.particles().position(1) - sim.particles().position(0)).length();
        assert!(gap < initial_gap, "bodies did not approach: gap = {}", gap);
        assert_eq!(sim.steps(), 10);
        assert!((sim.time() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_replaces_state_and_counters() {
        let mut sim = Simulation::new(distant_pair(), SimulationConfig::default()).unwrap();
        sim.step(0.5).unwrap();

        let replacement =
            ParticleSet::from_particles(&[Particle::new(Vec3::ONE, Vec3::ZERO, 3.0)]).unwrap();
        sim.reset(replacement).unwrap();
        assert_eq!(sim.len(), 1);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.particles().mass(0), 3.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_explicit_worker_count() {
        let config = SimulationConfig { threads: 2, ..SimulationConfig::default() };
        let mut sim = Simulation::new(distant_pair(), config).unwrap();
        assert!(sim.is_parallel());
        sim.step(0.5).unwrap();
    }

    #[test]
    fn test_step_clock_produces_nonnegative_dt() {
        let mut clock = StepClock::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let dt = clock.tick();
        assert!(dt >= 0.0);
        // 5 ms at the default factor is a tiny step, far below the clamp.
        assert!(dt < MAX_TIMESTEP);
    }

    #[test]
    #[should_panic(expected = "Timestep factor must be positive and finite")]
    fn test_step_clock_invalid_factor() {
        StepClock::with_factor(0.0);
    }
}
