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
//! Direct-summation Newtonian gravity
//!
//! Computes, for every particle, the net gravitational acceleration from
//! all other particles by brute-force pairwise summation.
//!
//! # Physics Background
//!
//! Newton's law of universal gravitation gives the attraction between two
//! point masses:
//!
//! **F = G * (m₁ * m₂) / r²**
//!
//! Each particle's force accumulates contributions from every other
//! particle, then divides by its own mass to yield acceleration. The cost
//! is O(N²) per evaluation, which is inherent to the direct method: no
//! tree or multipole approximation is applied.
//!
//! # Softening
//!
//! There is deliberately **no softening term**: forces follow the exact
//! point-mass formula, and close encounters can produce arbitrarily large
//! accelerations. The single special case is exact coincidence, where
//! `r² == 0` and the pair contributes zero force (a documented policy to
//! avoid division by zero, not a numerical error). Non-finite state
//! arising from near (but not exact) coincidence is caught downstream by
//! the step's finiteness check.
//!
//! # Parallelism
//!
//! The per-particle outer loop is embarrassingly parallel: each output
//! slot is owned by exactly one worker and the input generation is shared
//! read-only. With the `parallel` feature, Rayon's work-stealing
//! scheduler distributes the outer loop across worker threads. Each
//! particle's inner sum always runs in index order, so results are
//! identical regardless of worker count.

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::particles::ParticleSet;

/// Gravitational constant in SI units (m³/(kg⋅s²)).
pub const GRAVITATIONAL_CONSTANT: f32 = 6.673e-11;

/// Brute-force O(N²) gravitational force evaluator.
///
/// # Example
///
/// ```
/// use nbody_sim::{DirectGravity, Particle, ParticleSet, GRAVITATIONAL_CONSTANT};
/// use glam::Vec3;
///
/// let set = ParticleSet::from_particles(&[
///     Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0e15),
///     Particle::new(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 1.0e15),
/// ]).unwrap();
///
/// let gravity = DirectGravity::new(GRAVITATIONAL_CONSTANT);
/// let mut accels = vec![Vec3::ZERO; set.len()];
/// gravity.accelerations(&set, &mut accels);
/// assert!(accels[0].x > 0.0); // pulled toward the second particle
/// ```
#[derive(Debug, Clone)]
pub struct DirectGravity {
    g: f32,
}

impl DirectGravity {
    /// Create an evaluator with the given gravitational constant.
    ///
    /// # Panics
    ///
    /// Panics if `g` is negative or not finite.
    pub fn new(g: f32) -> Self {
        assert!(g >= 0.0 && g.is_finite(), "Gravitational constant must be non-negative and finite");
        DirectGravity { g }
    }

    /// The gravitational constant in use.
    pub fn g(&self) -> f32 {
        self.g
    }

    /// Net acceleration on particle `i` from every other particle.
    ///
    /// Pairs at exactly zero separation contribute nothing.
    fn acceleration_on(&self, set: &ParticleSet, i: usize) -> Vec3 {
        let positions = set.positions();
        let velocities = set.velocities();

        let p_i = positions[i].truncate();
        let m_i = velocities[i].w;

        let mut force = Vec3::ZERO;
        for j in 0..positions.len() {
            if j == i {
                continue;
            }

            let d = positions[j].truncate() - p_i;
            let r_squared = d.length_squared();
            if r_squared > 0.0 {
                // f = G * m_i * m_j / r², directed along the unit vector
                // from i toward j.
                let f = self.g * m_i * velocities[j].w / r_squared;
                force += f * (d / r_squared.sqrt());
            }
        }

        force / m_i
    }

    /// Compute accelerations for every particle into `out`.
    ///
    /// `out[i]` is overwritten with the net acceleration on particle `i`.
    /// Runs on Rayon's ambient thread pool; call from inside
    /// [`rayon::ThreadPool::install`] to pin it to a specific pool.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != set.len()`.
    #[cfg(feature = "parallel")]
    pub fn accelerations(&self, set: &ParticleSet, out: &mut [Vec3]) {
        assert_eq!(out.len(), set.len(), "output slice must match particle count");
        out.par_iter_mut()
            .enumerate()
            .for_each(|(i, a)| *a = self.acceleration_on(set, i));
    }

    /// Compute accelerations for every particle into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != set.len()`.
    #[cfg(not(feature = "parallel"))]
    pub fn accelerations(&self, set: &ParticleSet, out: &mut [Vec3]) {
        self.accelerations_sequential(set, out);
    }

    /// Single-threaded acceleration pass.
    ///
    /// Always available; the fallback when no worker pool could be built.
    pub fn accelerations_sequential(&self, set: &ParticleSet, out: &mut [Vec3]) {
        assert_eq!(out.len(), set.len(), "output slice must match particle count");
        for (i, a) in out.iter_mut().enumerate() {
            *a = self.acceleration_on(set, i);
        }
    }
}

impl Default for DirectGravity {
    fn default() -> Self {
        DirectGravity::new(GRAVITATIONAL_CONSTANT)
    }
}
