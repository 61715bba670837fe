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
//! Particle state storage
//!
//! [`ParticleSet`] stores particle state as two planes of `Vec4`:
//! positions with the color scalar in `w`, velocities with the mass in
//! `w`. This is the snapshot record layout and the renderer's vertex
//! layout at the same time, so loading, saving, and rendering are casts
//! rather than conversions.
//!
//! [`Generations`] pairs two sets into the current/next double buffer the
//! step cycle requires: the force and integration passes only ever read
//! "current" and only ever write "next", and committing a step is a
//! buffer swap, not a copy.

use std::ops::Range;

use glam::{Vec3, Vec4};

use crate::error::SimulationError;
use crate::particles::Particle;

/// An ordered, fixed-size collection of particles.
///
/// The particle count and index identity are fixed for the lifetime of a
/// run; there is no insert or remove. Every mass is validated to be
/// positive and finite at construction.
///
/// # Examples
///
/// ```
/// use nbody_sim::{Particle, ParticleSet};
/// use glam::Vec3;
///
/// let set = ParticleSet::from_particles(&[
///     Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0),
///     Particle::new(Vec3::X, Vec3::ZERO, 2.0),
/// ]).unwrap();
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.mass(1), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    /// Per particle: (x, y, z, color scalar).
    positions: Vec<Vec4>,
    /// Per particle: (vx, vy, vz, mass).
    velocities: Vec<Vec4>,
}

impl ParticleSet {
    /// Build a set from raw position and velocity planes.
    ///
    /// The planes use the snapshot record convention: position `w` is the
    /// color scalar, velocity `w` is the mass.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidMass`] if any mass is zero,
    /// negative, or non-finite, and [`SimulationError::NonFiniteState`]
    /// if any position or velocity component is NaN or infinite.
    ///
    /// # Panics
    ///
    /// Panics if the planes differ in length; callers assembling planes
    /// from external input must check lengths first.
    pub fn from_planes(positions: Vec<Vec4>, velocities: Vec<Vec4>) -> Result<Self, SimulationError> {
        assert_eq!(
            positions.len(),
            velocities.len(),
            "position and velocity planes must have equal length"
        );
        let set = ParticleSet { positions, velocities };
        set.validate_masses()?;
        if let Some(index) = set.first_non_finite() {
            return Err(SimulationError::NonFiniteState { index });
        }
        Ok(set)
    }

    /// Build a set from particle values.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InvalidMass`] if any mass is zero,
    /// negative, or non-finite.
    pub fn from_particles(particles: &[Particle]) -> Result<Self, SimulationError> {
        let positions = particles
            .iter()
            .map(|p| p.position.extend(p.color))
            .collect();
        let velocities = particles
            .iter()
            .map(|p| p.velocity.extend(p.mass))
            .collect();
        ParticleSet::from_planes(positions, velocities)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the set holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of particle `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        self.positions[i].truncate()
    }

    /// Velocity of particle `i`.
    pub fn velocity(&self, i: usize) -> Vec3 {
        self.velocities[i].truncate()
    }

    /// Mass of particle `i`.
    pub fn mass(&self, i: usize) -> f32 {
        self.velocities[i].w
    }

    /// Color scalar of particle `i`.
    pub fn color(&self, i: usize) -> f32 {
        self.positions[i].w
    }

    /// Particle `i` as a value.
    pub fn particle(&self, i: usize) -> Particle {
        Particle {
            position: self.position(i),
            velocity: self.velocity(i),
            mass: self.mass(i),
            color: self.color(i),
        }
    }

    /// Overwrite the position of particle `i`, preserving its color scalar.
    pub fn set_position(&mut self, i: usize, position: Vec3) {
        self.positions[i] = position.extend(self.positions[i].w);
    }

    /// Overwrite the velocity of particle `i`, preserving its mass.
    pub fn set_velocity(&mut self, i: usize, velocity: Vec3) {
        self.velocities[i] = velocity.extend(self.velocities[i].w);
    }

    /// The position plane: one `(x, y, z, color)` record per particle.
    ///
    /// This is exactly the vertex stream the renderer consumes.
    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    /// The velocity plane: one `(vx, vy, vz, mass)` record per particle.
    pub fn velocities(&self) -> &[Vec4] {
        &self.velocities
    }

    /// The position plane as raw bytes, for direct vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Mutable plane access for the integration pass.
    pub(crate) fn planes_mut(&mut self) -> (&mut [Vec4], &mut [Vec4]) {
        (&mut self.positions, &mut self.velocities)
    }

    /// Derive each particle's color scalar from its mass.
    ///
    /// Masses map linearly from `lo` (color 0) to `hi` (color 1), clamped
    /// at both ends. Used at staging time to shade clusters by mass.
    ///
    /// # Panics
    ///
    /// Panics unless `lo < hi` and both are finite.
    pub fn shade_by_mass(&mut self, lo: f32, hi: f32) {
        assert!(lo.is_finite() && hi.is_finite() && lo < hi, "mass range must be finite and ordered");
        let span = hi - lo;
        for (pos, vel) in self.positions.iter_mut().zip(self.velocities.iter()) {
            pos.w = ((vel.w - lo) / span).clamp(0.0, 1.0);
        }
    }

    /// Rigidly offset a contiguous range of particles.
    ///
    /// Adds `dpos` to every position and `dvel` to every velocity in
    /// `range`. Used at staging time to place one cluster relative to
    /// another and give it bulk motion.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn displace(&mut self, range: Range<usize>, dpos: Vec3, dvel: Vec3) {
        let dpos = dpos.extend(0.0);
        let dvel = dvel.extend(0.0);
        for pos in &mut self.positions[range.clone()] {
            *pos += dpos;
        }
        for vel in &mut self.velocities[range] {
            *vel += dvel;
        }
    }

    /// Index of the first particle whose position or velocity is NaN or
    /// infinite, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.positions
            .iter()
            .zip(self.velocities.iter())
            .position(|(p, v)| !p.truncate().is_finite() || !v.truncate().is_finite())
    }

    /// Check every mass is positive and finite.
    pub fn validate_masses(&self) -> Result<(), SimulationError> {
        for (index, vel) in self.velocities.iter().enumerate() {
            let value = vel.w;
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimulationError::InvalidMass { index, value });
            }
        }
        Ok(())
    }
}

/// Current/next double buffer of particle state.
///
/// During a step the force and integration passes read `current()` and
/// write `next_mut()`; [`Generations::commit`] then swaps the two buffers
/// in O(1). The kernel never mutates the generation it is reading, which
/// is what makes the parallel force pass race-free.
#[derive(Debug, Clone)]
pub struct Generations {
    current: ParticleSet,
    next: ParticleSet,
}

impl Generations {
    /// Create a double buffer seeded with `set` as the current generation.
    pub fn new(set: ParticleSet) -> Self {
        let next = set.clone();
        Generations { current: set, next }
    }

    /// The read-only current generation.
    pub fn current(&self) -> &ParticleSet {
        &self.current
    }

    /// The write-only next generation.
    pub fn next_mut(&mut self) -> &mut ParticleSet {
        &mut self.next
    }

    /// Borrow the current generation immutably and the next mutably at once.
    pub fn split(&mut self) -> (&ParticleSet, &mut ParticleSet) {
        (&self.current, &mut self.next)
    }

    /// Make the next generation current. A buffer swap, never a copy.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Consume the buffer, returning the current generation.
    pub fn into_current(self) -> ParticleSet {
        self.current
    }
}
