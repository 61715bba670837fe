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
//! Single-particle value type
//!
//! [`Particle`] is the per-index view of a [`crate::ParticleSet`]: a
//! position, a velocity, a positive mass, and a color scalar carried for
//! the renderer. Single precision throughout, matching the renderer's
//! vertex format.

use glam::Vec3;

/// One point mass of the simulation.
///
/// # Examples
///
/// ```
/// use nbody_sim::Particle;
/// use glam::Vec3;
///
/// let p = Particle::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 5.0e14);
/// assert!(p.is_valid());
/// assert_eq!(p.color, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Position in simulation units.
    pub position: Vec3,
    /// Velocity in simulation units per time unit.
    pub velocity: Vec3,
    /// Mass. Must be positive and finite; the force kernel divides by it.
    pub mass: f32,
    /// Visualization scalar in [0, 1]. Never read by the physics kernel.
    pub color: f32,
}

impl Particle {
    /// Create a particle with a zero color scalar.
    ///
    /// # Panics
    ///
    /// Panics if the mass is not positive and finite. For fallible
    /// construction, use [`Particle::try_new`].
    pub fn new(position: Vec3, velocity: Vec3, mass: f32) -> Self {
        assert!(mass > 0.0 && mass.is_finite(), "Mass must be positive and finite");
        Particle { position, velocity, mass, color: 0.0 }
    }

    /// Try to create a particle with a zero color scalar.
    ///
    /// Returns `None` if the mass is zero, negative, or non-finite.
    pub fn try_new(position: Vec3, velocity: Vec3, mass: f32) -> Option<Self> {
        if mass > 0.0 && mass.is_finite() {
            Some(Particle { position, velocity, mass, color: 0.0 })
        } else {
            None
        }
    }

    /// Set the color scalar, clamped to [0, 1].
    pub fn with_color(mut self, color: f32) -> Self {
        self.color = color.clamp(0.0, 1.0);
        self
    }

    /// Check that position and velocity are finite and the mass is positive.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.mass > 0.0 && self.mass.is_finite()
    }
}
