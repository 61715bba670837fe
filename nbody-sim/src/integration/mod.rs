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
//! Explicit time integration
//!
//! Advances particle state by one step given precomputed accelerations:
//!
//! ```text
//! x(t + dt) = x(t) + v(t)*dt + 0.5*a(t)*dt²
//! v(t + dt) = v(t) + a(t)*dt
//! ```
//!
//! Position is second-order in `dt` (a Taylor expansion), velocity
//! first-order (semi-explicit Euler). One force evaluation per step; all
//! cross-particle coupling is already resolved in the acceleration field,
//! so each particle updates independently.
//!
//! Mass and the color scalar pass through to the next generation
//! unchanged.

use glam::Vec3;

use crate::particles::ParticleSet;

/// Integrate one step from `current` into `next`.
///
/// `accels[i]` must hold the net acceleration on particle `i` computed
/// from `current`. `next` is overwritten entirely; its prior contents do
/// not matter.
///
/// # Panics
///
/// Panics if `accels` or `next` disagree with `current` on particle count.
pub fn integrate(current: &ParticleSet, accels: &[Vec3], dt: f32, next: &mut ParticleSet) {
    assert_eq!(accels.len(), current.len(), "acceleration field must match particle count");
    assert_eq!(next.len(), current.len(), "next generation must match particle count");

    let half_dt_sq = 0.5 * dt * dt;
    let (next_pos, next_vel) = next.planes_mut();

    for i in 0..current.len() {
        let pos = current.positions()[i];
        let vel = current.velocities()[i];
        let a = accels[i];

        let new_pos = pos.truncate() + vel.truncate() * dt + a * half_dt_sq;
        let new_vel = vel.truncate() + a * dt;

        // w channels carry the color scalar and the mass through untouched.
        next_pos[i] = new_pos.extend(pos.w);
        next_vel[i] = new_vel.extend(vel.w);
    }
}
