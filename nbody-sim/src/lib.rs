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
//! # N-Body Simulation Kernel
//!
//! A direct-summation (O(N²)) gravitational N-body kernel with explicit
//! numerical integration and double-buffered particle state.
//!
//! ## Features
//!
//! - **Direct Gravity**: Brute-force pairwise Newtonian force evaluation
//! - **Explicit Integration**: Second-order position / first-order velocity update
//! - **Double Buffering**: Current/next generation swap, race-free by construction
//! - **Parallelization**: Optional Rayon integration for multi-threaded force evaluation
//! - **Snapshot I/O**: Flat binary particle dumps compatible with the renderer's
//!   vertex format
//!
//! ## Example
//!
//! ```rust
//! use nbody_sim::{Particle, ParticleSet, Simulation, SimulationConfig};
//! use glam::Vec3;
//!
//! let particles = vec![
//!     Particle::new(Vec3::ZERO, Vec3::ZERO, 1.0e15),
//!     Particle::new(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 1.0e15),
//! ];
//! let set = ParticleSet::from_particles(&particles).unwrap();
//! let mut sim = Simulation::new(set, SimulationConfig::default()).unwrap();
//! sim.step(0.5).unwrap();
//! ```

#![warn(missing_docs)]

/// Error types for simulation and snapshot I/O failures
pub mod error;

/// Gravitational force evaluation
pub mod forces;

/// Explicit time integration
pub mod integration;

/// Particle state storage and double buffering
pub mod particles;

/// Simulation loop orchestration
pub mod simulation;

/// Binary snapshot load/save
pub mod snapshot;

pub use error::{SimulationError, SnapshotError};
pub use forces::{DirectGravity, GRAVITATIONAL_CONSTANT};
pub use particles::{Generations, Particle, ParticleSet};
pub use simulation::{Simulation, SimulationConfig, StepClock, MAX_TIMESTEP, TIMESTEP_FACTOR};
