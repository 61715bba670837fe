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
//! Two galaxy clusters on a collision course.
//!
//! Stages two synthetic clusters, offsets the second and aims it at the
//! first, shades particles by mass, then runs the simulation with
//! wall-clock-derived time steps and dumps the final state as a snapshot
//! pair (`positions.bin` / `velocities.bin`).
//!
//! Run with: `RUST_LOG=info cargo run --release --example collision`

use glam::Vec3;
use nbody_sim::{snapshot, Particle, ParticleSet, Simulation, SimulationConfig, StepClock};

const CLUSTER_SIZE: usize = 512;
const STEPS: u64 = 1000;

/// A rough ball of particles: deterministic pseudo-random placement on
/// nested shells, heavier toward the center.
fn make_cluster(seed: f32) -> Vec<Particle> {
    (0..CLUSTER_SIZE)
        .map(|i| {
            let f = i as f32 + seed;
            let radius = 50.0 + (f * 0.619).fract() * 400.0;
            let theta = (f * 2.399).fract() * std::f32::consts::TAU;
            let phi = ((f * 0.781).fract() * 2.0 - 1.0).acos();
            let position = Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            );
            let mass = 1.0e14 * (1.0 + 400.0 / radius);
            Particle::new(position, Vec3::ZERO, mass)
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut particles = make_cluster(0.0);
    particles.extend(make_cluster(7919.0));
    let mut set = ParticleSet::from_particles(&particles)?;

    // Second cluster: shifted aside and thrown at the first.
    set.displace(
        CLUSTER_SIZE..2 * CLUSTER_SIZE,
        Vec3::new(1000.0, 0.0, 0.0),
        Vec3::new(-475.0, -50.0, 0.0),
    );
    set.shade_by_mass(1.0e14, 1.0e15);

    let mut sim = Simulation::new(set, SimulationConfig::default())?;
    let mut clock = StepClock::new();

    while sim.steps() < STEPS {
        let dt = clock.tick();
        match sim.step(dt) {
            Ok(applied) => {
                if sim.steps() % 100 == 0 {
                    log::info!("step {} (dt = {:.6}, t = {:.3})", sim.steps(), applied, sim.time());
                }
            }
            Err(e) => {
                log::error!("simulation halted: {}", e);
                break;
            }
        }
    }

    snapshot::save(sim.particles(), "positions.bin", "velocities.bin")?;
    println!(
        "ran {} steps over {:.3} simulated seconds; snapshot written",
        sim.steps(),
        sim.time()
    );
    Ok(())
}
