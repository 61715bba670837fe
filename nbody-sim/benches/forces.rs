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
//! Force-pass and full-step benchmarks across particle counts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec3;
use nbody_sim::{DirectGravity, Particle, ParticleSet, Simulation, SimulationConfig};

fn cluster(n: usize) -> ParticleSet {
    let particles: Vec<Particle> = (0..n)
        .map(|i| {
            let f = i as f32;
            Particle::new(
                Vec3::new((f * 0.73).sin() * 1000.0, (f * 1.31).cos() * 1000.0, f),
                Vec3::ZERO,
                1.0e13 * (1.0 + f * 0.01),
            )
        })
        .collect();
    ParticleSet::from_particles(&particles).unwrap()
}

fn bench_force_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_pass");
    for &n in &[64usize, 256, 1024, 4096] {
        let set = cluster(n);
        let gravity = DirectGravity::default();
        let mut accels = vec![Vec3::ZERO; n];

        // O(N²) interaction count is the honest throughput unit here.
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", n), &set, |b, set| {
            b.iter(|| gravity.accelerations_sequential(set, &mut accels));
        });

        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", n), &set, |b, set| {
            b.iter(|| gravity.accelerations(set, &mut accels));
        });
    }
    group.finish();
}

fn bench_full_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_step");
    for &n in &[256usize, 1024] {
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(BenchmarkId::from_parameter(n), |b| {
            let mut sim = Simulation::new(cluster(n), SimulationConfig::default()).unwrap();
            b.iter(|| sim.step(0.01).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_force_pass, bench_full_step);
criterion_main!(benches);
