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
//! Binary snapshot I/O
//!
//! Particle state persists as pairs of flat binary files: a position file
//! of `(x, y, z, color)` records and a velocity file of `(vx, vy, vz,
//! mass)` records, each record four little-endian `f32` values (16
//! bytes). The record layout is identical to the in-memory planes of
//! [`ParticleSet`], so encoding is a byte cast and decoding is a bounds
//! check plus an unaligned copy.
//!
//! There is no header, magic number, or count field: the particle count
//! is the file's byte length divided by the record size. A byte length
//! that is not a whole number of records is rejected as truncation, and
//! files above [`MAX_SNAPSHOT_BYTES`] are refused outright.

use std::fs;
use std::path::Path;

use glam::Vec4;

use crate::error::{SimulationError, SnapshotError};
use crate::particles::ParticleSet;

/// Bytes per particle record: four `f32` components.
pub const RECORD_SIZE: u64 = 16;

/// Upper bound on a single snapshot file (64 MiB, ~4.2M particles).
///
/// Direct summation is O(N²); a file larger than this describes a run
/// that could never step at a useful rate, so it is far more likely to
/// be a wrong file than a real input.
pub const MAX_SNAPSHOT_BYTES: u64 = 64 * 1024 * 1024;

/// Decode a raw byte buffer into a plane of records.
///
/// # Errors
///
/// Returns [`SnapshotError::Truncated`] if the length is not a whole
/// number of 16-byte records.
pub fn decode_plane(bytes: &[u8]) -> Result<Vec<Vec4>, SnapshotError> {
    if bytes.len() as u64 % RECORD_SIZE != 0 {
        return Err(SnapshotError::Truncated { len: bytes.len() as u64 });
    }
    // The buffer carries no alignment guarantee, so each record is read
    // with an unaligned copy rather than cast in place.
    Ok(bytes
        .chunks_exact(RECORD_SIZE as usize)
        .map(|chunk| Vec4::from_array(bytemuck::pod_read_unaligned::<[f32; 4]>(chunk)))
        .collect())
}

/// Encode a plane of records as raw bytes. Infallible: the in-memory
/// layout already is the file layout.
pub fn encode_plane(plane: &[Vec4]) -> &[u8] {
    bytemuck::cast_slice(plane)
}

/// Build a particle set from in-memory position and velocity buffers.
///
/// # Errors
///
/// Returns a [`SnapshotError`] for malformed buffers, or
/// [`SimulationError::InvalidMass`] if a decoded mass is not positive
/// and finite.
pub fn decode_pair(position_bytes: &[u8], velocity_bytes: &[u8]) -> Result<ParticleSet, SimulationError> {
    let positions = decode_plane(position_bytes)?;
    let velocities = decode_plane(velocity_bytes)?;
    if positions.len() != velocities.len() {
        return Err(SnapshotError::LengthMismatch {
            positions: positions.len(),
            velocities: velocities.len(),
        }
        .into());
    }
    ParticleSet::from_planes(positions, velocities)
}

fn check_size(len: u64) -> Result<(), SnapshotError> {
    if len > MAX_SNAPSHOT_BYTES {
        return Err(SnapshotError::TooLarge { len, max: MAX_SNAPSHOT_BYTES });
    }
    Ok(())
}

fn read_plane_file(path: &Path) -> Result<Vec<Vec4>, SnapshotError> {
    check_size(fs::metadata(path)?.len())?;
    let bytes = fs::read(path)?;
    // A file that shrank between the size check and the read still lands
    // here and fails the record-boundary check if torn.
    decode_plane(&bytes)
}

/// Load one position/velocity file pair into a particle set.
///
/// # Errors
///
/// Returns [`SimulationError::Snapshot`] for I/O failures, truncated or
/// oversized files, and record-count mismatches between the two files,
/// or [`SimulationError::InvalidMass`] if a stored mass is invalid.
pub fn load_pair<P: AsRef<Path>>(position_path: P, velocity_path: P) -> Result<ParticleSet, SimulationError> {
    let positions = read_plane_file(position_path.as_ref())?;
    let velocities = read_plane_file(velocity_path.as_ref())?;
    if positions.len() != velocities.len() {
        return Err(SnapshotError::LengthMismatch {
            positions: positions.len(),
            velocities: velocities.len(),
        }
        .into());
    }
    log::info!(
        "loaded {} particles from {}",
        positions.len(),
        position_path.as_ref().display()
    );
    ParticleSet::from_planes(positions, velocities)
}

/// Load several file pairs into one concatenated particle set.
///
/// Pairs append in argument order: the first pair's particles occupy
/// indices `[0, n₀)`, the second `[n₀, n₀+n₁)`, and so on. Each pair is
/// validated independently, so a mismatch names the offending pair's
/// counts rather than the totals.
///
/// # Errors
///
/// Same failure modes as [`load_pair`], from whichever pair fails first.
pub fn load_concat<P: AsRef<Path>>(pairs: &[(P, P)]) -> Result<ParticleSet, SimulationError> {
    let mut positions = Vec::new();
    let mut velocities = Vec::new();
    for (position_path, velocity_path) in pairs {
        let pos = read_plane_file(position_path.as_ref())?;
        let vel = read_plane_file(velocity_path.as_ref())?;
        if pos.len() != vel.len() {
            return Err(SnapshotError::LengthMismatch {
                positions: pos.len(),
                velocities: vel.len(),
            }
            .into());
        }
        positions.extend(pos);
        velocities.extend(vel);
    }
    log::info!("loaded {} particles from {} file pairs", positions.len(), pairs.len());
    ParticleSet::from_planes(positions, velocities)
}

/// Write a particle set as one position/velocity file pair.
///
/// Raw plane dumps: the files written here reload bit-exactly through
/// [`load_pair`].
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if either file cannot be written.
pub fn save<P: AsRef<Path>>(set: &ParticleSet, position_path: P, velocity_path: P) -> Result<(), SnapshotError> {
    fs::write(position_path.as_ref(), encode_plane(set.positions()))?;
    fs::write(velocity_path.as_ref(), encode_plane(set.velocities()))?;
    log::info!(
        "saved {} particles to {}",
        set.len(),
        position_path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::Particle;
    use glam::Vec3;

    fn sample_set() -> ParticleSet {
        ParticleSet::from_particles(&[
            Particle::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.1, 0.2, 0.3), 5.0).with_color(0.5),
            Particle::new(Vec3::new(-4.0, 0.0, 9.0), Vec3::new(-1.0, 0.5, 0.0), 7.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_in_memory_round_trip_bit_exact() {
        let set = sample_set();
        let pos_bytes = encode_plane(set.positions()).to_vec();
        let vel_bytes = encode_plane(set.velocities()).to_vec();
        let reloaded = decode_pair(&pos_bytes, &vel_bytes).unwrap();
        assert_eq!(reloaded, set);
    }

    #[test]
    fn test_decode_handles_unaligned_input() {
        // Offset the buffer by one byte so records cross alignment
        // boundaries; decode must still work on the shifted view.
        let set = sample_set();
        let mut padded = vec![0u8];
        padded.extend_from_slice(encode_plane(set.positions()));
        let decoded = decode_plane(&padded[1..]).unwrap();
        assert_eq!(decoded, set.positions());
    }

    #[test]
    fn test_partial_record_rejected() {
        let err = decode_plane(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, SnapshotError::Truncated { len: 17 }));
    }

    #[test]
    fn test_oversized_snapshot_rejected() {
        let err = check_size(MAX_SNAPSHOT_BYTES + 1).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::TooLarge { len, max }
                if len == MAX_SNAPSHOT_BYTES + 1 && max == MAX_SNAPSHOT_BYTES
        ));
    }

    #[test]
    fn test_size_at_limit_accepted() {
        assert!(check_size(MAX_SNAPSHOT_BYTES).is_ok());
        assert!(check_size(0).is_ok());
    }

    #[test]
    fn test_empty_buffer_is_empty_plane() {
        assert!(decode_plane(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_record_count_mismatch_rejected() {
        let set = sample_set();
        let pos_bytes = encode_plane(set.positions()).to_vec();
        let vel_bytes = encode_plane(&set.velocities()[..1]).to_vec();
        let err = decode_pair(&pos_bytes, &vel_bytes).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Snapshot(SnapshotError::LengthMismatch { positions: 2, velocities: 1 })
        ));
    }

    #[test]
    fn test_invalid_stored_mass_surfaces() {
        // Velocity records with a zero w (mass) decode fine but fail set
        // validation.
        let pos_bytes = [0u8; 16];
        let vel_bytes = [0u8; 16];
        let err = decode_pair(&pos_bytes, &vel_bytes).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidMass { index: 0, .. }));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let pos_path = dir.join("nbody_sim_test_positions.bin");
        let vel_path = dir.join("nbody_sim_test_velocities.bin");

        let set = sample_set();
        save(&set, &pos_path, &vel_path).unwrap();
        let reloaded = load_pair(&pos_path, &vel_path).unwrap();
        assert_eq!(reloaded, set);

        let _ = fs::remove_file(&pos_path);
        let _ = fs::remove_file(&vel_path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_pair("/nonexistent/positions.bin", "/nonexistent/velocities.bin").unwrap_err();
        assert!(matches!(err, SimulationError::Snapshot(SnapshotError::Io(_))));
    }

    #[test]
    fn test_load_concat_appends_in_order() {
        let dir = std::env::temp_dir();
        let paths = [
            dir.join("nbody_sim_concat_p0.bin"),
            dir.join("nbody_sim_concat_v0.bin"),
            dir.join("nbody_sim_concat_p1.bin"),
            dir.join("nbody_sim_concat_v1.bin"),
        ];

        let first = ParticleSet::from_particles(&[Particle::new(Vec3::X, Vec3::ZERO, 1.0)]).unwrap();
        let second = ParticleSet::from_particles(&[
            Particle::new(Vec3::Y, Vec3::ZERO, 2.0),
            Particle::new(Vec3::Z, Vec3::ZERO, 3.0),
        ])
        .unwrap();
        save(&first, &paths[0], &paths[1]).unwrap();
        save(&second, &paths[2], &paths[3]).unwrap();

        let combined =
            load_concat(&[(&paths[0], &paths[1]), (&paths[2], &paths[3])]).unwrap();
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.position(0), Vec3::X);
        assert_eq!(combined.position(1), Vec3::Y);
        assert_eq!(combined.mass(2), 3.0);

        for p in &paths {
            let _ = fs::remove_file(p);
        }
    }
}
