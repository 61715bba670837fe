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
//! Error types for the N-body kernel
//!
//! Two enums cover the two failure domains: [`SnapshotError`] for
//! everything that can go wrong reading or writing binary particle dumps,
//! and [`SimulationError`] for load-time validation and per-step numeric
//! faults. Load-time errors are fatal before the first step; a step-time
//! fault leaves the current particle generation untouched.

use std::fmt;
use std::io;

/// Errors that can occur reading or writing binary snapshots.
#[derive(Debug)]
pub enum SnapshotError {
    /// Underlying file I/O failure.
    Io(io::Error),
    /// File byte length is not a whole number of 16-byte records.
    ///
    /// Partial records indicate a truncated or corrupt dump and are
    /// rejected rather than silently dropped.
    Truncated {
        /// Byte length of the offending input.
        len: u64,
    },
    /// File exceeds the maximum accepted snapshot size.
    TooLarge {
        /// Byte length of the offending input.
        len: u64,
        /// The enforced upper bound in bytes.
        max: u64,
    },
    /// Position and velocity files of a pair hold different record counts.
    LengthMismatch {
        /// Records in the position file.
        positions: usize,
        /// Records in the velocity file.
        velocities: usize,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "snapshot I/O failed: {}", e),
            SnapshotError::Truncated { len } => write!(
                f,
                "snapshot length {} bytes is not a multiple of the 16-byte record size",
                len
            ),
            SnapshotError::TooLarge { len, max } => {
                write!(f, "snapshot is {} bytes, exceeding the {} byte limit", len, max)
            }
            SnapshotError::LengthMismatch { positions, velocities } => write!(
                f,
                "position file holds {} records but velocity file holds {}",
                positions, velocities
            ),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

/// Errors that can occur constructing or stepping a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// A particle carried a zero, negative, or non-finite mass at load time.
    ///
    /// The acceleration computation divides by mass, so the whole set is
    /// rejected before any step runs.
    InvalidMass {
        /// Index of the offending particle.
        index: usize,
        /// The rejected mass value.
        value: f32,
    },
    /// A position or velocity component is NaN or infinite.
    ///
    /// At step time this is typically the result of a near-zero
    /// separation under unsoftened gravity, and the step that produced
    /// it is not committed. At load time the whole set is rejected.
    NonFiniteState {
        /// Index of the first degenerate particle.
        index: usize,
    },
    /// Loading initial state from snapshot files failed.
    Snapshot(SnapshotError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidMass { index, value } => {
                write!(f, "particle {} has invalid mass {} (must be positive and finite)", index, value)
            }
            SimulationError::NonFiniteState { index } => write!(
                f,
                "particle {} has a non-finite position or velocity; step not committed",
                index
            ),
            SimulationError::Snapshot(e) => write!(f, "snapshot error: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Snapshot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SnapshotError> for SimulationError {
    fn from(e: SnapshotError) -> Self {
        SimulationError::Snapshot(e)
    }
}

impl From<io::Error> for SimulationError {
    fn from(e: io::Error) -> Self {
        SimulationError::Snapshot(SnapshotError::Io(e))
    }
}
