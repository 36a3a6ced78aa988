//! Batch descriptor: the wire-facing parameters of one submitted batch.

use serde::{Deserialize, Serialize};

use crate::core::error::SchedulerError;

/// Parameters describing how many tasks to synthesize and with what
/// distribution.
///
/// Construction normalizes rather than rejects: reversed duration bounds are
/// swapped and an interruption chance above 100 % is clamped. Deserialization
/// routes through the same constructor, so wire-supplied descriptors satisfy
/// the same invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDescriptor")]
pub struct BatchDescriptor {
    count: u32,
    interruption_chance: u32,
    min_duration_ms: u64,
    max_duration_ms: u64,
}

/// Wire shape prior to normalization.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    count: u32,
    interruption_chance: u32,
    min_duration_ms: u64,
    max_duration_ms: u64,
}

impl From<RawDescriptor> for BatchDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        Self::new(
            raw.count,
            raw.interruption_chance,
            raw.min_duration_ms,
            raw.max_duration_ms,
        )
    }
}

impl BatchDescriptor {
    /// Create a descriptor, normalizing reversed duration bounds by swapping
    /// and clamping the interruption chance to 100 %.
    #[must_use]
    pub fn new(count: u32, interruption_chance: u32, min_duration_ms: u64, max_duration_ms: u64) -> Self {
        let (min_duration_ms, max_duration_ms) = if min_duration_ms > max_duration_ms {
            (max_duration_ms, min_duration_ms)
        } else {
            (min_duration_ms, max_duration_ms)
        };
        Self {
            count,
            interruption_chance: interruption_chance.min(100),
            min_duration_ms,
            max_duration_ms,
        }
    }

    /// Number of tasks to synthesize.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Per-task interruption probability as a percentage in `0..=100`.
    #[must_use]
    pub fn interruption_chance(&self) -> u32 {
        self.interruption_chance
    }

    /// Minimum task duration in milliseconds.
    #[must_use]
    pub fn min_duration_ms(&self) -> u64 {
        self.min_duration_ms
    }

    /// Maximum task duration in milliseconds.
    #[must_use]
    pub fn max_duration_ms(&self) -> u64 {
        self.max_duration_ms
    }

    /// Parse a descriptor from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::BadDescriptor`] when the payload is not a
    /// well-formed descriptor record.
    pub fn from_json_str(input: &str) -> Result<Self, SchedulerError> {
        serde_json::from_str(input).map_err(|e| SchedulerError::BadDescriptor(e.to_string()))
    }
}
