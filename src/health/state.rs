//! Health state lattice.
//!
//! # Order
//! ```text
//! Healthy < Degraded < Unhealthy
//! ```
//!
//! # Design Decisions
//! - The order lives in `rank()`, not in variant declaration order
//! - Reduction always keeps the worst state observed
//! - The reduction of zero states is `Healthy`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Health classification of a subsystem or of a whole report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Fully operational.
    #[default]
    Healthy,
    /// Serving, but with reduced capability (slow, saturated, fallback).
    Degraded,
    /// Not able to serve reliably.
    Unhealthy,
}

impl HealthState {
    /// Position in the lattice. Higher is worse.
    pub const fn rank(self) -> u8 {
        match self {
            HealthState::Healthy => 0,
            HealthState::Degraded => 1,
            HealthState::Unhealthy => 2,
        }
    }

    /// Wire name of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }

    /// The worse of two states.
    pub fn worst(self, other: HealthState) -> HealthState {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    /// Whether the endpoint reporting this state should still answer 200.
    pub fn is_serving(self) -> bool {
        self != HealthState::Unhealthy
    }
}

impl Ord for HealthState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for HealthState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce any number of states to the worst one; `Healthy` when empty.
pub fn reduce<I>(states: I) -> HealthState
where
    I: IntoIterator<Item = HealthState>,
{
    states
        .into_iter()
        .fold(HealthState::Healthy, HealthState::worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [HealthState; 3] = [
        HealthState::Healthy,
        HealthState::Degraded,
        HealthState::Unhealthy,
    ];

    #[test]
    fn test_total_order() {
        assert!(HealthState::Healthy < HealthState::Degraded);
        assert!(HealthState::Degraded < HealthState::Unhealthy);
        assert!(HealthState::Healthy < HealthState::Unhealthy);
        assert_eq!(HealthState::Degraded.worst(HealthState::Healthy), HealthState::Degraded);
        assert_eq!(HealthState::Healthy.worst(HealthState::Unhealthy), HealthState::Unhealthy);
    }

    #[test]
    fn test_reduce_empty_is_healthy() {
        assert_eq!(reduce(Vec::new()), HealthState::Healthy);
    }

    #[test]
    fn test_reduce_matches_max_for_all_short_sequences() {
        // Every sequence of length 0..=4 over the three states.
        for len in 0..=4u32 {
            for code in 0..3usize.pow(len) {
                let mut rest = code;
                let seq: Vec<HealthState> = (0..len)
                    .map(|_| {
                        let s = ALL[rest % 3];
                        rest /= 3;
                        s
                    })
                    .collect();

                let expected = seq.iter().copied().max().unwrap_or(HealthState::Healthy);
                assert_eq!(reduce(seq.clone()), expected, "sequence {:?}", seq);
            }
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&HealthState::Degraded).unwrap(), "\"degraded\"");
        assert_eq!(HealthState::Unhealthy.to_string(), "unhealthy");
        assert!(HealthState::Degraded.is_serving());
        assert!(!HealthState::Unhealthy.is_serving());
    }
}
