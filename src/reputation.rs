// reputation.rs - Reputation Oracle Seam

//! The ring consumes peer reputation through a single query trait. The
//! reputation subsystem itself lives elsewhere; a fixed in-memory table is
//! provided for simulations and tests.

use std::collections::HashMap;

/// Neutral prior used when no oracle is wired up or a peer is unknown to it
pub const NEUTRAL_REPUTATION: f64 = 0.5;

/// Source of per-peer reputation values in `[0, 1]`, 0 being the worst and
/// 1 the best. `None` means the peer is unknown to the oracle.
pub trait ReputationOracle: Send + Sync {
    /// Reputation of the named peer, if one is known
    fn reputation(&self, name: &str) -> Option<f64>;
}

/// Fixed reputation table
#[derive(Debug, Default, Clone)]
pub struct StaticReputation {
    scores: HashMap<String, f64>,
}

impl StaticReputation {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reputation for a peer
    pub fn set(&mut self, name: impl Into<String>, score: f64) {
        self.scores.insert(name.into(), score);
    }
}

impl FromIterator<(String, f64)> for StaticReputation {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

impl ReputationOracle for StaticReputation {
    fn reputation(&self, name: &str) -> Option<f64> {
        self.scores.get(name).copied()
    }
}
