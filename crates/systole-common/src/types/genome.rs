//! Genome - the shared weight/state vector steering the organism
//!
//! The genome is owned exclusively by the Arbiter. Every reader (flow
//! cores, status queries, mesh broadcast payloads) only ever sees a clone
//! taken at the top of a beat; the single write happens inside the
//! recalibration step. The mesh proposes mutations through the narrow
//! [`GenomeDelta`] injection path, applied by the Arbiter at a beat
//! boundary, never directly.

use serde::{Deserialize, Serialize};

use crate::WEIGHT_SUM_TOLERANCE;

/// Per-core influence weights
///
/// Invariant: all non-negative and summing to 1.0 within
/// [`WEIGHT_SUM_TOLERANCE`] after every beat's recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Influence of the regeneration core's urgency
    pub regen: f64,
    /// Influence of the balance core's stability score
    pub balance: f64,
    /// Influence of the entropy core's threat score
    pub entropy: f64,
    /// Influence of the optimize core's expected gain
    pub optimize: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            regen: 0.25,
            balance: 0.25,
            entropy: 0.15,
            optimize: 0.35,
        }
    }
}

impl Weights {
    /// Sum of all four weights
    pub fn sum(&self) -> f64 {
        self.regen + self.balance + self.entropy + self.optimize
    }

    /// Largest of the four weights
    pub fn max(&self) -> f64 {
        self.regen.max(self.balance).max(self.entropy).max(self.optimize)
    }

    /// Smallest of the four weights
    pub fn min(&self) -> f64 {
        self.regen.min(self.balance).min(self.entropy).min(self.optimize)
    }

    /// Rescale all weights so they sum to exactly 1.0
    ///
    /// A non-positive sum leaves the weights untouched; the Arbiter's
    /// clamps guarantee that never happens in a live genome.
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total > 0.0 {
            self.regen /= total;
            self.balance /= total;
            self.entropy /= total;
            self.optimize /= total;
        }
    }

    /// Whether the weight-sum invariant currently holds
    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }
}

/// Anomaly bookkeeping fed by feature ingestion and mesh injection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskState {
    /// Cumulative anomaly counter
    pub anomalies: u64,
}

/// Tunable inference scale for the entropy collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlState {
    /// Scale factor for threat inference, held in [0, 1]
    pub weight: f64,
}

impl Default for MlState {
    fn default() -> Self {
        Self { weight: 0.12 }
    }
}

/// The organism's shared state vector
///
/// Created once at Arbiter construction and mutated exactly once per beat;
/// a `clone()` is the immutable snapshot handed to concurrent readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Per-core influence weights
    pub weights: Weights,
    /// Anomaly counters
    pub risk: RiskState,
    /// Inference tuning
    pub ml: MlState,
}

impl Genome {
    /// Create a genome with the default weight distribution
    pub fn new() -> Self {
        Self::default()
    }
}

/// State delta propagated between peer instances over the mesh
///
/// This is the wire format itself, one JSON line per message. No
/// authentication or encryption is defined here; signing collaborators may
/// wrap or accompany the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeDelta {
    /// Originating node identity
    pub node_id: String,
    /// Anomalies observed by the sender since its last broadcast
    pub anomalies_delta: u64,
    /// Sender's current inference scale factor
    pub ml_weight: f64,
}
