//! Flow core output types
//!
//! Each of the four cores produces one [`FlowResult`] per beat. A core
//! that fails, panics, or times out still produces a result: a `Failed`
//! outcome that contributes zeros to aggregation and leaves an auditable
//! trace in the ledger.

use serde::{Deserialize, Serialize};

/// The closed set of flow cores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreName {
    Regen,
    Balance,
    Entropy,
    Optimize,
}

impl CoreName {
    /// All cores in their fixed dispatch/ledger order
    pub const ALL: [CoreName; 4] = [
        CoreName::Regen,
        CoreName::Balance,
        CoreName::Entropy,
        CoreName::Optimize,
    ];
}

impl std::fmt::Display for CoreName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreName::Regen => write!(f, "regen"),
            CoreName::Balance => write!(f, "balance"),
            CoreName::Entropy => write!(f, "entropy"),
            CoreName::Optimize => write!(f, "optimize"),
        }
    }
}

/// Per-core recommendation values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "core", content = "values", rename_all = "snake_case")]
pub enum Recommendation {
    /// Remediation pressure derived from the anomaly counter
    Regen {
        /// min(0.9, anomalies / 100)
        urgency: f64,
        /// Estimated remediation cost
        cost: f64,
    },
    /// Stability score plus the PID tuning triple
    ///
    /// Balance is the sole source of PID gains, decoupling tuning from the
    /// controller's mechanics.
    Balance {
        conserve: f64,
        kp: f64,
        ki: f64,
        kd: f64,
    },
    /// Threat assessment from the external inference collaborator
    Entropy {
        /// Clamped into [0, 1] regardless of what the collaborator returns
        threat_score: f64,
        explanation: String,
    },
    /// Projected benefit of leaning into the optimize weight
    Optimize { expected_gain: f64 },
}

/// Terminal state of one core's dispatch within a beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The core returned a recommendation
    Completed { recommendation: Recommendation },
    /// The core errored, panicked, or timed out; treated as zero-weight
    Failed { reason: String },
}

/// One core's contribution to a beat, as recorded in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    /// Which core produced this result
    pub core: CoreName,
    /// Recommendation or failure annotation
    pub outcome: FlowOutcome,
}

impl FlowResult {
    /// Wrap a successful recommendation
    pub fn completed(core: CoreName, recommendation: Recommendation) -> Self {
        Self {
            core,
            outcome: FlowOutcome::Completed { recommendation },
        }
    }

    /// Record a failure as a zero-weight placeholder
    pub fn failed(core: CoreName, reason: impl Into<String>) -> Self {
        Self {
            core,
            outcome: FlowOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    /// The recommendation, if the core completed
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match &self.outcome {
            FlowOutcome::Completed { recommendation } => Some(recommendation),
            FlowOutcome::Failed { .. } => None,
        }
    }
}
