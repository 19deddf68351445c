//! Decision vector - weighted aggregate of flow recommendations
//!
//! Derived each beat from the four flow results and the genome weights at
//! beat start. Never stored standalone; it rides inside the action record
//! appended to the ledger.

use serde::{Deserialize, Serialize};

use super::flow::{FlowResult, Recommendation};
use super::genome::Weights;

/// Weighted aggregate of the four core recommendations
///
/// The `raw_*` fields keep the unweighted core outputs alongside the
/// weighted terms so the action record is self-explanatory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionVector {
    /// threat_score x entropy weight
    pub threat: f64,
    /// conserve x balance weight
    pub stability: f64,
    /// urgency x regen weight
    pub repair: f64,
    /// expected_gain x optimize weight
    pub gain: f64,
    /// Unweighted threat score
    pub raw_threat: f64,
    /// Unweighted urgency
    pub raw_urgency: f64,
    /// Unweighted conserve score
    pub raw_conserve: f64,
    /// Unweighted expected gain
    pub raw_gain: f64,
}

impl DecisionVector {
    /// Aggregate flow results using the weights from the beat's snapshot
    ///
    /// Failed cores contribute zeros; missing fields stay at their
    /// defaults, so a partial beat still yields a usable vector.
    pub fn aggregate(results: &[FlowResult], weights: &Weights) -> Self {
        let mut vector = DecisionVector::default();

        for result in results {
            match result.recommendation() {
                Some(Recommendation::Regen { urgency, .. }) => {
                    vector.raw_urgency = *urgency;
                    vector.repair = urgency * weights.regen;
                }
                Some(Recommendation::Balance { conserve, .. }) => {
                    vector.raw_conserve = *conserve;
                    vector.stability = conserve * weights.balance;
                }
                Some(Recommendation::Entropy { threat_score, .. }) => {
                    vector.raw_threat = *threat_score;
                    vector.threat = threat_score * weights.entropy;
                }
                Some(Recommendation::Optimize { expected_gain }) => {
                    vector.raw_gain = *expected_gain;
                    vector.gain = expected_gain * weights.optimize;
                }
                None => {}
            }
        }

        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::flow::{CoreName, FlowResult};

    fn sample_results() -> Vec<FlowResult> {
        vec![
            FlowResult::completed(
                CoreName::Regen,
                Recommendation::Regen {
                    urgency: 0.4,
                    cost: 0.2,
                },
            ),
            FlowResult::completed(
                CoreName::Balance,
                Recommendation::Balance {
                    conserve: 0.8,
                    kp: 0.6,
                    ki: 0.1,
                    kd: 0.05,
                },
            ),
            FlowResult::completed(
                CoreName::Entropy,
                Recommendation::Entropy {
                    threat_score: 0.5,
                    explanation: String::new(),
                },
            ),
            FlowResult::completed(CoreName::Optimize, Recommendation::Optimize { expected_gain: 0.042 }),
        ]
    }

    #[test]
    fn test_aggregate_weights_each_field() {
        let weights = Weights::default();
        let vector = DecisionVector::aggregate(&sample_results(), &weights);

        assert!((vector.repair - 0.4 * 0.25).abs() < 1e-12);
        assert!((vector.stability - 0.8 * 0.25).abs() < 1e-12);
        assert!((vector.threat - 0.5 * 0.15).abs() < 1e-12);
        assert!((vector.gain - 0.042 * 0.35).abs() < 1e-12);
        assert_eq!(vector.raw_threat, 0.5);
    }

    #[test]
    fn test_aggregate_with_failed_core_contributes_zero() {
        let weights = Weights::default();
        let mut results = sample_results();
        results[2] = FlowResult::failed(CoreName::Entropy, "timed out");

        let vector = DecisionVector::aggregate(&results, &weights);
        assert_eq!(vector.threat, 0.0);
        assert_eq!(vector.raw_threat, 0.0);
        assert!(vector.stability > 0.0);
    }
}
