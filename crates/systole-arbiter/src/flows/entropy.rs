//! Entropy core - threat inference through an external collaborator
//!
//! The inference model itself is not part of the core; anything
//! implementing [`ThreatModel`] can be plugged in. The shipped
//! [`LogisticThreatModel`] maps the anomaly counter through a sigmoid
//! scaled by the genome's ml weight. Whatever the collaborator returns,
//! the score recorded in the recommendation is clamped into [0, 1]; a
//! non-finite result is treated as a core failure.

use std::sync::Arc;

use async_trait::async_trait;

use systole_common::{CoreName, Features, Genome, OrganismError, Recommendation, Result};

use super::FlowCore;

/// External threat-inference collaborator
pub trait ThreatModel: Send + Sync {
    /// Score the current anomaly level; expected in [0, 1] but not trusted
    fn infer(&self, ml_weight: f64, anomalies: u64) -> f64;
}

/// Default collaborator: `sigmoid(ml_weight * anomalies)`
///
/// Five anomalies at ml weight 0.12 score 0.6457.
pub struct LogisticThreatModel;

impl ThreatModel for LogisticThreatModel {
    fn infer(&self, ml_weight: f64, anomalies: u64) -> f64 {
        let x = ml_weight * anomalies as f64;
        1.0 / (1.0 + (-x).exp())
    }
}

/// Entropy recommender
pub struct EntropyCore {
    model: Arc<dyn ThreatModel>,
}

impl EntropyCore {
    pub fn new(model: Arc<dyn ThreatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl FlowCore for EntropyCore {
    fn name(&self) -> CoreName {
        CoreName::Entropy
    }

    async fn execute(&self, genome: &Genome, _features: &Features) -> Result<Recommendation> {
        let anomalies = genome.risk.anomalies;
        let raw = self.model.infer(genome.ml.weight, anomalies);

        if !raw.is_finite() {
            return Err(OrganismError::CoreFailure {
                core: CoreName::Entropy.to_string(),
                reason: format!("inference returned non-finite score {raw}"),
            });
        }

        let threat_score = raw.clamp(0.0, 1.0);
        Ok(Recommendation::Entropy {
            threat_score,
            explanation: format!(
                "{} anomalies at ml weight {:.3} scored {:.4}",
                anomalies, genome.ml.weight, threat_score
            ),
        })
    }
}
