//! Regen core - remediation pressure from the anomaly counter

use async_trait::async_trait;

use systole_common::{CoreName, Features, Genome, Recommendation, Result};

use super::FlowCore;

/// Urgency saturates here; a flood of anomalies never claims full priority
const URGENCY_CEILING: f64 = 0.9;

/// Regeneration recommender
pub struct RegenCore;

#[async_trait]
impl FlowCore for RegenCore {
    fn name(&self) -> CoreName {
        CoreName::Regen
    }

    async fn execute(&self, genome: &Genome, _features: &Features) -> Result<Recommendation> {
        let urgency = (genome.risk.anomalies as f64 / 100.0).min(URGENCY_CEILING);
        Ok(Recommendation::Regen {
            urgency,
            cost: urgency / 2.0,
        })
    }
}
