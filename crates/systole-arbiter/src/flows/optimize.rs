//! Optimize core - projected gain from the optimize weight

use async_trait::async_trait;

use systole_common::{CoreName, Features, Genome, Recommendation, Result};

use super::FlowCore;

/// Gain per unit of optimize weight
const GAIN_RATE: f64 = 0.12;

/// Ceiling on the projected gain
const GAIN_CEILING: f64 = 0.5;

/// Optimization recommender
pub struct OptimizeCore;

#[async_trait]
impl FlowCore for OptimizeCore {
    fn name(&self) -> CoreName {
        CoreName::Optimize
    }

    async fn execute(&self, genome: &Genome, _features: &Features) -> Result<Recommendation> {
        let expected_gain = (genome.weights.optimize * GAIN_RATE).min(GAIN_CEILING);
        Ok(Recommendation::Optimize { expected_gain })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(optimize_weight: f64) -> f64 {
        let mut genome = Genome::new();
        genome.weights.optimize = optimize_weight;
        match OptimizeCore
            .execute(&genome, &Features::default())
            .await
            .unwrap()
        {
            Recommendation::Optimize { expected_gain } => expected_gain,
            other => panic!("unexpected recommendation {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gain_scales_with_weight() {
        let gain = run(0.35).await;
        assert!((gain - 0.042).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_gain_ceiling() {
        // Weight far outside the live clamp range still caps out
        let gain = run(50.0).await;
        assert_eq!(gain, GAIN_CEILING);
    }
}
