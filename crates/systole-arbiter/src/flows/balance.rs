//! Balance core - stability scoring and PID tuning
//!
//! Balance is the sole source of the PID gain triple. Tuning travels
//! through its recommendation each beat, keeping controller mechanics and
//! controller tuning decoupled.

use async_trait::async_trait;

use systole_common::{CoreName, Features, Genome, Recommendation, Result};

use super::FlowCore;

/// Balance recommender carrying the gain triple
pub struct BalanceCore {
    kp: f64,
    ki: f64,
    kd: f64,
}

impl BalanceCore {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

impl Default for BalanceCore {
    fn default() -> Self {
        Self::new(
            systole_common::PID_KP,
            systole_common::PID_KI,
            systole_common::PID_KD,
        )
    }
}

#[async_trait]
impl FlowCore for BalanceCore {
    fn name(&self) -> CoreName {
        CoreName::Balance
    }

    async fn execute(&self, genome: &Genome, _features: &Features) -> Result<Recommendation> {
        // Spread-based stability: an even weight distribution conserves
        let spread = genome.weights.max() - genome.weights.min();
        let conserve = (1.0 - spread).clamp(0.0, 1.0);

        Ok(Recommendation::Balance {
            conserve,
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
        })
    }
}
