//! The four parallel flow cores
//!
//! A closed set of independent recommenders (Regen, Balance, Entropy,
//! Optimize), each a pure function over the beat's genome snapshot and
//! features. None mutates shared state, so all four run concurrently
//! against the same snapshot. A core that errors or panics costs only its
//! own contribution for that beat; the Arbiter records the failure and
//! moves on.

pub mod balance;
pub mod entropy;
pub mod optimize;
pub mod regen;

use std::sync::Arc;

use async_trait::async_trait;

use systole_common::{CoreName, Features, Genome, Recommendation, Result};

pub use balance::BalanceCore;
pub use entropy::{EntropyCore, LogisticThreatModel, ThreatModel};
pub use optimize::OptimizeCore;
pub use regen::RegenCore;

/// The "evaluate and recommend" capability every core implements
#[async_trait]
pub trait FlowCore: Send + Sync {
    /// Which of the four cores this is
    fn name(&self) -> CoreName;

    /// Evaluate the snapshot and produce a recommendation
    ///
    /// `genome` is an immutable per-beat snapshot; implementations must
    /// not hold state across beats.
    async fn execute(&self, genome: &Genome, features: &Features) -> Result<Recommendation>;
}

/// The four cores in their fixed dispatch order
pub fn default_cores(model: Arc<dyn ThreatModel>) -> Vec<Arc<dyn FlowCore>> {
    vec![
        Arc::new(RegenCore),
        Arc::new(BalanceCore::default()),
        Arc::new(EntropyCore::new(model)),
        Arc::new(OptimizeCore),
    ]
}
