//! # Systole Arbiter
//!
//! The decisional brain of the organism. Each beat, the Arbiter:
//!
//! 1. applies pending mesh deltas and ingests external features
//! 2. obtains a pulse and records it in the ledger
//! 3. dispatches the four flow cores in parallel against an immutable
//!    genome snapshot, recording every result (including failures)
//! 4. aggregates the recommendations into a decision vector and selects
//!    an action by fixed thresholds
//! 5. recalibrates the genome weights through the genomic PID
//! 6. audits the ledger chain, optionally broadcasts the beat's delta
//!    over the mesh, and sleeps for the pulse duration
//!
//! Fatal conditions (bad fixed parameters, a chain that fails
//! verification) stop the loop with the ledger in its last-verified
//! state; per-core failures are absorbed into the beat and annotated in
//! the ledger instead.

pub mod arbiter;
pub mod config;
pub mod flows;
pub mod source;

pub use arbiter::{Arbiter, ArbiterState, SystemStatus};
pub use config::{ActionThresholds, MeshSettings, OrganismConfig, WeightBounds};
pub use flows::{
    default_cores, BalanceCore, EntropyCore, FlowCore, LogisticThreatModel, OptimizeCore,
    RegenCore, ThreatModel,
};
pub use source::{FeatureSource, NullFeatureSource, StaticFeatureSource};
