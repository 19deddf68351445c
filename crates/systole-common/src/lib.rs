//! # Systole Common
//!
//! Shared types, errors, and hashing primitives for the Systole organism core.
//!
//! ## Core Types
//!
//! - [`Genome`]: the shared weight/state vector steering every beat
//! - [`Pulse`]: the computed inter-beat delay record
//! - [`FlowResult`]/[`Recommendation`]: per-core recommendation output
//! - [`Action`]/[`ActionRecord`]: the per-beat decision and its evidence
//! - [`DecisionVector`]: weighted aggregate of flow recommendations
//! - [`Features`]: externally sourced per-beat input record
//!
//! ## Crypto
//!
//! - [`crypto::canonical`]: deterministic JSON serialization for hashing
//! - [`crypto::merkle`]: binary Merkle tree over ledger entry hashes

pub mod crypto;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{OrganismError, Result};
pub use types::{
    action::{Action, ActionRecord},
    decision::DecisionVector,
    features::Features,
    flow::{CoreName, FlowOutcome, FlowResult, Recommendation},
    genome::{Genome, GenomeDelta, MlState, RiskState, Weights},
    pulse::Pulse,
};

/// Systole version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Threat score at or above which the beat quarantines
pub const THREAT_QUARANTINE: f64 = 0.85;

/// Threat score at or above which the beat alerts
pub const THREAT_ALERT: f64 = 0.60;

/// Weighted stability above which a balance action applies
pub const STABILITY_THRESHOLD: f64 = 0.25;

/// Weighted repair score below which a balance action applies
pub const REPAIR_THRESHOLD: f64 = 0.10;

/// Weighted optimization gain above which an optimize action applies
pub const OPT_GAIN_THRESHOLD: f64 = 0.10;

/// Pulse target fed to the PID error term (seconds)
pub const STABILITY_TARGET: f64 = 0.02;

/// Numerical floor for the computed pulse value (seconds)
pub const PULSE_FLOOR: f64 = 1e-6;

/// Error magnitude below which the PID integral resets
pub const EPSILON_RESET: f64 = 1e-4;

/// Maximum weight adjustment applied in a single beat
pub const MAX_WEIGHT_DELTA: f64 = 0.05;

/// Anti-windup bound on the PID integral term (symmetric)
pub const INTEGRAL_CLAMP: f64 = 1.0;

/// Default PID gains, sourced from the Balance core each beat
pub const PID_KP: f64 = 0.6;
pub const PID_KI: f64 = 0.1;
pub const PID_KD: f64 = 0.05;

/// Bounds for the optimize weight after PID adjustment
pub const OPTIMIZE_WEIGHT_MIN: f64 = 0.1;
pub const OPTIMIZE_WEIGHT_MAX: f64 = 0.9;

/// Bounds for the entropy weight after feedback recomputation
pub const ENTROPY_WEIGHT_MIN: f64 = 0.05;
pub const ENTROPY_WEIGHT_MAX: f64 = 0.30;

/// Tolerance on the weight-sum invariant after renormalization
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Outbound mesh queue depth above which the fast dispatch delay applies
pub const MESH_QUEUE_THRESHOLD: usize = 100;

/// Mesh dispatch delay when the queue backlog is high (microseconds)
pub const MESH_DELAY_HIGH_QUEUE_US: u64 = 300;

/// Mesh dispatch delay otherwise (microseconds)
pub const MESH_DELAY_LOW_QUEUE_US: u64 = 1_000;
