//! Error types for the Systole organism core
//!
//! Provides a unified error type shared by every crate in the workspace.
//! The taxonomy distinguishes errors that must stop the beat loop
//! (configuration, chain integrity) from errors that are recovered inline
//! and only annotated in the ledger (core failures, mesh delivery).

use thiserror::Error;

/// Result type alias using OrganismError
pub type Result<T> = std::result::Result<T, OrganismError>;

/// Unified error type for Systole operations
#[derive(Debug, Error)]
pub enum OrganismError {
    /// Invalid fixed parameters; fatal at startup, the Arbiter refuses to run
    #[error("Configuration error: {0}")]
    Config(String),

    /// The hash chain failed verification; fatal and never repaired
    #[error("Chain integrity failure at entry {index}: {reason}")]
    ChainIntegrity { index: u64, reason: String },

    /// A flow core failed or panicked; recovered inline, annotated in the ledger
    #[error("Flow core {core} failed: {reason}")]
    CoreFailure { core: String, reason: String },

    /// Mesh delivery problems; best-effort, never propagated into the beat loop
    #[error("Mesh error: {0}")]
    Mesh(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for OrganismError {
    fn from(err: serde_json::Error) -> Self {
        OrganismError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for OrganismError {
    fn from(err: std::io::Error) -> Self {
        OrganismError::Mesh(err.to_string())
    }
}

impl From<anyhow::Error> for OrganismError {
    fn from(err: anyhow::Error) -> Self {
        OrganismError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrganismError::ChainIntegrity {
            index: 7,
            reason: "stored hash mismatch".to_string(),
        };
        assert!(err.to_string().contains("entry 7"));
    }

    #[test]
    fn test_core_failure_display() {
        let err = OrganismError::CoreFailure {
            core: "entropy".to_string(),
            reason: "inference collaborator unavailable".to_string(),
        };
        assert!(err.to_string().contains("entropy"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: OrganismError = parse_err.into();
        assert!(matches!(err, OrganismError::Serialization(_)));
    }
}
