//! Actions - the per-beat decision outcome

use serde::{Deserialize, Serialize};

use super::decision::DecisionVector;

/// The action selected at the end of a beat's decision step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Threat at or above the quarantine threshold
    Quarantine,
    /// Threat at or above the alert threshold
    Alert,
    /// Stability high and repair pressure low
    ApplyBalance,
    /// Optimization gain worth taking
    ApplyOptimize,
    /// Nothing to do this beat
    Noop,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Quarantine => write!(f, "QUARANTINE"),
            Action::Alert => write!(f, "ALERT"),
            Action::ApplyBalance => write!(f, "APPLY_BALANCE"),
            Action::ApplyOptimize => write!(f, "APPLY_OPTIMIZE"),
            Action::Noop => write!(f, "NOOP"),
        }
    }
}

/// Ledger record tying an action to the decision vector that triggered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The selected action
    pub action: Action,
    /// The aggregate values the thresholds were evaluated against
    pub decision: DecisionVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_display_matches_wire_names() {
        assert_eq!(Action::ApplyBalance.to_string(), "APPLY_BALANCE");
        let json = serde_json::to_string(&Action::Quarantine).unwrap();
        assert_eq!(json, "\"QUARANTINE\"");
    }
}
