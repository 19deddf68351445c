//! Typed ledger payloads
//!
//! Every artifact a beat produces lands in the chain as one of these
//! variants, tagged for external readers that consume the raw JSON.

use serde::{Deserialize, Serialize};

use systole_common::{ActionRecord, FlowResult, Pulse};

/// Message recorded in the genesis entry
pub const GENESIS_MESSAGE: &str = "systole organism initialization";

/// Payload of a single ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LedgerPayload {
    /// First entry of every chain
    Genesis { message: String, version: String },
    /// The beat's pulse record
    Pulse { pulse: Pulse },
    /// One core's recommendation (or failure annotation)
    Flow { result: FlowResult },
    /// The beat's selected action with its triggering values
    Action { record: ActionRecord },
}

impl LedgerPayload {
    /// The genesis payload for a new chain
    pub fn genesis() -> Self {
        LedgerPayload::Genesis {
            message: GENESIS_MESSAGE.to_string(),
            version: systole_common::VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_payload_shape() {
        let json = serde_json::to_value(LedgerPayload::genesis()).unwrap();
        assert_eq!(json["type"], "genesis");
        assert_eq!(json["data"]["message"], GENESIS_MESSAGE);
    }

    #[test]
    fn test_pulse_payload_round_trip() {
        let payload = LedgerPayload::Pulse {
            pulse: Pulse {
                k: 4,
                p: 5,
                t1: 0.001,
                sequence: 1,
                value: 0.004211,
                stable: true,
            },
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: LedgerPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
