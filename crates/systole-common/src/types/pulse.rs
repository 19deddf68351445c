//! Pulse - the computed inter-beat delay record

use serde::{Deserialize, Serialize};

/// One pulse of the organism's temporal heartbeat
///
/// Produced once per beat by the pulse generator and recorded verbatim in
/// the ledger. `value` is the delay in seconds the beat loop sleeps before
/// the next iteration, floored at the numerical stability bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    /// Parallel flow count
    pub k: u32,
    /// Node count
    pub p: u32,
    /// Base time unit in seconds
    pub t1: f64,
    /// Monotonic beat counter at generation time
    pub sequence: u64,
    /// Computed delay in seconds, >= 1e-6
    pub value: f64,
    /// Whether the well-posedness condition k*p > 1 holds
    pub stable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_serialization_round_trip() {
        let pulse = Pulse {
            k: 4,
            p: 5,
            t1: 0.001,
            sequence: 12,
            value: 0.004211,
            stable: true,
        };
        let json = serde_json::to_string(&pulse).unwrap();
        let back: Pulse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pulse);
    }
}
