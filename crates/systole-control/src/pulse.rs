//! Pulse generation - the organism's temporal heartbeat
//!
//! Formula: `value = (t1 * ln(u)) / (1 - 1/(k*p))` with `u = e^k`, so
//! `ln(u)` is exactly `k`. Well-posed only when `k*p > 1`; the Arbiter
//! treats a violation as a fatal configuration error at startup, never as
//! a per-beat failure.

use systole_common::{Pulse, PULSE_FLOOR};

/// Pulse generator with fixed parameters
///
/// Pure: `next` has no side effects and depends only on the construction
/// parameters. The sequence counter is recorded in the pulse, not used in
/// the formula.
#[derive(Debug, Clone)]
pub struct PulseGenerator {
    k: u32,
    p: u32,
    t1: f64,
    u: f64,
}

impl PulseGenerator {
    /// Create a generator for `k` parallel flows across `p` nodes with
    /// base time unit `t1` seconds
    pub fn new(k: u32, p: u32, t1: f64) -> Self {
        Self {
            k,
            p,
            t1,
            u: f64::exp(k as f64),
        }
    }

    /// Whether the well-posedness condition `k*p > 1` holds
    pub fn is_well_posed(&self) -> bool {
        self.k as u64 * self.p as u64 > 1
    }

    /// Compute the pulse value in seconds, floored at [`PULSE_FLOOR`]
    pub fn value(&self) -> f64 {
        let kp = (self.k as f64) * (self.p as f64);
        let value = (self.t1 * self.u.ln()) / (1.0 - 1.0 / kp);
        value.max(PULSE_FLOOR)
    }

    /// Produce the pulse for the given beat sequence number
    ///
    /// When the generator is not well-posed the returned pulse carries
    /// `stable = false` and its `value` is not meaningful.
    pub fn next(&self, sequence: u64) -> Pulse {
        let stable = self.is_well_posed();
        Pulse {
            k: self.k,
            p: self.p,
            t1: self.t1,
            sequence,
            value: if stable { self.value() } else { PULSE_FLOOR },
            stable,
        }
    }
}
