//! Genomic PID controller
//!
//! Turns the per-beat pulse value into a bounded adjustment of the
//! optimize weight. Three safety rails keep a misbehaving input from
//! destabilizing the genome:
//!
//! - anti-windup: the integral is clamped to [-1.0, 1.0] after every
//!   accumulation, before it enters the output formula
//! - epsilon-reset: the integral zeroes once the error is negligibly
//!   small, preventing long-run drift at the target
//! - output clamp: the applied weight delta never leaves
//!   [-MAX_WEIGHT_DELTA, +MAX_WEIGHT_DELTA] in a single beat
//!
//! Gains are not owned here: the Balance core supplies the tuning triple
//! each beat via [`GenomicPID::update_gains`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use systole_common::{EPSILON_RESET, INTEGRAL_CLAMP, MAX_WEIGHT_DELTA, STABILITY_TARGET};

/// Number of recent samples retained for status reporting
const HISTORY_CAPACITY: usize = 64;

/// One controller step, recorded for auditing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidSample {
    /// pulse_value - stability target
    pub error: f64,
    /// Proportional term
    pub p_term: f64,
    /// Integral term (post anti-windup)
    pub i_term: f64,
    /// Derivative term
    pub d_term: f64,
    /// Unbounded controller output
    pub raw_output: f64,
    /// Negated output clamped to the per-beat bound; this is what the
    /// Arbiter applies to the optimize weight
    pub weight_delta: f64,
    /// Lyapunov-style energy proxy: change in error since the last step
    pub delta_v: f64,
    /// Whether this step converged toward the target (delta_v < 0)
    pub stable: bool,
    /// Integral state after this step
    pub integral: f64,
}

/// PID controller over the pulse value
#[derive(Debug, Clone)]
pub struct GenomicPID {
    kp: f64,
    ki: f64,
    kd: f64,
    target: f64,
    integral: f64,
    previous_error: f64,
    primed: bool,
    last_sample: Option<PidSample>,
    history: VecDeque<PidSample>,
}

impl GenomicPID {
    /// Create a controller targeting the given pulse value
    pub fn new(kp: f64, ki: f64, kd: f64, target: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            target,
            integral: 0.0,
            previous_error: 0.0,
            primed: false,
            last_sample: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Controller with the default gain triple and stability target
    pub fn with_defaults() -> Self {
        Self::new(
            systole_common::PID_KP,
            systole_common::PID_KI,
            systole_common::PID_KD,
            STABILITY_TARGET,
        )
    }

    /// Replace the gain triple (sourced from the Balance core each beat)
    pub fn update_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
    }

    /// The stability target the error is measured against
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Run one controller step against the current pulse value
    pub fn compute(&mut self, pulse_value: f64) -> PidSample {
        let error = pulse_value - self.target;

        if error.abs() < EPSILON_RESET {
            self.integral = 0.0;
        } else {
            self.integral = (self.integral + error).clamp(-INTEGRAL_CLAMP, INTEGRAL_CLAMP);
        }

        let p_term = self.kp * error;
        let i_term = self.ki * self.integral;
        let derivative = if self.primed {
            error - self.previous_error
        } else {
            0.0
        };
        let d_term = self.kd * derivative;

        let raw_output = p_term + i_term + d_term;
        // Negative feedback: a pulse above target pushes the weight down
        let weight_delta = (-raw_output).clamp(-MAX_WEIGHT_DELTA, MAX_WEIGHT_DELTA);

        let delta_v = error - self.previous_error;
        let stable = delta_v < 0.0;

        let sample = PidSample {
            error,
            p_term,
            i_term,
            d_term,
            raw_output,
            weight_delta,
            delta_v,
            stable,
            integral: self.integral,
        };

        self.previous_error = error;
        self.primed = true;
        self.last_sample = Some(sample);
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(sample);

        debug!(
            error,
            delta = weight_delta,
            integral = self.integral,
            stable,
            "PID step"
        );

        sample
    }

    /// Whether the latest step converged toward the target
    ///
    /// True before the first step: an idle controller is not divergent.
    pub fn is_stable(&self) -> bool {
        self.last_sample.map(|s| s.stable).unwrap_or(true)
    }

    /// Recent controller steps, oldest first
    pub fn history(&self) -> impl Iterator<Item = &PidSample> {
        self.history.iter()
    }

    /// Clear all controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.primed = false;
        self.last_sample = None;
        self.history.clear();
    }
}

impl Default for GenomicPID {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_never_leaves_clamp() {
        let mut pid = GenomicPID::with_defaults();
        for value in [10.0, -10.0, 5.0, -5.0, 100.0, -0.5, 3.0] {
            let sample = pid.compute(value);
            assert!(sample.integral >= -INTEGRAL_CLAMP && sample.integral <= INTEGRAL_CLAMP);
        }
    }

    #[test]
    fn test_weight_delta_never_leaves_bound() {
        let mut pid = GenomicPID::with_defaults();
        for value in [100.0, -100.0, 0.5, 0.0, 1e6, -1e6] {
            let sample = pid.compute(value);
            assert!(sample.weight_delta.abs() <= MAX_WEIGHT_DELTA);
        }
    }

    #[test]
    fn test_epsilon_reset_zeroes_integral() {
        let mut pid = GenomicPID::with_defaults();
        pid.compute(0.5);
        assert!(pid.compute(0.5).integral > 0.0);

        // Error within epsilon of the target resets accumulated state
        let sample = pid.compute(STABILITY_TARGET + 1e-5);
        assert_eq!(sample.integral, 0.0);
    }

    #[test]
    fn test_derivative_zero_on_first_step() {
        let mut pid = GenomicPID::with_defaults();
        let first = pid.compute(0.1);
        assert_eq!(first.d_term, 0.0);

        let second = pid.compute(0.3);
        // derivative = change in error = 0.2
        assert!((second.d_term - 0.05 * 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_negative_feedback_sign() {
        let mut pid = GenomicPID::with_defaults();
        // Pulse above target: positive error, so the applied delta is negative
        let sample = pid.compute(STABILITY_TARGET + 0.01);
        assert!(sample.weight_delta < 0.0);
    }

    #[test]
    fn test_stability_tracks_error_direction() {
        let mut pid = GenomicPID::with_defaults();
        assert!(pid.is_stable());

        pid.compute(0.1);
        // Error shrank toward the target: converging
        pid.compute(0.05);
        assert!(pid.is_stable());

        // Error grew: diverging
        pid.compute(0.5);
        assert!(!pid.is_stable());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pid = GenomicPID::with_defaults();
        pid.compute(0.3);
        pid.compute(0.4);
        pid.reset();
        assert!(pid.is_stable());
        assert_eq!(pid.history().count(), 0);
        assert_eq!(pid.compute(0.3).d_term, 0.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut pid = GenomicPID::with_defaults();
        for i in 0..(HISTORY_CAPACITY + 10) {
            pid.compute(0.1 + (i as f64) * 1e-4);
        }
        assert_eq!(pid.history().count(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_gain_update_changes_output() {
        let mut pid = GenomicPID::with_defaults();
        let baseline = pid.compute(0.1);

        let mut retuned = GenomicPID::with_defaults();
        retuned.update_gains(1.2, 0.1, 0.05);
        let stronger = retuned.compute(0.1);

        assert!(stronger.raw_output > baseline.raw_output);
    }
}
